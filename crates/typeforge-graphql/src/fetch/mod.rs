//! Data fetchers: runtime value resolution for derived fields.
//!
//! A fetcher is a strategy producing one field's value from an execution
//! context (source object plus requested argument values). Fetchers are
//! constructed at build time, bound to field coordinates in the session, and
//! invoked concurrently by the execution engine; they treat all build-time
//! registries as read-only.

pub mod coerce;
pub mod decorators;
pub mod method;

use std::sync::Arc;

use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use async_trait::async_trait;

use crate::error::FetchError;
use crate::host::HostRegistry;

pub use decorators::{
    AsyncFetcher, BatchedFetcher, ConnectionFetcher, ConnectionStrategy, ListPageValidator,
    OffsetConnectionStrategy, PageShapeValidator, RelayMutationFetcher,
};
pub use method::MethodFetcher;

/// Execution context handed to a fetcher for one field resolution.
#[derive(Clone)]
pub struct FetchContext {
    /// The parent value the field is resolved against; `None` at the root.
    pub source: Option<Value>,
    /// Argument values requested by the query, keyed by schema name.
    pub args: IndexMap<Name, Value>,
    /// The host descriptor registry, read-only at execution time.
    pub host: Arc<HostRegistry>,
    /// Application-supplied execution context, delivered to parameters
    /// marked as context parameters.
    pub context: Option<Value>,
}

impl FetchContext {
    /// Creates a root context with no source, arguments or app context.
    pub fn new(host: Arc<HostRegistry>) -> Self {
        Self {
            source: None,
            args: IndexMap::new(),
            host,
            context: None,
        }
    }

    /// Sets the source value.
    pub fn with_source(mut self, source: Value) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets one argument value.
    pub fn with_arg(mut self, name: &str, value: Value) -> Self {
        self.args.insert(Name::new(name), value);
        self
    }

    /// Sets the application execution context.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Looks up an argument by schema name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// A runtime strategy producing a field's value.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Resolves the field value for one execution context.
    async fn fetch(&self, ctx: &FetchContext) -> Result<Value, FetchError>;
}

/// Reads a named entry straight off the source object.
///
/// Bound for derived fields with no invokable accessor; an absent source or
/// a missing entry resolves to null without error.
pub struct PropertyFetcher {
    property: String,
}

impl PropertyFetcher {
    /// Creates a fetcher reading `property` from the source object.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

#[async_trait]
impl DataFetcher for PropertyFetcher {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Value, FetchError> {
        let value = match &ctx.source {
            Some(Value::Object(map)) => map.get(self.property.as_str()).cloned(),
            _ => None,
        };
        Ok(value.unwrap_or(Value::Null))
    }
}
