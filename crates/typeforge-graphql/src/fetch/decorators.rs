//! Structural decorators around base fetchers.
//!
//! Each decorator wraps an inner [`DataFetcher`] and reshapes the execution
//! context or the result: batched fetchers fan a list source out per
//! element, relay-mutation fetchers flatten the `input` argument map into
//! positional arguments, asynchronous fetchers dispatch the inner fetch onto
//! a separate task, and connection fetchers delegate pagination slicing to a
//! pluggable strategy.

use std::sync::Arc;

use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use tracing::debug;

use crate::error::{DeriveError, FetchError};
use crate::fetch::{DataFetcher, FetchContext};
use crate::host::TypeShape;

/// Fans a list-shaped source out to the inner fetcher, one element at a
/// time, collecting the per-element results into a list.
pub struct BatchedFetcher {
    inner: Arc<dyn DataFetcher>,
}

impl BatchedFetcher {
    /// Wraps `inner` in per-element dispatch.
    pub fn new(inner: Arc<dyn DataFetcher>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DataFetcher for BatchedFetcher {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Value, FetchError> {
        let items = match &ctx.source {
            None | Some(Value::Null) => return Ok(Value::Null),
            Some(Value::List(items)) => items,
            Some(other) => {
                return Err(FetchError::Invocation(format!(
                    "batched fetch expects a list source, got {other}"
                )));
            }
        };

        // Per-element fetches are independent; run them concurrently but
        // keep the source order in the result.
        let out = try_join_all(items.iter().map(|item| {
            let element_ctx = FetchContext {
                source: Some(item.clone()),
                ..ctx.clone()
            };
            async move { self.inner.fetch(&element_ctx).await }
        }))
        .await?;
        Ok(Value::List(out))
    }
}

/// Flattens the relay `input` argument map into the inner fetcher's
/// positional arguments. An empty source, or an absent or null input,
/// short-circuits to null before the inner fetcher runs.
pub struct RelayMutationFetcher {
    inner: Arc<dyn DataFetcher>,
}

impl RelayMutationFetcher {
    /// Wraps `inner` in relay input flattening.
    pub fn new(inner: Arc<dyn DataFetcher>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DataFetcher for RelayMutationFetcher {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Value, FetchError> {
        if matches!(ctx.source, None | Some(Value::Null)) {
            return Ok(Value::Null);
        }
        let input = match ctx.arg("input") {
            None | Some(Value::Null) => return Ok(Value::Null),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(FetchError::Coercion {
                    argument: "input".into(),
                    reason: format!("expected an input object, got {other}"),
                });
            }
        };

        let flattened = FetchContext {
            args: input,
            ..ctx.clone()
        };
        self.inner.fetch(&flattened).await
    }
}

/// Dispatches the inner fetch onto a separate task. Once dispatched the
/// fetch runs to completion; there is no cancellation signal.
pub struct AsyncFetcher {
    inner: Arc<dyn DataFetcher>,
}

impl AsyncFetcher {
    /// Wraps `inner` in task dispatch.
    pub fn new(inner: Arc<dyn DataFetcher>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DataFetcher for AsyncFetcher {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Value, FetchError> {
        let inner = Arc::clone(&self.inner);
        let ctx = ctx.clone();
        tokio::spawn(async move { inner.fetch(&ctx).await })
            .await
            .map_err(|e| FetchError::Invocation(e.to_string()))?
    }
}

/// Pluggable pagination slicing for connection fetchers.
#[async_trait]
pub trait ConnectionStrategy: Send + Sync {
    /// Slices the fetched items into a connection value.
    async fn paginate(&self, items: Vec<Value>, ctx: &FetchContext) -> Result<Value, FetchError>;
}

/// Validates, at field-definition time, that a member's declared shape is
/// compatible with the chosen pagination style.
pub trait PageShapeValidator: Send + Sync {
    /// Accepts or rejects the declared shape.
    fn validate(&self, member: &str, shape: &TypeShape) -> Result<(), DeriveError>;
}

/// Default page-shape validator: the member must declare a list or stream,
/// possibly under optional or non-null wrappers.
pub struct ListPageValidator;

impl PageShapeValidator for ListPageValidator {
    fn validate(&self, member: &str, shape: &TypeShape) -> Result<(), DeriveError> {
        let mut inner = shape;
        while let TypeShape::Optional(wrapped) | TypeShape::NonNull(wrapped) = inner {
            inner = wrapped;
        }
        match inner {
            TypeShape::List(_) | TypeShape::Stream(_) => Ok(()),
            other => Err(DeriveError::InvalidPageShape {
                member: member.to_string(),
                reason: format!("expected a list or stream shape, found {}", other.render()),
            }),
        }
    }
}

/// Cursor encoding for the offset strategy.
mod cursor {
    use base64::Engine;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CursorData {
        /// Offset of the item the cursor points at.
        pub offset: usize,
    }

    impl CursorData {
        pub fn new(offset: usize) -> Self {
            Self { offset }
        }

        pub fn encode(&self) -> String {
            let json = serde_json::to_string(self).unwrap_or_default();
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
        }

        pub fn decode(cursor: &str) -> Option<Self> {
            let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(cursor)
                .ok()?;
            let json = String::from_utf8(bytes).ok()?;
            serde_json::from_str(&json).ok()
        }
    }
}

/// Offset-based slicing with opaque base64 cursors, driven by the standard
/// `first`/`after` connection arguments.
pub struct OffsetConnectionStrategy;

#[async_trait]
impl ConnectionStrategy for OffsetConnectionStrategy {
    async fn paginate(&self, items: Vec<Value>, ctx: &FetchContext) -> Result<Value, FetchError> {
        let after = ctx
            .arg("after")
            .and_then(|v| match v {
                Value::String(s) => cursor::CursorData::decode(s),
                _ => None,
            })
            .map(|c| c.offset + 1)
            .unwrap_or(0);
        let first = ctx
            .arg("first")
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                _ => None,
            })
            .map(|n| n.max(0) as usize)
            .unwrap_or(items.len());

        let total = items.len();
        let start = after.min(total);
        let end = start.saturating_add(first).min(total);

        let edges: Vec<Value> = items[start..end]
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let mut edge = IndexMap::new();
                edge.insert(Name::new("node"), node.clone());
                edge.insert(
                    Name::new("cursor"),
                    Value::String(cursor::CursorData::new(start + i).encode()),
                );
                Value::Object(edge)
            })
            .collect();

        let mut page_info = IndexMap::new();
        page_info.insert(Name::new("hasPreviousPage"), Value::Boolean(start > 0));
        page_info.insert(Name::new("hasNextPage"), Value::Boolean(end < total));
        page_info.insert(
            Name::new("startCursor"),
            if start < end {
                Value::String(cursor::CursorData::new(start).encode())
            } else {
                Value::Null
            },
        );
        page_info.insert(
            Name::new("endCursor"),
            if start < end {
                Value::String(cursor::CursorData::new(end - 1).encode())
            } else {
                Value::Null
            },
        );

        debug!(total, start, end, "Sliced connection page");

        let mut connection = IndexMap::new();
        connection.insert(Name::new("totalCount"), Value::from(total as i64));
        connection.insert(Name::new("edges"), Value::List(edges));
        connection.insert(Name::new("pageInfo"), Value::Object(page_info));
        Ok(Value::Object(connection))
    }
}

/// Wraps a list-returning fetcher in connection pagination.
pub struct ConnectionFetcher {
    inner: Arc<dyn DataFetcher>,
    strategy: Arc<dyn ConnectionStrategy>,
}

impl ConnectionFetcher {
    /// Wraps `inner`, slicing its result with `strategy`.
    pub fn new(inner: Arc<dyn DataFetcher>, strategy: Arc<dyn ConnectionStrategy>) -> Self {
        Self { inner, strategy }
    }
}

#[async_trait]
impl DataFetcher for ConnectionFetcher {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Value, FetchError> {
        let fetched = self.inner.fetch(ctx).await?;
        let items = match fetched {
            Value::Null => Vec::new(),
            Value::List(items) => items,
            other => {
                return Err(FetchError::Invocation(format!(
                    "connection fetch expects a list result, got {other}"
                )));
            }
        };
        self.strategy.paginate(items, ctx).await
    }
}
