//! GraphQL schema derivation from host type descriptors.
//!
//! This crate derives a complete GraphQL schema (types, fields, arguments,
//! directives, resolvers) from descriptors of plain object-oriented host
//! types, and wires runtime value resolution to the derived fields, so an
//! embedding application can describe its API with annotated types instead
//! of hand-written schema definitions and resolver boilerplate.
//!
//! The derivation pipeline:
//!
//! 1. A metadata-extraction pass produces one [`host::HostTypeSpec`] per
//!    host type and registers it in a [`host::HostRegistry`].
//! 2. A [`schema::TypeRetriever`] derives output and input types on demand
//!    into a [`session::BuildSession`], memoizing by name and breaking
//!    cycles with forward references.
//! 3. [`schema::lower`] turns the frozen session into an executable
//!    `async-graphql` dynamic schema, binding one data fetcher per field.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_graphql::Value;
//! use typeforge_graphql::host::{HostRegistry, HostTypeSpec, MethodSpec, TypeShape};
//! use typeforge_graphql::{lower, BuildSession, DeriveConfig, TypeRetriever};
//!
//! let mut host = HostRegistry::new();
//! let mut hello = MethodSpec::new("hello", TypeShape::String)
//!     .invoke(|_, _| Ok(Value::String("world".into())));
//! hello.is_static = true;
//! host.register(HostTypeSpec::new("Query").expose(true).method(hello));
//!
//! let host = Arc::new(host);
//! let retriever = TypeRetriever::new(Arc::clone(&host));
//! let mut session = BuildSession::new();
//! retriever.output_type(&mut session, "Query")?;
//!
//! let schema = lower(&session, host, &DeriveConfig::default(), "Query", None)?;
//! # Ok::<(), typeforge_graphql::DeriveError>(())
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod host;
pub mod naming;
pub mod schema;
pub mod search;
pub mod session;
pub mod typefn;

pub use config::DeriveConfig;
pub use error::{DeriveError, FetchError};
pub use fetch::{DataFetcher, FetchContext};
pub use schema::{directive_sdl, lower, AppContext, DirectiveDef, DirectiveLocation, TypeRetriever};
pub use session::BuildSession;

/// Convenience alias for build-time results.
pub type Result<T> = std::result::Result<T, DeriveError>;
