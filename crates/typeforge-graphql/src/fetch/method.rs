//! Method invocation fetcher.
//!
//! Resolves a field by invoking the host method it was derived from. Target
//! selection follows a strict precedence: static invocation, detached
//! invocation on a fresh instance, adaptation of foreign source values
//! through a single-argument constructor, direct invocation on the source,
//! and finally a by-name chase against the raw source object (accessor
//! methods first, then fields, searched up the source's class hierarchy).

use std::sync::Arc;

use async_graphql::Value;
use async_trait::async_trait;
use tracing::trace;

use crate::error::FetchError;
use crate::fetch::coerce::coerce;
use crate::fetch::{DataFetcher, FetchContext};
use crate::host::{Coerced, HostRegistry, HostTypeSpec, MethodSpec, ParamSpec};
use crate::naming::upper_first;

/// Coerces the requested argument values against the method's parameters,
/// in declaration order. Context parameters receive the application context
/// at their original position instead of a schema argument.
pub(crate) fn coerce_args(
    ctx: &FetchContext,
    params: &[ParamSpec],
) -> Result<Vec<Coerced>, FetchError> {
    params
        .iter()
        .map(|param| {
            if param.is_context {
                return Ok(match &ctx.context {
                    Some(value) => Coerced::Value(value.clone()),
                    None => Coerced::Null,
                });
            }
            let key = param.name_override.as_deref().unwrap_or(&param.name);
            let raw = ctx.args.get(key).or(param.default_value.as_ref());
            coerce(&ctx.host, &param.shape, key, raw)
        })
        .collect()
}

/// Resolves a field by invoking a host method.
pub struct MethodFetcher {
    declaring: Arc<HostTypeSpec>,
    method: MethodSpec,
    base: String,
}

impl MethodFetcher {
    /// Creates a fetcher for `method` declared on `declaring`, exposed under
    /// the schema base name `base`.
    pub fn new(declaring: Arc<HostTypeSpec>, method: MethodSpec, base: impl Into<String>) -> Self {
        Self {
            declaring,
            method,
            base: base.into(),
        }
    }

    /// By-name lookup against the raw source: accessor methods named the
    /// base name, then `get`/`is`-prefixed, up the source's class hierarchy;
    /// then declared fields; finally the raw object entry itself.
    fn chase(&self, ctx: &FetchContext, source: &Value, args: &[Coerced]) -> Result<Value, FetchError> {
        let type_name = HostRegistry::typename_of(source).unwrap_or_default();
        let capitalized = upper_first(&self.base);
        let accessors = [
            self.base.clone(),
            format!("get{capitalized}"),
            format!("is{capitalized}"),
        ];

        for spec in ctx.host.superclass_chain(type_name) {
            for name in &accessors {
                if let Some(method) = spec.method_named(name) {
                    if let Some(invoke) = &method.invoke {
                        trace!(type_name, accessor = %name, "Resolving through accessor");
                        return invoke(Some(source), args);
                    }
                }
            }
        }

        for spec in ctx.host.superclass_chain(type_name) {
            for name in [self.base.as_str(), self.method.name.as_str()] {
                if spec.field_named(name).is_some() {
                    if let Value::Object(map) = source {
                        return Ok(map.get(name).cloned().unwrap_or(Value::Null));
                    }
                }
            }
        }

        // Untracked source shapes still resolve by raw entry.
        if let Value::Object(map) = source {
            if let Some(value) = map.get(self.base.as_str()) {
                return Ok(value.clone());
            }
        }

        Err(FetchError::NoMatchingMember {
            type_name: type_name.to_string(),
            field: self.base.clone(),
        })
    }

    fn detached_instance(&self) -> Result<Value, FetchError> {
        let ctor = self
            .declaring
            .default_constructor()
            .ok_or_else(|| FetchError::NoConstructor {
                type_name: self.declaring.name.clone(),
            })?;
        let construct = ctor
            .construct
            .as_ref()
            .ok_or_else(|| FetchError::NoConstructor {
                type_name: self.declaring.name.clone(),
            })?;
        construct(None, &[])
    }
}

#[async_trait]
impl DataFetcher for MethodFetcher {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Value, FetchError> {
        let args = coerce_args(ctx, &self.method.params)?;

        if self.method.is_static {
            let invoke = self.method.invoke.as_ref().ok_or_else(|| {
                FetchError::NoMatchingMember {
                    type_name: self.declaring.name.clone(),
                    field: self.base.clone(),
                }
            })?;
            return invoke(None, &args);
        }

        if self.method.detached {
            let instance = self.detached_instance()?;
            if let Some(invoke) = &self.method.invoke {
                return invoke(Some(&instance), &args);
            }
            return self.chase(ctx, &instance, &args);
        }

        let Some(source) = &ctx.source else {
            // Absent source resolves to null without error.
            return Ok(Value::Null);
        };

        let source_type = HostRegistry::typename_of(source).unwrap_or_default();
        if !ctx.host.is_assignable(&self.declaring.name, source_type) {
            if let Some(ctor) = self.declaring.adapting_constructor() {
                if let Some(construct) = &ctor.construct {
                    let adapted = construct(None, &[Coerced::Value(source.clone())])?;
                    if let Some(invoke) = &self.method.invoke {
                        return invoke(Some(&adapted), &args);
                    }
                }
            }
            return self.chase(ctx, source, &args);
        }

        if let Some(invoke) = &self.method.invoke {
            return invoke(Some(source), &args);
        }
        self.chase(ctx, source, &args)
    }
}
