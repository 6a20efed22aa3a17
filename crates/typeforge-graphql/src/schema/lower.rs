//! Lowering: the built type graph into the execution engine's dynamic schema.
//!
//! Runs after derivation completes, over the frozen session. Each registered
//! type definition becomes a dynamic schema type; each field gets a resolver
//! closure that rebuilds a [`FetchContext`] from the engine's resolver
//! context and dispatches to the fetcher bound at that field's coordinate.
//! Fields with no bound fetcher fall back to reading the entry of the same
//! name off the parent value. Values of abstract base types get their
//! concrete schema type attached before they are handed back to the engine.

use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema, TypeRef, Union,
};
use async_graphql::Value;
use tracing::{debug, warn};

use crate::config::DeriveConfig;
use crate::error::DeriveError;
use crate::fetch::FetchContext;
use crate::graph::{ArgumentDef, FieldDef, SchemaTypeRef, TypeDef};
use crate::host::HostRegistry;
use crate::naming::to_graphql_name;
use crate::session::BuildSession;
use crate::typefn::LONG_SCALAR;

/// Application-supplied execution context, read from the schema data and
/// delivered to context-marked parameters.
pub struct AppContext(pub Value);

/// Lowers the session's type graph into an executable schema.
///
/// `query` names the root query type; `mutation` optionally names the root
/// mutation type. Both must already be registered in the session.
pub fn lower(
    session: &BuildSession,
    host: Arc<HostRegistry>,
    config: &DeriveConfig,
    query: &str,
    mutation: Option<&str>,
) -> Result<Schema, DeriveError> {
    let mut builder = Schema::build(query, mutation, None);
    builder = builder.register(Scalar::new(LONG_SCALAR).description("64-bit signed integer"));

    for (name, def) in session.type_defs() {
        debug!(type_name = %name, "Lowering type");
        match def.as_ref() {
            TypeDef::Object(def) => {
                let mut object = Object::new(&def.name);
                if let Some(description) = &def.description {
                    object = object.description(description);
                }
                for interface in &def.interfaces {
                    object = object.implement(interface);
                }
                for field in &def.fields {
                    object = object.field(lower_field(session, &host, &def.name, field));
                }
                builder = builder.register(object);
            }
            TypeDef::Interface(def) => {
                let mut interface = Interface::new(&def.name);
                if let Some(description) = &def.description {
                    interface = interface.description(description);
                }
                for field in &def.fields {
                    let mut lowered = InterfaceField::new(&field.name, to_type_ref(&field.ty));
                    if let Some(description) = &field.description {
                        lowered = lowered.description(description);
                    }
                    if let Some(reason) = &field.deprecation {
                        lowered = lowered.deprecation(Some(reason));
                    }
                    for arg in &field.args {
                        lowered = lowered.argument(lower_argument(arg));
                    }
                    interface = interface.field(lowered);
                }
                builder = builder.register(interface);
            }
            TypeDef::Union(def) => {
                let mut union = Union::new(&def.name);
                if let Some(description) = &def.description {
                    union = union.description(description);
                }
                for member in &def.members {
                    union = union.possible_type(&member.type_name);
                }
                builder = builder.register(union);
            }
            TypeDef::Enum(def) => {
                let mut lowered = Enum::new(&def.name);
                if let Some(description) = &def.description {
                    lowered = lowered.description(description);
                }
                for value in &def.values {
                    let mut item = EnumItem::new(&value.name).description(&value.description);
                    if let Some(reason) = &value.deprecation {
                        item = item.deprecation(Some(reason));
                    }
                    lowered = lowered.item(item);
                }
                builder = builder.register(lowered);
            }
            TypeDef::InputObject(def) => {
                let mut input = InputObject::new(&def.name);
                if let Some(description) = &def.description {
                    input = input.description(description);
                }
                for field in &def.fields {
                    let mut value = InputValue::new(&field.name, to_type_ref(&field.ty));
                    if let Some(description) = &field.description {
                        value = value.description(description);
                    }
                    if let Some(default) = &field.default_value {
                        value = value.default_value(default.clone());
                    }
                    input = input.field(value);
                }
                builder = builder.register(input);
            }
        }
    }

    builder = builder
        .limit_depth(config.max_depth)
        .limit_complexity(config.max_complexity);
    if !config.introspection {
        builder = builder.disable_introspection();
    }

    builder
        .finish()
        .map_err(|e| DeriveError::SchemaBuildFailed(e.to_string()))
}

fn lower_field(
    session: &BuildSession,
    host: &Arc<HostRegistry>,
    parent: &str,
    def: &FieldDef,
) -> Field {
    let fetcher = session.fetcher(parent, &def.name);
    let base_def = session.type_def(def.ty.base_name());
    let host = Arc::clone(host);
    let property = def.name.clone();

    let mut field = Field::new(
        def.name.clone(),
        to_type_ref(&def.ty),
        move |ctx: ResolverContext| {
            let fetcher = fetcher.clone();
            let base_def = base_def.clone();
            let host = Arc::clone(&host);
            let property = property.clone();
            FieldFuture::new(async move {
                let source = ctx.parent_value.as_value().cloned();
                let args = ctx.args.as_index_map().clone();
                let context = ctx.ctx.data_opt::<AppContext>().map(|c| c.0.clone());
                let fetch_ctx = FetchContext {
                    source,
                    args,
                    host: Arc::clone(&host),
                    context,
                };

                let value = match &fetcher {
                    Some(fetcher) => match fetcher.fetch(&fetch_ctx).await {
                        Ok(value) => value,
                        Err(err) => {
                            warn!(field = %property, error = %err, "Field resolution failed");
                            return Err(err.into());
                        }
                    },
                    None => match &fetch_ctx.source {
                        Some(Value::Object(map)) => {
                            map.get(property.as_str()).cloned().unwrap_or(Value::Null)
                        }
                        _ => Value::Null,
                    },
                };

                if matches!(value, Value::Null) {
                    return Ok(None);
                }
                Ok(Some(attach_concrete(value, base_def.as_deref(), &host)?))
            })
        },
    );

    if let Some(description) = &def.description {
        field = field.description(description);
    }
    if let Some(reason) = &def.deprecation {
        field = field.deprecation(Some(reason));
    }
    for arg in &def.args {
        field = field.argument(lower_argument(arg));
    }
    field
}

fn lower_argument(arg: &ArgumentDef) -> InputValue {
    let mut value = InputValue::new(arg.name.clone(), to_type_ref(&arg.ty));
    if let Some(description) = &arg.description {
        value = value.description(description);
    }
    if let Some(default) = &arg.default_value {
        value = value.default_value(default.clone());
    }
    value
}

/// Attaches the concrete schema type to values of abstract base types, so
/// the engine can route interface and union selections.
fn attach_concrete(
    value: Value,
    base_def: Option<&TypeDef>,
    host: &HostRegistry,
) -> Result<FieldValue<'static>, async_graphql::Error> {
    let Some(def) = base_def.filter(|d| d.is_abstract()) else {
        return Ok(FieldValue::value(value));
    };

    if let Value::List(items) = value {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(attach_one(item, def, host)?);
        }
        return Ok(FieldValue::list(out));
    }
    attach_one(value, def, host)
}

fn attach_one(
    value: Value,
    def: &TypeDef,
    host: &HostRegistry,
) -> Result<FieldValue<'static>, async_graphql::Error> {
    let concrete = match def {
        TypeDef::Union(union) => union.resolve_concrete(host, &value)?.to_string(),
        TypeDef::Interface(interface) => {
            let type_name = HostRegistry::typename_of(&value).ok_or_else(|| {
                async_graphql::Error::new(format!(
                    "Interface {} cannot resolve an untagged value",
                    interface.name
                ))
            })?;
            to_graphql_name(type_name)
        }
        // Guarded by is_abstract above.
        _ => return Ok(FieldValue::value(value)),
    };
    Ok(FieldValue::value(value).with_type(concrete))
}

fn to_type_ref(ty: &SchemaTypeRef) -> TypeRef {
    match ty {
        SchemaTypeRef::Named(name) => TypeRef::named(name.clone()),
        SchemaTypeRef::List(inner) => TypeRef::List(Box::new(to_type_ref(inner))),
        SchemaTypeRef::NonNull(inner) => TypeRef::NonNull(Box::new(to_type_ref(inner))),
    }
}
