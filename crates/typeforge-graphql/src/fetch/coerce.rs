//! Argument coercion: raw execution-time values to host parameter values.
//!
//! Coercion recursively mirrors the declared parameter shape against the raw
//! argument value. Optional shapes distinguish three states: an absent
//! argument yields [`Coerced::Null`], an explicit null literal yields
//! [`Coerced::Empty`], and a present value is coerced inward and re-wrapped
//! as [`Coerced::Wrapped`]. Input-object shapes are constructed through the
//! host type's constructors; everything else passes through unchanged.

use async_graphql::Value;

use crate::error::FetchError;
use crate::host::{Coerced, ConstructorSpec, HostRegistry, HostTypeSpec, TypeShape};

/// Coerces one raw argument value against a declared shape.
///
/// `raw` is `None` when the argument was absent from the request.
pub fn coerce(
    host: &HostRegistry,
    shape: &TypeShape,
    argument: &str,
    raw: Option<&Value>,
) -> Result<Coerced, FetchError> {
    match shape {
        // Non-null is a schema-level constraint; the engine enforces it.
        TypeShape::NonNull(inner) => coerce(host, inner, argument, raw),
        TypeShape::Optional(inner) => match raw {
            None => Ok(Coerced::Null),
            Some(Value::Null) => Ok(Coerced::Empty),
            Some(value) => {
                let inner = coerce(host, inner, argument, Some(value))?;
                Ok(Coerced::Wrapped(inner.into_value()))
            }
        },
        TypeShape::List(inner) | TypeShape::Stream(inner) => match raw {
            None | Some(Value::Null) => Ok(Coerced::Null),
            Some(Value::List(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(coerce(host, inner, argument, Some(item))?.into_value());
                }
                Ok(Coerced::Value(Value::List(out)))
            }
            Some(other) => Err(FetchError::Coercion {
                argument: argument.to_string(),
                reason: format!("expected a list, got {other}"),
            }),
        },
        TypeShape::Named(name) => match raw {
            None | Some(Value::Null) => Ok(Coerced::Null),
            Some(value) => coerce_named(host, name, argument, value),
        },
        // Scalar passthrough; the engine already validated the literal.
        _ => match raw {
            None | Some(Value::Null) => Ok(Coerced::Null),
            Some(value) => Ok(Coerced::Value(value.clone())),
        },
    }
}

/// Coerces a value against a named host type.
///
/// Types without a descriptor, and host enums, pass through untouched. For
/// input objects a non-map value is handed to a single-argument constructor
/// directly; a map is constructed via the designated constructor, looking up
/// each parameter under its input key and coercing recursively. Absent keys
/// coerce as absent arguments.
fn coerce_named(
    host: &HostRegistry,
    name: &str,
    argument: &str,
    value: &Value,
) -> Result<Coerced, FetchError> {
    let Some(spec) = host.get(name) else {
        return Ok(Coerced::Value(value.clone()));
    };
    if spec.enum_values.is_some() {
        return Ok(Coerced::Value(value.clone()));
    }

    match value {
        Value::Object(map) => {
            let ctor = spec
                .designated_constructor()
                .ok_or_else(|| no_constructor(&spec))?;
            let mut args = Vec::with_capacity(ctor.params.len());
            for param in &ctor.params {
                let raw = map.get(param.lookup_key());
                // Errors below this point name the full argument path.
                let path = format!("{argument}.{}", param.lookup_key());
                args.push(coerce(host, &param.shape, &path, raw)?);
            }
            construct(&spec, ctor, &args)
        }
        other => {
            // Non-map value: a single-argument constructor accepts it directly.
            let ctor = spec
                .adapting_constructor()
                .ok_or_else(|| no_constructor(&spec))?;
            let coerced = coerce(host, &ctor.params[0].shape, argument, Some(other))?;
            construct(&spec, ctor, &[coerced])
        }
    }
}

fn construct(
    spec: &HostTypeSpec,
    ctor: &ConstructorSpec,
    args: &[Coerced],
) -> Result<Coerced, FetchError> {
    let construct = ctor.construct.as_ref().ok_or_else(|| no_constructor(spec))?;
    Ok(Coerced::Value(construct(None, args)?))
}

fn no_constructor(spec: &HostTypeSpec) -> FetchError {
    FetchError::NoConstructor {
        type_name: spec.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{typed_object, ConstructorSpec, CtorParamSpec, HostTypeSpec};

    fn point_registry() -> HostRegistry {
        let mut host = HostRegistry::new();
        host.register(
            HostTypeSpec::new("Point").constructor(
                ConstructorSpec::new(vec![
                    CtorParamSpec::new("x", TypeShape::Int),
                    CtorParamSpec::new("y", TypeShape::Int),
                ])
                .construct(|_, args| {
                    Ok(typed_object(
                        "Point",
                        [
                            ("x", args[0].clone().into_value()),
                            ("y", args[1].clone().into_value()),
                        ],
                    ))
                }),
            ),
        );
        host
    }

    #[test]
    fn absent_optional_is_null_and_explicit_null_is_empty() {
        let host = HostRegistry::new();
        let shape = TypeShape::optional(TypeShape::String);
        assert_eq!(coerce(&host, &shape, "name", None).unwrap(), Coerced::Null);
        assert_eq!(
            coerce(&host, &shape, "name", Some(&Value::Null)).unwrap(),
            Coerced::Empty
        );
    }

    #[test]
    fn present_optional_is_wrapped() {
        let host = HostRegistry::new();
        let shape = TypeShape::optional(TypeShape::String);
        let value = Value::String("ada".into());
        assert_eq!(
            coerce(&host, &shape, "name", Some(&value)).unwrap(),
            Coerced::Wrapped(value)
        );
    }

    #[test]
    fn non_null_shapes_coerce_like_their_inner_shape() {
        let host = HostRegistry::new();
        let shape = TypeShape::list(TypeShape::non_null(TypeShape::Int));
        let raw = Value::List(vec![Value::from(1), Value::from(2)]);
        assert_eq!(
            coerce(&host, &shape, "values", Some(&raw)).unwrap(),
            Coerced::Value(raw)
        );
    }

    #[test]
    fn lists_coerce_element_wise_preserving_order() {
        let host = HostRegistry::new();
        let shape = TypeShape::list(TypeShape::Int);
        let raw = Value::List(vec![Value::from(1), Value::from(2), Value::from(3)]);
        let coerced = coerce(&host, &shape, "values", Some(&raw)).unwrap();
        assert_eq!(coerced, Coerced::Value(raw));
    }

    #[test]
    fn optional_list_re_wraps() {
        let host = HostRegistry::new();
        let shape = TypeShape::optional(TypeShape::list(TypeShape::Int));
        let raw = Value::List(vec![Value::from(1)]);
        assert_eq!(
            coerce(&host, &shape, "values", Some(&raw)).unwrap(),
            Coerced::Wrapped(raw)
        );
    }

    #[test]
    fn input_object_constructs_via_designated_constructor() {
        let host = point_registry();
        let raw = typed_object("PointInput", [("x", Value::from(1)), ("y", Value::from(2))]);
        let coerced = coerce(&host, &TypeShape::named("Point"), "at", Some(&raw)).unwrap();

        let Coerced::Value(value) = coerced else {
            panic!("expected a constructed value");
        };
        assert_eq!(HostRegistry::typename_of(&value), Some("Point"));
    }

    #[test]
    fn input_object_with_absent_key_coerces_null_slot() {
        let host = point_registry();
        let raw = typed_object("PointInput", [("x", Value::from(1))]);
        let coerced = coerce(&host, &TypeShape::named("Point"), "at", Some(&raw)).unwrap();
        let Coerced::Value(Value::Object(map)) = coerced else {
            panic!("expected a constructed object");
        };
        assert_eq!(map.get("y"), Some(&Value::Null));
    }

    #[test]
    fn non_map_value_uses_single_argument_constructor() {
        let mut host = HostRegistry::new();
        host.register(
            HostTypeSpec::new("Wrapper").constructor(
                ConstructorSpec::new(vec![CtorParamSpec::new("value", TypeShape::String)])
                    .construct(|_, args| {
                        Ok(typed_object(
                            "Wrapper",
                            [("value", args[0].clone().into_value())],
                        ))
                    }),
            ),
        );

        let raw = Value::String("plain".into());
        let coerced = coerce(&host, &TypeShape::named("Wrapper"), "w", Some(&raw)).unwrap();
        let Coerced::Value(value) = coerced else {
            panic!("expected a constructed value");
        };
        assert_eq!(HostRegistry::typename_of(&value), Some("Wrapper"));
    }

    #[test]
    fn missing_constructor_is_an_error() {
        let mut host = HostRegistry::new();
        host.register(HostTypeSpec::new("Bare"));
        let raw = typed_object("Bare", []);
        let err = coerce(&host, &TypeShape::named("Bare"), "b", Some(&raw)).unwrap_err();
        assert!(matches!(err, FetchError::NoConstructor { .. }));
    }

    #[test]
    fn nested_coercion_errors_name_the_full_argument_path() {
        let mut host = HostRegistry::new();
        host.register(
            HostTypeSpec::new("Bag").constructor(
                ConstructorSpec::new(vec![CtorParamSpec::new(
                    "items",
                    TypeShape::list(TypeShape::Int),
                )])
                .construct(|_, args| {
                    Ok(typed_object(
                        "Bag",
                        [("items", args[0].clone().into_value())],
                    ))
                }),
            ),
        );

        let raw = typed_object("BagInput", [("items", Value::from(1))]);
        let err = coerce(&host, &TypeShape::named("Bag"), "bag", Some(&raw)).unwrap_err();
        assert!(err.to_string().contains("bag.items"));
    }

    #[test]
    fn non_list_for_list_shape_is_a_coercion_error() {
        let host = HostRegistry::new();
        let shape = TypeShape::list(TypeShape::Int);
        let err = coerce(&host, &shape, "values", Some(&Value::from(1))).unwrap_err();
        assert!(matches!(err, FetchError::Coercion { .. }));
    }
}
