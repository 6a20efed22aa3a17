//! The built type-graph representation.
//!
//! Builders produce these definitions; the build session registers them by
//! name (one `Arc` instance per name, ever) and the lowering pass hands them
//! to the execution engine. Type references are by name, so a definition may
//! reference a type that is still under construction — the engine reconciles
//! names once the whole graph is registered.

use async_graphql::Value;

use crate::error::FetchError;
use crate::host::HostRegistry;

/// A by-name reference to a schema type, with list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaTypeRef {
    /// Reference to a named type.
    Named(String),
    /// Nullable list of the inner reference.
    List(Box<SchemaTypeRef>),
    /// Non-null wrapper around the inner reference.
    NonNull(Box<SchemaTypeRef>),
}

impl SchemaTypeRef {
    /// Reference to a named type.
    pub fn named(name: impl Into<String>) -> Self {
        SchemaTypeRef::Named(name.into())
    }

    /// List of the inner reference.
    pub fn list(inner: SchemaTypeRef) -> Self {
        SchemaTypeRef::List(Box::new(inner))
    }

    /// Non-null wrapper; already non-null references are left unchanged.
    pub fn non_null(inner: SchemaTypeRef) -> Self {
        match inner {
            SchemaTypeRef::NonNull(_) => inner,
            other => SchemaTypeRef::NonNull(Box::new(other)),
        }
    }

    /// The innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            SchemaTypeRef::Named(name) => name,
            SchemaTypeRef::List(inner) | SchemaTypeRef::NonNull(inner) => inner.base_name(),
        }
    }

    /// Renders the reference in GraphQL type syntax.
    pub fn render(&self) -> String {
        match self {
            SchemaTypeRef::Named(name) => name.clone(),
            SchemaTypeRef::List(inner) => format!("[{}]", inner.render()),
            SchemaTypeRef::NonNull(inner) => format!("{}!", inner.render()),
        }
    }
}

/// A directive applied to a field, with resolved argument values.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDirective {
    /// Name of the directive definition.
    pub name: String,
    /// Resolved argument values: supplied literals first, declared defaults
    /// for the rest.
    pub args: Vec<(String, Value)>,
}

/// An argument on a schema field.
#[derive(Debug, Clone)]
pub struct ArgumentDef {
    /// Schema argument name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Argument type.
    pub ty: SchemaTypeRef,
    /// Schema-side default value.
    pub default_value: Option<Value>,
}

/// A field on an object or interface type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Schema field name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Deprecation reason, if the member is deprecated.
    pub deprecation: Option<String>,
    /// Output type.
    pub ty: SchemaTypeRef,
    /// Arguments in declaration order.
    pub args: Vec<ArgumentDef>,
    /// Applied directives.
    pub directives: Vec<AppliedDirective>,
}

/// An object type definition.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    /// Type name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Implemented interface type names.
    pub interfaces: Vec<String>,
    /// Fields in definition order.
    pub fields: Vec<FieldDef>,
}

/// An interface type definition.
#[derive(Debug, Clone)]
pub struct InterfaceDef {
    /// Type name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Fields in definition order.
    pub fields: Vec<FieldDef>,
}

/// One possible concrete type of a union.
#[derive(Debug, Clone)]
pub struct UnionMember {
    /// Host type name, used for runtime assignability checks.
    pub host_name: String,
    /// Schema type name.
    pub type_name: String,
}

/// A union type definition.
#[derive(Debug, Clone)]
pub struct UnionDef {
    /// Type name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Possible concrete types, in declaration order.
    pub members: Vec<UnionMember>,
}

impl UnionDef {
    /// Resolves the concrete schema type for a runtime value.
    ///
    /// Scans the declared possible types in declaration order and returns
    /// the first whose host type the value is assignable to. Declaration
    /// order is the documented tie-break when a value satisfies more than
    /// one member.
    pub fn resolve_concrete(
        &self,
        host: &HostRegistry,
        value: &Value,
    ) -> Result<&str, FetchError> {
        let type_name = HostRegistry::typename_of(value).unwrap_or_default();
        for member in &self.members {
            if host.is_assignable(&member.host_name, type_name) {
                return Ok(&member.type_name);
            }
        }
        Err(FetchError::UnknownConcreteType {
            union: self.name.clone(),
            type_name: type_name.to_string(),
        })
    }
}

/// A value of an enum type. The description is always present, falling back
/// to the constant's own identifier.
#[derive(Debug, Clone)]
pub struct EnumValueDef {
    /// Schema value name.
    pub name: String,
    /// Description; never empty.
    pub description: String,
    /// Deprecation reason, if the constant is deprecated.
    pub deprecation: Option<String>,
}

/// An enum type definition.
#[derive(Debug, Clone)]
pub struct EnumDef {
    /// Type name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Values in declaration order.
    pub values: Vec<EnumValueDef>,
}

/// A field on an input object type.
#[derive(Debug, Clone)]
pub struct InputFieldDef {
    /// Schema field name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Input type.
    pub ty: SchemaTypeRef,
    /// Schema-side default value.
    pub default_value: Option<Value>,
}

/// An input object type definition, derived from a designated constructor.
#[derive(Debug, Clone)]
pub struct InputObjectDef {
    /// Type name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Fields in constructor-parameter order.
    pub fields: Vec<InputFieldDef>,
}

/// A named schema type definition.
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// An object type.
    Object(ObjectDef),
    /// An interface type.
    Interface(InterfaceDef),
    /// A union type.
    Union(UnionDef),
    /// An enum type.
    Enum(EnumDef),
    /// An input object type.
    InputObject(InputObjectDef),
}

impl TypeDef {
    /// The definition's type name.
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Object(def) => &def.name,
            TypeDef::Interface(def) => &def.name,
            TypeDef::Union(def) => &def.name,
            TypeDef::Enum(def) => &def.name,
            TypeDef::InputObject(def) => &def.name,
        }
    }

    /// Whether values of this type need concrete-type attachment at
    /// resolution time.
    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeDef::Interface(_) | TypeDef::Union(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{typed_object, HostTypeSpec};

    #[test]
    fn type_ref_render() {
        let ty = SchemaTypeRef::non_null(SchemaTypeRef::list(SchemaTypeRef::named("Human")));
        assert_eq!(ty.render(), "[Human]!");
        assert_eq!(ty.base_name(), "Human");
    }

    #[test]
    fn non_null_does_not_double_wrap() {
        let once = SchemaTypeRef::non_null(SchemaTypeRef::named("Int"));
        let twice = SchemaTypeRef::non_null(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn union_resolution_is_declaration_order_first() {
        let mut host = HostRegistry::new();
        host.register(HostTypeSpec::new("Base"));
        host.register(HostTypeSpec::new("Special").extends("Base"));

        let union = UnionDef {
            name: "Thing".into(),
            description: None,
            members: vec![
                UnionMember {
                    host_name: "Base".into(),
                    type_name: "Base".into(),
                },
                UnionMember {
                    host_name: "Special".into(),
                    type_name: "Special".into(),
                },
            ],
        };

        // Special is assignable to both members; the earlier declaration wins.
        let value = typed_object("Special", []);
        assert_eq!(union.resolve_concrete(&host, &value).unwrap(), "Base");
    }

    #[test]
    fn union_resolution_fails_for_unknown_types() {
        let host = HostRegistry::new();
        let union = UnionDef {
            name: "Thing".into(),
            description: None,
            members: vec![],
        };
        let value = typed_object("Mystery", []);
        assert!(matches!(
            union.resolve_concrete(&host, &value),
            Err(FetchError::UnknownConcreteType { .. })
        ));
    }
}
