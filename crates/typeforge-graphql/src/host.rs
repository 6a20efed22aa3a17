//! Host type descriptors.
//!
//! This module is the boundary to the host reflection/annotation facility.
//! A metadata-extraction pass in the embedding application (typically a
//! derive macro, or hand-written fixtures in tests) produces one
//! [`HostTypeSpec`] per host type, carrying fields, methods, parameters,
//! constructors, hierarchy links and annotation data as plain values. The
//! derivation core consumes only these descriptors; it never inspects host
//! types directly.
//!
//! Runtime values flow through the engine as [`async_graphql::Value`]. Host
//! objects are `Value::Object` maps tagged with a `__typename` entry so
//! fetchers can relate a runtime value back to its descriptor.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_graphql::{Name, Value};

use crate::error::{DeriveError, FetchError};

/// Map key carrying the host type name on runtime object values.
pub const TYPENAME_FIELD: &str = "__typename";

/// An invokable host function: method, accessor or constructor.
///
/// The first parameter is the target instance (`None` for static methods and
/// constructors); the second is the coerced argument list in declaration
/// order. Invocation never mutates the type graph.
pub type HostFn = Arc<dyn Fn(Option<&Value>, &[Coerced]) -> Result<Value, FetchError> + Send + Sync>;

/// A coerced argument value, preserving the optional-parameter states the
/// host distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// Plain null: the argument was absent, or null in a non-optional slot.
    Null,
    /// An optional parameter supplied with an explicit null literal.
    Empty,
    /// A plain present value.
    Value(Value),
    /// A present value in an optional parameter slot.
    Wrapped(Value),
}

impl Coerced {
    /// Collapses the coerced states into a plain value, losing the
    /// absent/empty distinction. Used where a nested position cannot carry
    /// optionality (list elements, input-object entries).
    pub fn into_value(self) -> Value {
        match self {
            Coerced::Null | Coerced::Empty => Value::Null,
            Coerced::Value(v) | Coerced::Wrapped(v) => v,
        }
    }
}

/// The declared generic shape of a member, parameter or constructor slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// Identifier scalar (`ID`).
    Id,
    /// UTF-8 string scalar.
    String,
    /// Boolean scalar.
    Boolean,
    /// 64-bit float scalar.
    Float,
    /// 32-bit integer scalar.
    Int,
    /// 64-bit integer scalar (custom `Long`).
    Long,
    /// Array/collection/iterable of an element shape.
    List(Box<TypeShape>),
    /// Stream of an element shape; list semantics in the schema.
    Stream(Box<TypeShape>),
    /// Optional wrapper around an inner shape.
    Optional(Box<TypeShape>),
    /// Non-null annotation on a nested position, e.g. the element of a
    /// list. Top-level non-null is the member's `required` flag.
    NonNull(Box<TypeShape>),
    /// Reference to another host type by name.
    Named(String),
}

impl TypeShape {
    /// Shorthand for a list shape.
    pub fn list(inner: TypeShape) -> Self {
        TypeShape::List(Box::new(inner))
    }

    /// Shorthand for an optional shape.
    pub fn optional(inner: TypeShape) -> Self {
        TypeShape::Optional(Box::new(inner))
    }

    /// Shorthand for a non-null shape.
    pub fn non_null(inner: TypeShape) -> Self {
        TypeShape::NonNull(Box::new(inner))
    }

    /// Shorthand for a named reference.
    pub fn named(name: impl Into<String>) -> Self {
        TypeShape::Named(name.into())
    }

    /// Whether this shape maps to a scalar schema type.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeShape::Id
                | TypeShape::String
                | TypeShape::Boolean
                | TypeShape::Float
                | TypeShape::Int
                | TypeShape::Long
        )
    }

    /// Human-readable rendering for error messages.
    pub fn render(&self) -> String {
        match self {
            TypeShape::Id => "ID".into(),
            TypeShape::String => "String".into(),
            TypeShape::Boolean => "Boolean".into(),
            TypeShape::Float => "Float".into(),
            TypeShape::Int => "Int".into(),
            TypeShape::Long => "Long".into(),
            TypeShape::List(inner) => format!("[{}]", inner.render()),
            TypeShape::Stream(inner) => format!("Stream<{}>", inner.render()),
            TypeShape::Optional(inner) => format!("Optional<{}>", inner.render()),
            TypeShape::NonNull(inner) => format!("{}!", inner.render()),
            TypeShape::Named(name) => name.clone(),
        }
    }
}

/// Deprecation annotation data: a bare marker or an explicit reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deprecation {
    /// Generic deprecated marker with no reason.
    Marker,
    /// Explicit deprecation reason.
    Reason(String),
}

impl Deprecation {
    /// The reason surfaced in the schema; the marker falls back to a
    /// generic message.
    pub fn reason(&self) -> &str {
        match self {
            Deprecation::Marker => "Deprecated",
            Deprecation::Reason(r) => r,
        }
    }
}

/// A directive application on a member: directive name plus positional
/// literal argument values.
#[derive(Debug, Clone)]
pub struct DirectiveUse {
    /// Name of the referenced directive definition.
    pub name: String,
    /// Positional literal values, at most as many as the directive declares.
    pub values: Vec<Value>,
}

/// A host field descriptor.
#[derive(Clone)]
pub struct FieldSpec {
    /// Host identifier of the field.
    pub name: String,
    /// Explicit schema-name override from annotations.
    pub name_override: Option<String>,
    /// Description from annotations.
    pub description: Option<String>,
    /// Deprecation annotation, if any.
    pub deprecation: Option<Deprecation>,
    /// Explicit inclusion/exclusion signal on the field itself.
    pub expose: Option<bool>,
    /// Static fields are never exposed.
    pub is_static: bool,
    /// Declared shape.
    pub shape: TypeShape,
    /// Non-null annotation.
    pub required: bool,
    /// Directive applications.
    pub directives: Vec<DirectiveUse>,
}

impl FieldSpec {
    /// Creates a field descriptor with the given name and shape.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            name_override: None,
            description: None,
            deprecation: None,
            expose: None,
            is_static: false,
            shape,
            required: false,
            directives: Vec::new(),
        }
    }

    /// Sets the explicit inclusion signal.
    pub fn expose(mut self, expose: bool) -> Self {
        self.expose = Some(expose);
        self
    }

    /// Marks the field non-null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A host method parameter descriptor.
#[derive(Clone)]
pub struct ParamSpec {
    /// Host identifier of the parameter.
    pub name: String,
    /// Explicit argument-name override from annotations.
    pub name_override: Option<String>,
    /// Description from annotations.
    pub description: Option<String>,
    /// Declared shape.
    pub shape: TypeShape,
    /// Non-null annotation.
    pub required: bool,
    /// Schema-side default value.
    pub default_value: Option<Value>,
    /// Whether this parameter receives the execution context instead of a
    /// schema argument.
    pub is_context: bool,
}

impl ParamSpec {
    /// Creates a parameter descriptor with the given name and shape.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            name_override: None,
            description: None,
            shape,
            required: false,
            default_value: None,
            is_context: false,
        }
    }

    /// Marks this as the execution-context parameter.
    pub fn context(mut self) -> Self {
        self.is_context = true;
        self
    }

    /// Sets the schema-side default value.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A host method descriptor.
#[derive(Clone)]
pub struct MethodSpec {
    /// Host identifier of the method.
    pub name: String,
    /// Explicit schema-name override from annotations.
    pub name_override: Option<String>,
    /// Description from annotations.
    pub description: Option<String>,
    /// Deprecation annotation, if any.
    pub deprecation: Option<Deprecation>,
    /// Explicit inclusion/exclusion signal on the method itself.
    pub expose: Option<bool>,
    /// Static methods invoke without a source instance.
    pub is_static: bool,
    /// Compiler-synthesized bridge methods are never exposed.
    pub synthetic: bool,
    /// Invoke-detached marker: invoke on a fresh default-constructed instance.
    pub detached: bool,
    /// Batched marker: the declared return is a per-key list.
    pub batched: bool,
    /// Asynchronous-dispatch marker.
    pub async_fetch: bool,
    /// Relay-mutation marker: arguments arrive flattened under `input`.
    pub relay_mutation: bool,
    /// Connection marker: wrap the result in a paginated connection.
    pub connection: bool,
    /// Declared return shape.
    pub return_shape: TypeShape,
    /// Non-null annotation on the return.
    pub required: bool,
    /// Parameters in declaration order.
    pub params: Vec<ParamSpec>,
    /// Directive applications.
    pub directives: Vec<DirectiveUse>,
    /// Invocation target, when the extraction pass could bind one.
    pub invoke: Option<HostFn>,
}

impl MethodSpec {
    /// Creates a method descriptor with the given name and return shape.
    pub fn new(name: impl Into<String>, return_shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            name_override: None,
            description: None,
            deprecation: None,
            expose: None,
            is_static: false,
            synthetic: false,
            detached: false,
            batched: false,
            async_fetch: false,
            relay_mutation: false,
            connection: false,
            return_shape,
            required: false,
            params: Vec::new(),
            directives: Vec::new(),
            invoke: None,
        }
    }

    /// Sets the explicit inclusion signal.
    pub fn expose(mut self, expose: bool) -> Self {
        self.expose = Some(expose);
        self
    }

    /// Adds a parameter.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Binds the invocation target.
    pub fn invoke(
        mut self,
        f: impl Fn(Option<&Value>, &[Coerced]) -> Result<Value, FetchError> + Send + Sync + 'static,
    ) -> Self {
        self.invoke = Some(Arc::new(f));
        self
    }

    /// Marks the method non-null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The parameter shapes, used for exact-override matching.
    pub fn param_shapes(&self) -> Vec<&TypeShape> {
        self.params.iter().map(|p| &p.shape).collect()
    }
}

/// A constructor parameter descriptor.
#[derive(Clone)]
pub struct CtorParamSpec {
    /// Host identifier of the parameter.
    pub name: String,
    /// Explicit input-key override from annotations.
    pub key: Option<String>,
    /// Declared shape.
    pub shape: TypeShape,
    /// Non-null annotation.
    pub required: bool,
}

impl CtorParamSpec {
    /// Creates a constructor-parameter descriptor.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            key: None,
            shape,
            required: false,
        }
    }

    /// The map key this parameter is looked up under: the explicit override,
    /// else the parameter name.
    pub fn lookup_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

/// A host constructor descriptor.
#[derive(Clone)]
pub struct ConstructorSpec {
    /// Designated-constructor marker; else the first constructor is used.
    pub designated: bool,
    /// Parameters in declaration order.
    pub params: Vec<CtorParamSpec>,
    /// Invocation target producing the constructed instance as a value.
    pub construct: Option<HostFn>,
}

impl ConstructorSpec {
    /// Creates a constructor descriptor.
    pub fn new(params: Vec<CtorParamSpec>) -> Self {
        Self {
            designated: false,
            params,
            construct: None,
        }
    }

    /// Marks this as the designated constructor.
    pub fn designated(mut self) -> Self {
        self.designated = true;
        self
    }

    /// Binds the construction target.
    pub fn construct(
        mut self,
        f: impl Fn(Option<&Value>, &[Coerced]) -> Result<Value, FetchError> + Send + Sync + 'static,
    ) -> Self {
        self.construct = Some(Arc::new(f));
        self
    }
}

/// A host enum constant descriptor.
#[derive(Debug, Clone)]
pub struct EnumValueSpec {
    /// Host identifier of the constant.
    pub name: String,
    /// Explicit schema-name override from annotations.
    pub name_override: Option<String>,
    /// Description from annotations.
    pub description: Option<String>,
    /// Deprecation annotation, if any.
    pub deprecation: Option<Deprecation>,
}

impl EnumValueSpec {
    /// Creates an enum-constant descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_override: None,
            description: None,
            deprecation: None,
        }
    }
}

/// Union annotation data: the declared possible concrete types, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct UnionSpec {
    /// Possible concrete types; order is the runtime tie-break.
    pub possible_types: Vec<String>,
}

/// A host type descriptor.
#[derive(Clone)]
pub struct HostTypeSpec {
    /// Host identifier of the type.
    pub name: String,
    /// Description from annotations.
    pub description: Option<String>,
    /// Whether the host construct is an interface.
    pub is_interface: bool,
    /// Type-resolver annotation: derive an interface type.
    pub type_resolver: bool,
    /// Union annotation, if any.
    pub union: Option<UnionSpec>,
    /// Enum constants, for host enums.
    pub enum_values: Option<Vec<EnumValueSpec>>,
    /// Class-level inclusion/exclusion signal.
    pub expose: Option<bool>,
    /// Superclass link.
    pub superclass: Option<String>,
    /// Implemented interfaces, in declaration order.
    pub interfaces: Vec<String>,
    /// Declared fields.
    pub fields: Vec<FieldSpec>,
    /// Declared methods.
    pub methods: Vec<MethodSpec>,
    /// Declared constructors.
    pub constructors: Vec<ConstructorSpec>,
}

impl HostTypeSpec {
    /// Creates an empty class descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_interface: false,
            type_resolver: false,
            union: None,
            enum_values: None,
            expose: None,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Creates an interface descriptor carrying a type resolver.
    pub fn interface(name: impl Into<String>) -> Self {
        let mut spec = Self::new(name);
        spec.is_interface = true;
        spec.type_resolver = true;
        spec
    }

    /// Creates a union descriptor over the given possible types.
    pub fn union(name: impl Into<String>, possible_types: Vec<String>) -> Self {
        let mut spec = Self::new(name);
        spec.is_interface = true;
        spec.union = Some(UnionSpec { possible_types });
        spec
    }

    /// Creates an enum descriptor from its constants.
    pub fn enumeration(name: impl Into<String>, values: Vec<EnumValueSpec>) -> Self {
        let mut spec = Self::new(name);
        spec.enum_values = Some(values);
        spec
    }

    /// Sets the class-level inclusion signal.
    pub fn expose(mut self, expose: bool) -> Self {
        self.expose = Some(expose);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the superclass link.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Adds an implemented interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds a field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a method.
    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a constructor.
    pub fn constructor(mut self, ctor: ConstructorSpec) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// The designated constructor: the explicitly marked one, else the first.
    pub fn designated_constructor(&self) -> Option<&ConstructorSpec> {
        self.constructors
            .iter()
            .find(|c| c.designated)
            .or_else(|| self.constructors.first())
    }

    /// The zero-argument constructor, if declared.
    pub fn default_constructor(&self) -> Option<&ConstructorSpec> {
        self.constructors.iter().find(|c| c.params.is_empty())
    }

    /// A single-argument constructor, if declared.
    pub fn adapting_constructor(&self) -> Option<&ConstructorSpec> {
        self.constructors.iter().find(|c| c.params.len() == 1)
    }

    /// Finds a directly declared method by name.
    pub fn method_named(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Finds a directly declared field by name.
    pub fn field_named(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Registry of host type descriptors, keyed by host type name.
///
/// The registry is immutable during a build session; it is the sole source
/// of host structure for builders and fetchers.
#[derive(Default, Clone)]
pub struct HostRegistry {
    types: HashMap<String, Arc<HostTypeSpec>>,
}

impl HostRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, returning the shared handle.
    pub fn register(&mut self, spec: HostTypeSpec) -> Arc<HostTypeSpec> {
        let spec = Arc::new(spec);
        self.types.insert(spec.name.clone(), Arc::clone(&spec));
        spec
    }

    /// Looks up a descriptor by host name.
    pub fn get(&self, name: &str) -> Option<Arc<HostTypeSpec>> {
        self.types.get(name).cloned()
    }

    /// Looks up a descriptor, failing with a derivation error.
    pub fn expect(&self, name: &str) -> Result<Arc<HostTypeSpec>, DeriveError> {
        self.get(name).ok_or_else(|| DeriveError::UnknownHostType {
            name: name.to_string(),
        })
    }

    /// The type and each of its superclasses, nearest first. Unregistered
    /// ancestors end the walk.
    pub fn superclass_chain(&self, name: &str) -> Vec<Arc<HostTypeSpec>> {
        let mut chain = Vec::new();
        let mut current = self.get(name);
        while let Some(spec) = current {
            current = spec.superclass.as_deref().and_then(|s| self.get(s));
            chain.push(spec);
        }
        chain
    }

    /// Whether a value of type `concrete` is assignable to `target`:
    /// the same type, a superclass, or a transitively implemented interface.
    pub fn is_assignable(&self, target: &str, concrete: &str) -> bool {
        if target == concrete {
            return true;
        }
        let mut queue = VecDeque::from([concrete.to_string()]);
        let mut seen = HashSet::new();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if name == target {
                return true;
            }
            if let Some(spec) = self.get(&name) {
                queue.extend(spec.interfaces.iter().cloned());
                if let Some(superclass) = &spec.superclass {
                    queue.push_back(superclass.clone());
                }
            }
        }
        false
    }

    /// Reads the `__typename` tag from a runtime object value.
    pub fn typename_of(value: &Value) -> Option<&str> {
        match value {
            Value::Object(obj) => obj.get(TYPENAME_FIELD).and_then(|v| match v {
                Value::String(s) => Some(s.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Registered host type names, for diagnostics.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Builds a runtime object value tagged with its host type name.
pub fn typed_object<'a>(
    type_name: &str,
    entries: impl IntoIterator<Item = (&'a str, Value)>,
) -> Value {
    let mut map = async_graphql::indexmap::IndexMap::new();
    map.insert(
        Name::new(TYPENAME_FIELD),
        Value::String(type_name.to_string()),
    );
    for (key, value) in entries {
        map.insert(Name::new(key), value);
    }
    Value::Object(map)
}
