//! Directive definitions and argument-value transformation.
//!
//! Directive definitions are registered by name in the build session before
//! or during schema construction and consulted whenever a member references
//! a directive. Applying a directive supplies positional literal values:
//! with `k` values against `m ≥ k` declared arguments, the first `k`
//! arguments carry the parsed literals and the remaining `m − k` keep their
//! declared defaults. Supplying more values than declared, or declaring a
//! non-scalar argument type, is a configuration error.
//!
//! The execution engine's dynamic schema does not accept custom directive
//! definitions directly, so [`directive_sdl`] renders the registry as SDL
//! for documentation, and applied directives travel on field definitions.

use async_graphql::Value;

use crate::error::DeriveError;
use crate::graph::AppliedDirective;
use crate::host::TypeShape;

/// Valid locations for a directive, in SDL spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveLocation {
    /// A field in a query document.
    Field,
    /// A field definition in the schema.
    FieldDefinition,
    /// An object type definition.
    Object,
    /// An interface type definition.
    Interface,
    /// A union type definition.
    Union,
    /// An enum type definition.
    Enum,
    /// An enum value definition.
    EnumValue,
    /// An input object type definition.
    InputObject,
    /// An argument definition.
    ArgumentDefinition,
    /// A scalar type definition.
    Scalar,
}

impl DirectiveLocation {
    /// SDL spelling of the location.
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Scalar => "SCALAR",
        }
    }
}

/// One declared argument of a directive. Directive arguments are restricted
/// to scalar shapes.
#[derive(Debug, Clone)]
pub struct DirectiveArgDef {
    /// Argument name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Declared shape; must be scalar.
    pub shape: TypeShape,
    /// Declared default value.
    pub default_value: Option<Value>,
}

impl DirectiveArgDef {
    /// Creates a directive argument declaration.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            description: None,
            shape,
            default_value: None,
        }
    }

    /// Sets the declared default value.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A built directive definition.
#[derive(Debug, Clone)]
pub struct DirectiveDef {
    /// Directive name, without the leading `@`.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Valid locations; at least one is required.
    pub locations: Vec<DirectiveLocation>,
    /// Declared arguments in order.
    pub args: Vec<DirectiveArgDef>,
}

impl DirectiveDef {
    /// Creates a directive definition with no locations or arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            locations: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a valid location.
    pub fn location(mut self, location: DirectiveLocation) -> Self {
        self.locations.push(location);
        self
    }

    /// Adds a declared argument.
    pub fn arg(mut self, arg: DirectiveArgDef) -> Self {
        self.args.push(arg);
        self
    }

    /// Validates the structural rules: at least one location, scalar-only
    /// argument shapes.
    pub fn validated(self) -> Result<Self, DeriveError> {
        if self.locations.is_empty() {
            return Err(DeriveError::NoDirectiveLocations {
                directive: self.name,
            });
        }
        if let Some(arg) = self.args.iter().find(|a| !a.shape.is_scalar()) {
            return Err(DeriveError::NonScalarDirectiveArgument {
                directive: self.name.clone(),
                argument: arg.name.clone(),
            });
        }
        Ok(self)
    }

    /// Applies the directive with positional literal values.
    ///
    /// The first `supplied.len()` declared arguments receive their literal
    /// parsed through the argument's scalar value parsing; trailing
    /// arguments keep their declared default. More values than declared
    /// arguments is a configuration error.
    pub fn apply(&self, supplied: &[Value]) -> Result<AppliedDirective, DeriveError> {
        if supplied.len() > self.args.len() {
            return Err(DeriveError::TooManyDirectiveArguments {
                directive: self.name.clone(),
                supplied: supplied.len(),
                declared: self.args.len(),
            });
        }

        let mut args = Vec::with_capacity(self.args.len());
        for (i, decl) in self.args.iter().enumerate() {
            let value = match supplied.get(i) {
                Some(literal) => parse_scalar(&decl.shape, literal).map_err(|reason| {
                    DeriveError::DirectiveArgumentParse {
                        directive: self.name.clone(),
                        argument: decl.name.clone(),
                        reason,
                    }
                })?,
                None => decl.default_value.clone().unwrap_or(Value::Null),
            };
            args.push((decl.name.clone(), value));
        }

        Ok(AppliedDirective {
            name: self.name.clone(),
            args,
        })
    }

    /// Renders this definition as SDL.
    pub fn sdl(&self) -> String {
        let mut out = String::new();
        if let Some(description) = &self.description {
            out.push_str(&format!("\"\"\"\n{description}\n\"\"\"\n"));
        }
        out.push_str(&format!("directive @{}", self.name));
        if !self.args.is_empty() {
            let args: Vec<String> = self
                .args
                .iter()
                .map(|a| {
                    let ty = scalar_name(&a.shape);
                    match &a.default_value {
                        Some(default) => format!("{}: {} = {}", a.name, ty, default),
                        None => format!("{}: {}", a.name, ty),
                    }
                })
                .collect();
            out.push_str(&format!("({})", args.join(", ")));
        }
        let locations: Vec<&str> = self.locations.iter().map(|l| l.as_str()).collect();
        out.push_str(&format!(" on {}", locations.join(" | ")));
        out
    }
}

/// Renders all registered directive definitions as an SDL document.
pub fn directive_sdl<'a>(defs: impl Iterator<Item = &'a DirectiveDef>) -> String {
    let mut rendered: Vec<String> = defs.map(DirectiveDef::sdl).collect();
    rendered.sort();
    rendered.join("\n\n")
}

/// Parses a literal through a scalar shape's value parsing.
///
/// Mirrors GraphQL scalar coercion: strings for `String`, booleans for
/// `Boolean`, in-range integers for `Int`/`Long`, numbers for `Float`, and
/// strings or integers for `ID`.
pub fn parse_scalar(shape: &TypeShape, value: &Value) -> Result<Value, String> {
    match (shape, value) {
        (TypeShape::String, Value::String(_)) => Ok(value.clone()),
        (TypeShape::Boolean, Value::Boolean(_)) => Ok(value.clone()),
        (TypeShape::Int, Value::Number(n)) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => Ok(value.clone()),
            Some(i) => Err(format!("{i} is out of Int range")),
            None => Err(format!("{n} is not an integer")),
        },
        (TypeShape::Long, Value::Number(n)) => match n.as_i64() {
            Some(_) => Ok(value.clone()),
            None => Err(format!("{n} is not an integer")),
        },
        (TypeShape::Float, Value::Number(_)) => Ok(value.clone()),
        (TypeShape::Id, Value::String(_)) => Ok(value.clone()),
        (TypeShape::Id, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (shape, value) => Err(format!("{value} is not a valid {}", shape.render())),
    }
}

/// Returns the scalar type name for a scalar shape. Non-scalar shapes are
/// rejected before this point by [`DirectiveDef::validated`].
fn scalar_name(shape: &TypeShape) -> &'static str {
    match shape {
        TypeShape::Id => "ID",
        TypeShape::String => "String",
        TypeShape::Boolean => "Boolean",
        TypeShape::Float => "Float",
        TypeShape::Int => "Int",
        TypeShape::Long => "Long",
        _ => "String",
    }
}
