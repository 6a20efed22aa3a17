//! Error types for schema derivation and field resolution.
//!
//! Errors are split along the lifecycle boundary: [`DeriveError`] covers
//! build-time failures (authoring mistakes and structural problems found
//! while deriving the type graph), while [`FetchError`] covers execution-time
//! failures raised by data fetchers. Build-time errors trigger a full reset
//! of the build session before they propagate.

/// Errors raised while deriving the schema type graph.
///
/// Every variant names the offending type or member so the message is
/// actionable without a stack trace.
#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    /// A referenced host type has no descriptor in the registry.
    #[error("Unknown host type: {name}")]
    UnknownHostType {
        /// The name the descriptor lookup failed for.
        name: String,
    },

    /// No type function in the chain accepted the member's declared shape.
    #[error("Unsupported type shape {shape} on {member}")]
    UnsupportedType {
        /// Rendered form of the unhandled shape.
        shape: String,
        /// The member that declared the shape.
        member: String,
    },

    /// The union annotation is only valid on interface descriptors.
    #[error("Union type {name} must be declared on an interface")]
    UnionOnNonInterface {
        /// The offending type.
        name: String,
    },

    /// A directive definition declared no valid locations.
    #[error("Directive {directive} declares no locations")]
    NoDirectiveLocations {
        /// The offending directive.
        directive: String,
    },

    /// A member referenced a directive that is not in the registry.
    #[error("Unknown directive {name} referenced by {member}")]
    UnknownDirective {
        /// The directive name that failed to resolve.
        name: String,
        /// The member carrying the reference.
        member: String,
    },

    /// More positional argument values were supplied than the directive declares.
    #[error(
        "Directive {directive} supplied {supplied} argument values but declares only {declared}"
    )]
    TooManyDirectiveArguments {
        /// The offending directive.
        directive: String,
        /// Number of values supplied.
        supplied: usize,
        /// Number of arguments declared.
        declared: usize,
    },

    /// Directive arguments must be scalar-typed.
    #[error("Directive {directive} argument {argument} is not scalar-typed")]
    NonScalarDirectiveArgument {
        /// The offending directive.
        directive: String,
        /// The non-scalar argument.
        argument: String,
    },

    /// A directive argument literal failed the scalar's value parsing.
    #[error("Directive {directive} argument {argument}: {reason}")]
    DirectiveArgumentParse {
        /// The offending directive.
        directive: String,
        /// The argument whose literal failed to parse.
        argument: String,
        /// Why the literal was rejected.
        reason: String,
    },

    /// A connection-annotated member's declared shape fails the pagination validator.
    #[error("Member {member} is not paginatable: {reason}")]
    InvalidPageShape {
        /// The offending member.
        member: String,
        /// Why the shape was rejected.
        reason: String,
    },

    /// Input-object derivation requires at least one constructor.
    #[error("Type {name} declares no constructor usable for input coercion")]
    MissingConstructor {
        /// The offending type.
        name: String,
    },

    /// The execution engine rejected the lowered schema.
    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),
}

/// Errors raised by data fetchers at query-execution time.
///
/// These propagate to the execution engine's per-field error collection and
/// are never retried here: they indicate a programming defect, not a
/// transient condition.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The member-name fallback chase exhausted every candidate.
    #[error("No matching method or field named {field} on {type_name}")]
    NoMatchingMember {
        /// The source type searched.
        type_name: String,
        /// The field base name searched for.
        field: String,
    },

    /// A union's runtime value matched none of its declared possible types.
    #[error("Union {union} cannot resolve concrete type {type_name}")]
    UnknownConcreteType {
        /// The union that failed to resolve.
        union: String,
        /// The runtime value's type name.
        type_name: String,
    },

    /// An argument value could not be coerced to the declared parameter shape.
    #[error("Cannot coerce argument {argument}: {reason}")]
    Coercion {
        /// The argument being coerced.
        argument: String,
        /// Why coercion failed.
        reason: String,
    },

    /// Constructing an input object found no usable constructor.
    #[error("Type {type_name} has no constructor accepting the supplied value")]
    NoConstructor {
        /// The input-object type.
        type_name: String,
    },

    /// Invoking a host method, constructor or accessor failed.
    #[error("Invocation failed: {0}")]
    Invocation(String),
}
