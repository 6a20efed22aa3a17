//! The type-function chain: host shapes to schema type references.
//!
//! An ordered, extensible chain of mapping strategies. Given a member's
//! declared [`TypeShape`], the first function whose `can_handle` accepts it
//! produces the schema type, recursing into element shapes for containers.
//! Custom functions registered at runtime are inserted ahead of the
//! built-ins, so the most specific strategy wins. Non-null wrapping is
//! applied once, centrally, in [`member_type`] — never by individual
//! functions, which avoids double-wrapping.

use std::sync::Arc;

use crate::error::DeriveError;
use crate::graph::SchemaTypeRef;
use crate::host::TypeShape;
use crate::schema::retriever::TypeRetriever;
use crate::session::BuildSession;

/// Name of the custom 64-bit integer scalar registered at lowering.
pub const LONG_SCALAR: &str = "Long";

/// Whether a shape maps to an output or an input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Field return position.
    Output,
    /// Argument or input-object field position.
    Input,
}

/// Context threaded through the chain, bundling the session and the type
/// retriever so container functions can recurse and the named dispatch can
/// descend into referenced types.
pub struct TypeFnContext<'a> {
    /// The active build session.
    pub session: &'a mut BuildSession,
    /// The orchestrator, for named-type descent.
    pub retriever: &'a TypeRetriever,
    /// The member whose type is being resolved, for error messages.
    pub member: &'a str,
    chain: &'a TypeFunctionRegistry,
}

impl TypeFnContext<'_> {
    /// Re-runs the chain for a nested shape.
    pub fn resolve(&mut self, kind: TypeKind, shape: &TypeShape) -> Result<SchemaTypeRef, DeriveError> {
        let chain = self.chain;
        chain.dispatch(kind, shape, self)
    }
}

/// A single type-mapping strategy.
pub trait TypeFunction: Send + Sync {
    /// Whether this function handles the given shape.
    fn can_handle(&self, shape: &TypeShape) -> bool;

    /// Builds the schema type for a handled shape.
    fn build(
        &self,
        kind: TypeKind,
        shape: &TypeShape,
        ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError>;
}

/// The ordered chain of type functions.
#[derive(Clone)]
pub struct TypeFunctionRegistry {
    functions: Vec<Arc<dyn TypeFunction>>,
}

impl Default for TypeFunctionRegistry {
    fn default() -> Self {
        Self {
            functions: vec![
                Arc::new(ScalarFunction::new(TypeShape::Id, "ID")),
                Arc::new(ScalarFunction::new(TypeShape::String, "String")),
                Arc::new(ScalarFunction::new(TypeShape::Boolean, "Boolean")),
                Arc::new(ScalarFunction::new(TypeShape::Float, "Float")),
                Arc::new(ScalarFunction::new(TypeShape::Int, "Int")),
                Arc::new(ScalarFunction::new(TypeShape::Long, LONG_SCALAR)),
                Arc::new(IterableFunction),
                Arc::new(StreamFunction),
                Arc::new(OptionalFunction),
                Arc::new(NonNullFunction),
                // The named dispatch always matches and must stay last.
                Arc::new(NamedTypeFunction),
            ],
        }
    }
}

impl TypeFunctionRegistry {
    /// Creates the built-in chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a custom function ahead of every existing one.
    pub fn register(&mut self, function: Arc<dyn TypeFunction>) {
        self.functions.insert(0, function);
    }

    /// Runs the chain; the first matching function wins.
    pub fn dispatch(
        &self,
        kind: TypeKind,
        shape: &TypeShape,
        ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError> {
        for function in &self.functions {
            if function.can_handle(shape) {
                return function.build(kind, shape, ctx);
            }
        }
        Err(DeriveError::UnsupportedType {
            shape: shape.render(),
            member: ctx.member.to_string(),
        })
    }
}

/// Resolves a member's schema type through the session's chain, then applies
/// the member's non-null annotation exactly once.
pub fn member_type(
    kind: TypeKind,
    shape: &TypeShape,
    required: bool,
    member: &str,
    session: &mut BuildSession,
    retriever: &TypeRetriever,
) -> Result<SchemaTypeRef, DeriveError> {
    // Snapshot the chain so registrations during the build don't interleave
    // with an in-progress resolution.
    let chain = session.type_functions().clone();
    let mut ctx = TypeFnContext {
        session,
        retriever,
        member,
        chain: &chain,
    };
    let ty = chain.dispatch(kind, shape, &mut ctx)?;
    Ok(match ty {
        ty @ SchemaTypeRef::NonNull(_) => ty,
        ty if required => SchemaTypeRef::non_null(ty),
        ty => ty,
    })
}

/// Maps one scalar shape to its schema scalar name.
struct ScalarFunction {
    shape: TypeShape,
    name: &'static str,
}

impl ScalarFunction {
    fn new(shape: TypeShape, name: &'static str) -> Self {
        Self { shape, name }
    }
}

impl TypeFunction for ScalarFunction {
    fn can_handle(&self, shape: &TypeShape) -> bool {
        *shape == self.shape
    }

    fn build(
        &self,
        _kind: TypeKind,
        _shape: &TypeShape,
        _ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError> {
        Ok(SchemaTypeRef::named(self.name))
    }
}

/// Arrays, collections and iterables: recurse into the element and wrap in a
/// list reference.
struct IterableFunction;

impl TypeFunction for IterableFunction {
    fn can_handle(&self, shape: &TypeShape) -> bool {
        matches!(shape, TypeShape::List(_))
    }

    fn build(
        &self,
        kind: TypeKind,
        shape: &TypeShape,
        ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError> {
        let TypeShape::List(inner) = shape else {
            unreachable!("guarded by can_handle");
        };
        Ok(SchemaTypeRef::list(ctx.resolve(kind, inner)?))
    }
}

/// Streams have list semantics in the schema.
struct StreamFunction;

impl TypeFunction for StreamFunction {
    fn can_handle(&self, shape: &TypeShape) -> bool {
        matches!(shape, TypeShape::Stream(_))
    }

    fn build(
        &self,
        kind: TypeKind,
        shape: &TypeShape,
        ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError> {
        let TypeShape::Stream(inner) = shape else {
            unreachable!("guarded by can_handle");
        };
        Ok(SchemaTypeRef::list(ctx.resolve(kind, inner)?))
    }
}

/// Optionals unwrap one level; nullability is the schema default, so the
/// inner type passes through with no additional wrapper.
struct OptionalFunction;

impl TypeFunction for OptionalFunction {
    fn can_handle(&self, shape: &TypeShape) -> bool {
        matches!(shape, TypeShape::Optional(_))
    }

    fn build(
        &self,
        kind: TypeKind,
        shape: &TypeShape,
        ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError> {
        let TypeShape::Optional(inner) = shape else {
            unreachable!("guarded by can_handle");
        };
        ctx.resolve(kind, inner)
    }
}

/// Non-null at a nested position, e.g. the element of a list. Resolves the
/// inner shape and wraps it, never stacking two wrappers.
struct NonNullFunction;

impl TypeFunction for NonNullFunction {
    fn can_handle(&self, shape: &TypeShape) -> bool {
        matches!(shape, TypeShape::NonNull(_))
    }

    fn build(
        &self,
        kind: TypeKind,
        shape: &TypeShape,
        ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError> {
        let TypeShape::NonNull(inner) = shape else {
            unreachable!("guarded by can_handle");
        };
        Ok(match ctx.resolve(kind, inner)? {
            ty @ SchemaTypeRef::NonNull(_) => ty,
            ty => SchemaTypeRef::non_null(ty),
        })
    }
}

/// Catch-all dispatch into the type retriever for named host types. Always
/// matches; registered last.
struct NamedTypeFunction;

impl TypeFunction for NamedTypeFunction {
    fn can_handle(&self, _shape: &TypeShape) -> bool {
        true
    }

    fn build(
        &self,
        kind: TypeKind,
        shape: &TypeShape,
        ctx: &mut TypeFnContext<'_>,
    ) -> Result<SchemaTypeRef, DeriveError> {
        match shape {
            TypeShape::Named(name) => match kind {
                TypeKind::Output => ctx.retriever.output_type(ctx.session, name),
                TypeKind::Input => ctx.retriever.input_type(ctx.session, name),
            },
            other => Err(DeriveError::UnsupportedType {
                shape: other.render(),
                member: ctx.member.to_string(),
            }),
        }
    }
}
