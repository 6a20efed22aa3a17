//! Schema derivation: type builders, the retriever orchestrator, directive
//! definitions and the lowering pass into the execution engine.

pub mod directives;
pub mod enum_type;
pub mod fields;
pub mod lower;
pub mod object;
pub mod retriever;
pub mod union_type;

pub use directives::{directive_sdl, DirectiveArgDef, DirectiveDef, DirectiveLocation};
pub use lower::{lower, AppContext};
pub use retriever::TypeRetriever;
