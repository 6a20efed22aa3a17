//! The build session: process-scoped state for one schema derivation.
//!
//! A [`BuildSession`] owns the type registry (for de-duplication and cycle
//! breaking), the processing stack, the extension and directive registries,
//! the data-fetcher bindings and the live type-function chain. Sessions are
//! explicitly constructed and explicitly passed; there is no process-wide
//! shared default. One session serves one single-threaded build; after the
//! build it is read-only and safe to share with concurrently executing
//! fetchers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::fetch::DataFetcher;
use crate::graph::TypeDef;
use crate::schema::directives::DirectiveDef;
use crate::typefn::TypeFunctionRegistry;

/// Identifies a field in the built schema: `(parent type name, field name)`.
pub type FieldCoordinate = (String, String);

/// Mutable state for one schema-build session.
#[derive(Default)]
pub struct BuildSession {
    /// Built types keyed by resolved name; at most one instance per name.
    types: HashMap<String, Arc<TypeDef>>,
    /// Registration order, for deterministic lowering.
    order: Vec<String>,
    /// Names currently under construction; presence signals a cycle.
    processing: Vec<String>,
    /// Base host type name to the extension host types contributing fields.
    extensions: HashMap<String, Vec<String>>,
    /// Built directive definitions keyed by name.
    directives: HashMap<String, DirectiveDef>,
    /// Data-fetcher bindings keyed by field coordinate.
    fetchers: HashMap<FieldCoordinate, Arc<dyn DataFetcher>>,
    /// The live, ordered type-function chain.
    type_functions: TypeFunctionRegistry,
}

impl BuildSession {
    /// Creates a fresh session with the built-in type-function chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the built type registered under `name`, if present.
    ///
    /// Repeated calls for the same name return the identical `Arc` instance;
    /// a registered type is never rebuilt.
    pub fn type_def(&self, name: &str) -> Option<Arc<TypeDef>> {
        self.types.get(name).cloned()
    }

    /// Whether a type is registered under `name`.
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Whether `name` is currently under construction.
    pub fn is_processing(&self, name: &str) -> bool {
        self.processing.iter().any(|n| n == name)
    }

    /// Pushes a name onto the processing stack before construction begins.
    pub fn start_processing(&mut self, name: &str) {
        trace!(type_name = %name, "Start building type");
        self.processing.push(name.to_string());
    }

    /// Registers a fully built type and pops it from the processing stack.
    pub fn finish_processing(&mut self, def: TypeDef) -> Arc<TypeDef> {
        let name = def.name().to_string();
        if let Some(pos) = self.processing.iter().rposition(|n| n == &name) {
            self.processing.remove(pos);
        }
        trace!(type_name = %name, "Finished building type");
        let def = Arc::new(def);
        if !self.types.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.types.insert(name, Arc::clone(&def));
        def
    }

    /// Registers an extension type contributing fields to `base`.
    pub fn register_extension(&mut self, base: impl Into<String>, extension: impl Into<String>) {
        self.extensions
            .entry(base.into())
            .or_default()
            .push(extension.into());
    }

    /// Extension host types registered for `base`, in registration order.
    pub fn extensions_of(&self, base: &str) -> &[String] {
        self.extensions.get(base).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registers a directive definition under its name.
    pub fn register_directive(&mut self, directive: DirectiveDef) {
        self.directives.insert(directive.name.clone(), directive);
    }

    /// Looks up a directive definition by name.
    pub fn directive(&self, name: &str) -> Option<&DirectiveDef> {
        self.directives.get(name)
    }

    /// All registered directive definitions.
    pub fn directive_definitions(&self) -> impl Iterator<Item = &DirectiveDef> {
        self.directives.values()
    }

    /// Binds a data fetcher to a field coordinate.
    pub fn bind_fetcher(
        &mut self,
        parent: impl Into<String>,
        field: impl Into<String>,
        fetcher: Arc<dyn DataFetcher>,
    ) {
        self.fetchers.insert((parent.into(), field.into()), fetcher);
    }

    /// The fetcher bound to a field coordinate, if any.
    pub fn fetcher(&self, parent: &str, field: &str) -> Option<Arc<dyn DataFetcher>> {
        self.fetchers
            .get(&(parent.to_string(), field.to_string()))
            .cloned()
    }

    /// The live type-function chain.
    pub fn type_functions(&self) -> &TypeFunctionRegistry {
        &self.type_functions
    }

    /// Mutable access to the type-function chain, for registering custom
    /// functions ahead of the built-ins.
    pub fn type_functions_mut(&mut self) -> &mut TypeFunctionRegistry {
        &mut self.type_functions
    }

    /// Built types in registration order.
    pub fn type_defs(&self) -> impl Iterator<Item = (&str, &Arc<TypeDef>)> {
        self.order
            .iter()
            .filter_map(|name| self.types.get(name).map(|def| (name.as_str(), def)))
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Clears the entire session.
    ///
    /// Invoked when any build step fails, so subsequent build attempts never
    /// observe a half-built graph. The type-function chain and directive
    /// registry survive a reset; they are configuration, not build product.
    pub fn reset(&mut self) {
        debug!(
            types = self.types.len(),
            in_progress = self.processing.len(),
            "Resetting build session after failure"
        );
        self.types.clear();
        self.order.clear();
        self.processing.clear();
        self.fetchers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ObjectDef;

    fn object(name: &str) -> TypeDef {
        TypeDef::Object(ObjectDef {
            name: name.into(),
            description: None,
            interfaces: vec![],
            fields: vec![],
        })
    }

    #[test]
    fn registered_types_return_the_identical_instance() {
        let mut session = BuildSession::new();
        session.start_processing("Human");
        let first = session.finish_processing(object("Human"));
        let second = session.type_def("Human").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn processing_stack_tracks_in_progress_names() {
        let mut session = BuildSession::new();
        session.start_processing("Human");
        assert!(session.is_processing("Human"));
        session.finish_processing(object("Human"));
        assert!(!session.is_processing("Human"));
        assert!(session.contains_type("Human"));
    }

    #[test]
    fn reset_clears_types_and_stack() {
        let mut session = BuildSession::new();
        session.start_processing("Human");
        session.finish_processing(object("Human"));
        session.start_processing("Droid");
        session.reset();
        assert_eq!(session.type_count(), 0);
        assert!(!session.is_processing("Droid"));
    }

    #[test]
    fn extensions_accumulate_in_order() {
        let mut session = BuildSession::new();
        session.register_extension("Human", "HumanExtra");
        session.register_extension("Human", "HumanMore");
        assert_eq!(session.extensions_of("Human"), ["HumanExtra", "HumanMore"]);
        assert!(session.extensions_of("Droid").is_empty());
    }
}
