//! Object and interface builders.
//!
//! Member collection walks the declaring class and its superclasses,
//! nearest first, so an overriding declaration shadows the one above it.
//! Methods are gated by the breadth-first search strategy (skipping
//! compiler-synthesized members), fields by the parental search (skipping
//! statics). Implemented interfaces carrying a type resolver are attached by
//! reference when their build is in progress, and extension classes merge
//! additional fields in after the type's own members.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::DeriveError;
use crate::graph::{FieldDef, InterfaceDef, ObjectDef};
use crate::host::{HostRegistry, HostTypeSpec};
use crate::naming::to_graphql_name;
use crate::schema::fields::{
    method_field, method_field_name, placeholder_field, property_field, property_field_name,
};
use crate::schema::retriever::TypeRetriever;
use crate::search::{BreadthFirstSearch, ParentalSearch};
use crate::session::BuildSession;

/// Builds an object definition for a host class.
pub(crate) fn build_object(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    host: &HostRegistry,
    spec: &Arc<HostTypeSpec>,
    gname: &str,
) -> Result<ObjectDef, DeriveError> {
    let mut defined = HashSet::new();
    let mut fields = Vec::new();

    collect_hierarchy_members(session, retriever, host, spec, gname, &mut defined, &mut fields)?;

    let mut interfaces = Vec::new();
    for iface_name in &spec.interfaces {
        let Some(iface) = host.get(iface_name) else {
            continue;
        };
        if !iface.type_resolver {
            continue;
        }
        let iface_gname = to_graphql_name(&iface.name);
        if !session.contains_type(&iface_gname) && !session.is_processing(&iface_gname) {
            retriever.output_type(session, iface_name)?;
        }
        interfaces.push(iface_gname);
        // Fields contributed to the interface by extension classes apply to
        // every implementor.
        merge_extension_members(session, retriever, host, &iface.name, gname, &mut defined, &mut fields)?;
    }

    merge_extension_members(session, retriever, host, &spec.name, gname, &mut defined, &mut fields)?;

    if fields.is_empty() {
        fields.push(placeholder_field());
    }

    debug!(type_name = %gname, fields = fields.len(), "Built object type");
    Ok(ObjectDef {
        name: gname.to_string(),
        description: spec.description.clone(),
        interfaces,
        fields,
    })
}

/// Builds an interface definition for a host interface carrying a type
/// resolver. Concrete-type resolution happens at execution time from the
/// runtime value's type tag.
pub(crate) fn build_interface(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    host: &HostRegistry,
    spec: &Arc<HostTypeSpec>,
    gname: &str,
) -> Result<InterfaceDef, DeriveError> {
    let mut defined = HashSet::new();
    let mut fields = Vec::new();

    collect_hierarchy_members(session, retriever, host, spec, gname, &mut defined, &mut fields)?;
    merge_extension_members(session, retriever, host, &spec.name, gname, &mut defined, &mut fields)?;

    if fields.is_empty() {
        fields.push(placeholder_field());
    }

    debug!(type_name = %gname, fields = fields.len(), "Built interface type");
    Ok(InterfaceDef {
        name: gname.to_string(),
        description: spec.description.clone(),
        fields,
    })
}

/// Collects accepted members from the class and its superclass chain.
fn collect_hierarchy_members(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    host: &HostRegistry,
    spec: &Arc<HostTypeSpec>,
    parent_type: &str,
    defined: &mut HashSet<String>,
    out: &mut Vec<FieldDef>,
) -> Result<(), DeriveError> {
    for class in host.superclass_chain(&spec.name) {
        collect_class_members(session, retriever, host, &class, parent_type, defined, out)?;
    }
    Ok(())
}

/// Collects one class's own accepted members, skipping names already defined.
fn collect_class_members(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    host: &HostRegistry,
    class: &Arc<HostTypeSpec>,
    parent_type: &str,
    defined: &mut HashSet<String>,
    out: &mut Vec<FieldDef>,
) -> Result<(), DeriveError> {
    for method in class.methods.iter().filter(|m| !m.synthetic) {
        if !BreadthFirstSearch::is_exposed(host, class, method) {
            continue;
        }
        // Resolve the name first so a shadowed duplicate never rebinds the
        // surviving field's fetcher.
        if !defined.insert(method_field_name(method)) {
            continue;
        }
        out.push(method_field(session, retriever, class, parent_type, method)?);
    }

    for field in class.fields.iter().filter(|f| !f.is_static) {
        if !ParentalSearch::is_exposed(host, class, field) {
            continue;
        }
        if !defined.insert(property_field_name(field)) {
            continue;
        }
        out.push(property_field(session, retriever, class, parent_type, field)?);
    }

    Ok(())
}

/// Merges fields contributed by extension classes registered for `base`.
fn merge_extension_members(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    host: &HostRegistry,
    base: &str,
    parent_type: &str,
    defined: &mut HashSet<String>,
    out: &mut Vec<FieldDef>,
) -> Result<(), DeriveError> {
    let extensions: Vec<String> = session.extensions_of(base).to_vec();
    for ext_name in extensions {
        let ext = host.expect(&ext_name)?;
        collect_class_members(session, retriever, host, &ext, parent_type, defined, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FieldSpec, MethodSpec, TypeShape};

    fn build(host: HostRegistry, name: &str) -> (BuildSession, ObjectDef) {
        let spec = host.get(name).unwrap();
        let retriever = TypeRetriever::new(Arc::new(host));
        let mut session = BuildSession::new();
        session.start_processing(name);
        let def = build_object(&mut session, &retriever, retriever.host(), &spec, name).unwrap();
        (session, def)
    }

    #[test]
    fn collects_exposed_methods_and_fields() {
        let mut host = HostRegistry::new();
        host.register(
            HostTypeSpec::new("Human")
                .expose(true)
                .method(MethodSpec::new("getName", TypeShape::String))
                .field(FieldSpec::new("age", TypeShape::Int)),
        );

        let (session, def) = build(host, "Human");
        let names: Vec<_> = def.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "age"]);
        assert!(session.fetcher("Human", "name").is_some());
        assert!(session.fetcher("Human", "age").is_some());
    }

    #[test]
    fn subclass_override_shadows_superclass_member() {
        let mut host = HostRegistry::new();
        host.register(
            HostTypeSpec::new("Base")
                .expose(true)
                .method(MethodSpec::new("getName", TypeShape::String).description("base")),
        );
        host.register(
            HostTypeSpec::new("Human")
                .extends("Base")
                .expose(true)
                .method(MethodSpec::new("getName", TypeShape::String).description("override")),
        );

        let (_, def) = build(host, "Human");
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].description.as_deref(), Some("override"));
    }

    #[test]
    fn empty_types_get_a_placeholder_field() {
        let mut host = HostRegistry::new();
        host.register(HostTypeSpec::new("Empty"));

        let (_, def) = build(host, "Empty");
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].name, "_placeholder");
    }

    #[test]
    fn implemented_resolver_interfaces_are_attached() {
        let mut host = HostRegistry::new();
        host.register(
            HostTypeSpec::interface("Named")
                .expose(true)
                .method(MethodSpec::new("getName", TypeShape::String)),
        );
        host.register(
            HostTypeSpec::new("Human")
                .implements("Named")
                .expose(true)
                .method(MethodSpec::new("getName", TypeShape::String)),
        );

        let (session, def) = build(host, "Human");
        assert_eq!(def.interfaces, ["Named"]);
        assert!(session.contains_type("Named"));
    }

    #[test]
    fn extension_classes_contribute_fields() {
        let mut host = HostRegistry::new();
        host.register(
            HostTypeSpec::new("Human")
                .expose(true)
                .method(MethodSpec::new("getName", TypeShape::String)),
        );
        host.register(
            HostTypeSpec::new("HumanExtra")
                .expose(true)
                .method(MethodSpec::new("getNickname", TypeShape::String)),
        );

        let spec = host.get("Human").unwrap();
        let retriever = TypeRetriever::new(Arc::new(host));
        let mut session = BuildSession::new();
        session.register_extension("Human", "HumanExtra");
        session.start_processing("Human");
        let def =
            build_object(&mut session, &retriever, retriever.host(), &spec, "Human").unwrap();

        let names: Vec<_> = def.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "nickname"]);
    }

    #[test]
    fn interface_builder_collects_members() {
        let mut host = HostRegistry::new();
        let spec = host.register(
            HostTypeSpec::interface("Named")
                .expose(true)
                .method(MethodSpec::new("getName", TypeShape::String)),
        );
        let retriever = TypeRetriever::new(Arc::new(host));
        let mut session = BuildSession::new();
        session.start_processing("Named");
        let def =
            build_interface(&mut session, &retriever, retriever.host(), &spec, "Named").unwrap();
        assert_eq!(def.fields[0].name, "name");
    }
}
