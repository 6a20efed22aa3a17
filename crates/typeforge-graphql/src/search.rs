//! Member search strategies.
//!
//! Two interchangeable algorithms decide whether a host member is exposed as
//! a schema field. Fields use a parent-chain walk over the declaring class
//! and its superclasses; methods use a breadth-first walk that also visits
//! interfaces, so an inclusion signal on an overridden declaration wins over
//! one further up the hierarchy. Both default to *not included* when no
//! definitive signal is found, and both terminate because the descriptor
//! graph is finite.

use std::collections::{HashSet, VecDeque};

use crate::host::{FieldSpec, HostRegistry, HostTypeSpec, MethodSpec};

/// Parent-chain search for fields.
///
/// Checks the explicit signal on the field itself, then the class-level
/// signal on the declaring class and each superclass in order. The first
/// definitive signal wins.
pub struct ParentalSearch;

impl ParentalSearch {
    /// Decides whether `field`, declared on `declaring`, is exposed.
    pub fn is_exposed(host: &HostRegistry, declaring: &HostTypeSpec, field: &FieldSpec) -> bool {
        if let Some(signal) = field.expose {
            return signal;
        }
        for spec in host.superclass_chain(&declaring.name) {
            if let Some(signal) = spec.expose {
                return signal;
            }
        }
        false
    }
}

/// Breadth-first search for methods.
///
/// Starting from the declaring class, each dequeued class is checked for an
/// exact override (same name and parameter shapes) carrying a signal, then
/// for a class-level signal; when neither is definitive its interfaces are
/// enqueued before its superclass.
pub struct BreadthFirstSearch;

impl BreadthFirstSearch {
    /// Decides whether `method`, declared on `declaring`, is exposed.
    pub fn is_exposed(host: &HostRegistry, declaring: &HostTypeSpec, method: &MethodSpec) -> bool {
        let mut queue = VecDeque::from([declaring.name.clone()]);
        let mut seen = HashSet::new();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(spec) = host.get(&name) else {
                continue;
            };

            // Exact override declared directly on this class wins first.
            if let Some(overridden) = spec
                .methods
                .iter()
                .find(|m| m.name == method.name && m.param_shapes() == method.param_shapes())
            {
                if let Some(signal) = overridden.expose {
                    return signal;
                }
            }

            if let Some(signal) = spec.expose {
                return signal;
            }

            queue.extend(spec.interfaces.iter().cloned());
            if let Some(superclass) = &spec.superclass {
                queue.push_back(superclass.clone());
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TypeShape;

    fn registry() -> HostRegistry {
        HostRegistry::new()
    }

    #[test]
    fn field_signal_on_member_wins() {
        let mut host = registry();
        let spec = host.register(
            HostTypeSpec::new("Doc")
                .expose(false)
                .field(FieldSpec::new("title", TypeShape::String).expose(true)),
        );
        assert!(ParentalSearch::is_exposed(&host, &spec, &spec.fields[0]));
    }

    #[test]
    fn field_falls_back_to_superclass_signal() {
        let mut host = registry();
        host.register(HostTypeSpec::new("Base").expose(true));
        let spec = host.register(
            HostTypeSpec::new("Doc")
                .extends("Base")
                .field(FieldSpec::new("title", TypeShape::String)),
        );
        assert!(ParentalSearch::is_exposed(&host, &spec, &spec.fields[0]));
    }

    #[test]
    fn field_defaults_to_excluded() {
        let mut host = registry();
        let spec =
            host.register(HostTypeSpec::new("Doc").field(FieldSpec::new("title", TypeShape::String)));
        assert!(!ParentalSearch::is_exposed(&host, &spec, &spec.fields[0]));
    }

    #[test]
    fn method_override_signal_beats_interface_signal() {
        let mut host = registry();
        host.register({
            let mut iface = HostTypeSpec::interface("Api");
            iface.expose = Some(true);
            iface.methods.push(MethodSpec::new("value", TypeShape::Int));
            iface
        });
        let spec = host.register(
            HostTypeSpec::new("Impl")
                .implements("Api")
                .method(MethodSpec::new("value", TypeShape::Int).expose(false)),
        );
        assert!(!BreadthFirstSearch::is_exposed(&host, &spec, &spec.methods[0]));
    }

    #[test]
    fn method_inherits_interface_class_signal() {
        let mut host = registry();
        host.register({
            let mut iface = HostTypeSpec::interface("Api");
            iface.expose = Some(true);
            iface
        });
        let spec = host.register(
            HostTypeSpec::new("Impl")
                .implements("Api")
                .method(MethodSpec::new("value", TypeShape::Int)),
        );
        assert!(BreadthFirstSearch::is_exposed(&host, &spec, &spec.methods[0]));
    }

    #[test]
    fn method_defaults_to_excluded_when_queue_empties() {
        let mut host = registry();
        let spec = host
            .register(HostTypeSpec::new("Impl").method(MethodSpec::new("value", TypeShape::Int)));
        assert!(!BreadthFirstSearch::is_exposed(&host, &spec, &spec.methods[0]));
    }

    #[test]
    fn overload_with_different_shapes_is_not_an_override() {
        let mut host = registry();
        host.register({
            let mut base = HostTypeSpec::new("Base").expose(true);
            base.methods
                .push(MethodSpec::new("value", TypeShape::Int).expose(false));
            base
        });
        // Same name, different parameter shapes: the base signal does not apply
        // to this overload, so the class-level signal on Base wins.
        let spec = host.register(
            HostTypeSpec::new("Impl").extends("Base").method(
                MethodSpec::new("value", TypeShape::Int)
                    .param(crate::host::ParamSpec::new("scale", TypeShape::Int)),
            ),
        );
        assert!(BreadthFirstSearch::is_exposed(&host, &spec, &spec.methods[0]));
    }
}
