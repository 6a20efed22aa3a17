//! Union builder.

use std::sync::Arc;

use crate::error::DeriveError;
use crate::graph::{UnionDef, UnionMember};
use crate::host::HostTypeSpec;
use crate::naming::to_graphql_name;
use crate::schema::retriever::TypeRetriever;
use crate::session::BuildSession;

/// Builds a union definition.
///
/// The union annotation is only valid on interface descriptors. Each
/// declared possible type is resolved to an output type; a possible type
/// whose build is currently in progress is referenced by name instead of
/// re-entering construction. Declaration order is preserved because it is
/// the runtime tie-break when a value is assignable to several members.
pub(crate) fn build_union(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    spec: &Arc<HostTypeSpec>,
    gname: &str,
) -> Result<UnionDef, DeriveError> {
    if !spec.is_interface {
        return Err(DeriveError::UnionOnNonInterface {
            name: spec.name.clone(),
        });
    }

    let possible: Vec<String> = spec
        .union
        .as_ref()
        .map(|u| u.possible_types.clone())
        .unwrap_or_default();

    let mut members = Vec::with_capacity(possible.len());
    for host_name in possible {
        let forward = to_graphql_name(&host_name);
        let type_name = if session.is_processing(&forward) {
            forward
        } else {
            retriever
                .output_type(session, &host_name)?
                .base_name()
                .to_string()
        };
        members.push(UnionMember {
            host_name,
            type_name,
        });
    }

    Ok(UnionDef {
        name: gname.to_string(),
        description: spec.description.clone(),
        members,
    })
}
