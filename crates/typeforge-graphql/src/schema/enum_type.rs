//! Enum builder.

use crate::graph::{EnumDef, EnumValueDef};
use crate::host::HostTypeSpec;

/// Builds an enum definition from a host enum descriptor.
///
/// Each constant becomes one value: the name is the explicit override else
/// the constant's identifier, and the description falls back to the
/// identifier too, so every enum value carries a non-null description.
pub(crate) fn build_enum(spec: &HostTypeSpec, gname: &str) -> EnumDef {
    let values = spec
        .enum_values
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|value| EnumValueDef {
            name: value
                .name_override
                .clone()
                .unwrap_or_else(|| value.name.clone()),
            description: value
                .description
                .clone()
                .unwrap_or_else(|| value.name.clone()),
            deprecation: value.deprecation.as_ref().map(|d| d.reason().to_string()),
        })
        .collect();

    EnumDef {
        name: gname.to_string(),
        description: spec.description.clone(),
        values,
    }
}
