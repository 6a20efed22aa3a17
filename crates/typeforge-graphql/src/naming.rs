//! GraphQL name normalization and field-name derivation.
//!
//! GraphQL identifiers must match `[_A-Za-z][_0-9A-Za-z]*`. Host identifiers
//! frequently do not (nested type separators, generated names), so every name
//! entering the type graph passes through [`to_graphql_name`] exactly once.
//! Normalization is deterministic but one-way: re-normalizing an escaped name
//! is not guaranteed to be stable, so callers never apply it twice.

/// Checks whether a name is already a valid GraphQL identifier.
pub fn is_valid_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Normalizes a host identifier into a valid GraphQL identifier.
///
/// Valid names pass through unchanged. Otherwise each invalid character is
/// replaced deterministically: `.` and `$` (nested-type separators) become
/// `_`; any other invalid character becomes `_<decimal codepoint>_`. A digit
/// in first position is invalid as a start character and escapes the same
/// way.
pub fn to_graphql_name(name: &str) -> String {
    if is_valid_graphql_name(name) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    for (i, ch) in name.chars().enumerate() {
        let valid = if i == 0 {
            ch.is_ascii_alphabetic() || ch == '_'
        } else {
            ch.is_ascii_alphanumeric() || ch == '_'
        };
        if valid {
            out.push(ch);
        } else if ch == '.' || ch == '$' {
            out.push('_');
        } else {
            out.push('_');
            out.push_str(&(ch as u32).to_string());
            out.push('_');
        }
    }
    out
}

/// Derives a schema field name from an accessor-style method name.
///
/// Strips a leading `get`, `is` or `set` prefix and lower-cases the first
/// remaining character, so `getName` becomes `name` and `isActive` becomes
/// `active`. Names without a recognized prefix are returned with only the
/// first character lower-cased when the whole name is not already
/// lower-leading. Used only when no explicit name override is present.
pub fn derive_field_name(method_name: &str) -> String {
    let stripped = strip_accessor_prefix(method_name).unwrap_or(method_name);
    lower_first(stripped)
}

/// Strips a `get`/`is`/`set` accessor prefix, if one is present and followed
/// by at least one character.
pub fn strip_accessor_prefix(name: &str) -> Option<&str> {
    for prefix in ["get", "is", "set"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() {
                return Some(rest);
            }
        }
    }
    None
}

/// Lower-cases the first character of a string.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Upper-cases the first character of a string.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_pass_through_unchanged() {
        for name in ["Human", "_internal", "Type123", "Some_Type"] {
            assert_eq!(to_graphql_name(name), name);
            // Single application of an already-valid name is stable.
            assert_eq!(to_graphql_name(&to_graphql_name(name)), name);
        }
    }

    #[test]
    fn dots_and_dollars_become_underscores() {
        assert_eq!(to_graphql_name("outer.Inner"), "outer_Inner");
        assert_eq!(to_graphql_name("Outer$Inner"), "Outer_Inner");
        assert_eq!(to_graphql_name("a.b$c"), "a_b_c");
    }

    #[test]
    fn other_invalid_characters_escape_to_codepoints() {
        // '-' is codepoint 45.
        assert_eq!(to_graphql_name("us-core"), "us_45_core");
        // ' ' is codepoint 32.
        assert_eq!(to_graphql_name("a b"), "a_32_b");
    }

    #[test]
    fn leading_digit_is_invalid_start() {
        assert_eq!(to_graphql_name("1type"), "_49_type");
    }

    #[test]
    fn field_name_strips_accessor_prefixes() {
        assert_eq!(derive_field_name("getName"), "name");
        assert_eq!(derive_field_name("isActive"), "active");
        assert_eq!(derive_field_name("setValue"), "value");
        assert_eq!(derive_field_name("name"), "name");
        // A bare prefix is not an accessor.
        assert_eq!(derive_field_name("get"), "get");
    }

    #[test]
    fn case_helpers() {
        assert_eq!(lower_first("Name"), "name");
        assert_eq!(upper_first("name"), "Name");
        assert_eq!(lower_first(""), "");
    }
}
