//! Synthetic member naming
//!
//! Members generated for teams and roles share the `_weave$` prefix. The
//! patterns here are the only place that knows their shape; member pruning,
//! the synthetic-argument rule and surrogate reuse all go through them.

/// Prefix of every generated member name
pub const SYNTHETIC_PREFIX: &str = "_weave$";

const GETTER_PREFIX: &str = "_weave$get$";
const SETTER_PREFIX: &str = "_weave$set$";
const BASE_SUFFIX: &str = "$base";
const PRECEDENCE_PREFIX: &str = "_weave$prec$";

/// Name of the base-call surrogate for a callin method
pub fn surrogate_name(method: &str) -> String {
    format!("{}{}{}", SYNTHETIC_PREFIX, method, BASE_SUFFIX)
}

/// Callin method name a surrogate belongs to
pub fn surrogate_target(name: &str) -> Option<&str> {
    name.strip_prefix(SYNTHETIC_PREFIX)?
        .strip_suffix(BASE_SUFFIX)
        .filter(|m| !m.is_empty() && !m.contains('$'))
}

/// Whether `name` is a base-call surrogate
pub fn is_surrogate_name(name: &str) -> bool {
    surrogate_target(name).is_some()
}

/// Read accessor generated for a callout-to-field
pub fn getter_name(field: &str) -> String {
    format!("{}{}", GETTER_PREFIX, field)
}

/// Write accessor generated for a callout-to-field
pub fn setter_name(field: &str) -> String {
    format!("{}{}", SETTER_PREFIX, field)
}

/// Whether `name` is a callout-to-field accessor
pub fn is_accessor_name(name: &str) -> bool {
    let field = name
        .strip_prefix(GETTER_PREFIX)
        .or_else(|| name.strip_prefix(SETTER_PREFIX));
    matches!(field, Some(f) if !f.is_empty())
}

/// Wrapper method generated for a precedence declaration
pub fn precedence_wrapper_name(index: usize) -> String {
    format!("{}{}", PRECEDENCE_PREFIX, index)
}

/// Whether `name` is a precedence wrapper
pub fn is_precedence_wrapper_name(name: &str) -> bool {
    name.strip_prefix(PRECEDENCE_PREFIX)
        .map(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Whether `name` was produced by earlier team/role compilation
pub fn is_synthetic_name(name: &str) -> bool {
    name.starts_with(SYNTHETIC_PREFIX)
}

/// Simple name of a qualified name (`p.q.Outer$Inner` -> `Inner`)
pub fn simple_name(qualified: &str) -> &str {
    qualified
        .rsplit(|c| c == '.' || c == '$')
        .next()
        .unwrap_or(qualified)
}

/// Package part of a top-level qualified name (`p.q.T` -> `p.q`)
pub fn package_of(qualified: &str) -> &str {
    let top = qualified.split('$').next().unwrap_or(qualified);
    match top.rfind('.') {
        Some(i) => &top[..i],
        None => "",
    }
}

/// Join a package and a simple name
pub fn qualify(package: &str, simple: &str) -> String {
    if package.is_empty() {
        simple.to_string()
    } else {
        format!("{}.{}", package, simple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surrogate_names() {
        let name = surrogate_name("wrap");
        assert_eq!(name, "_weave$wrap$base");
        assert_eq!(surrogate_target(&name), Some("wrap"));
        assert!(!is_surrogate_name("wrap$base"));
        assert!(!is_surrogate_name("_weave$$base"));
    }

    #[test]
    fn test_accessor_names() {
        assert!(is_accessor_name(&getter_name("count")));
        assert!(is_accessor_name(&setter_name("count")));
        assert!(!is_accessor_name("_weave$get$"));
        assert!(!is_accessor_name("getCount"));
    }

    #[test]
    fn test_precedence_wrapper_names() {
        assert!(is_precedence_wrapper_name(&precedence_wrapper_name(3)));
        assert!(!is_precedence_wrapper_name("_weave$prec$x"));
    }

    #[test]
    fn test_qualified_name_parts() {
        assert_eq!(simple_name("p.q.Outer$Inner"), "Inner");
        assert_eq!(simple_name("T"), "T");
        assert_eq!(package_of("p.q.Outer$Inner"), "p.q");
        assert_eq!(package_of("T"), "");
        assert_eq!(qualify("", "T"), "T");
        assert_eq!(qualify("p", "T"), "p.T");
    }
}
