//! # Path Templates
//!
//! Route paths are authored with `:name` placeholders (`/id/:id`). The
//! rendered document and the request router both expect `{name}`
//! (`/id/{id}`). Uniqueness keys compare paths in the `{name}` form with
//! trailing slashes removed, so `/a/:id/` and `/a/{id}` collide.

use crate::error::CoreError;

/// Rewrite `:name` segments to `{name}`.
///
/// A placeholder name starts after a `:` at the beginning of a segment and
/// runs over ASCII alphanumerics and `_`. A `:` elsewhere in a segment is
/// left untouched.
pub fn to_openapi_template(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 4);
    let mut chars = path.chars().peekable();
    let mut segment_start = true;

    while let Some(c) = chars.next() {
        if c == ':' && segment_start {
            let mut name = String::new();
            while let Some(&n) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    name.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push(':');
            } else {
                out.push('{');
                out.push_str(&name);
                out.push('}');
            }
            segment_start = false;
            continue;
        }
        segment_start = c == '/';
        out.push(c);
    }
    out
}

/// Uniqueness-key form of a path: `{name}` placeholders, duplicate slashes
/// collapsed, no trailing slash except for the root.
pub fn normalize(path: &str) -> String {
    let template = to_openapi_template(path);
    let mut out = String::with_capacity(template.len());
    for segment in template.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Place `path` under `namespace`.
///
/// `join_namespace("/widgets", "/")` is `/widgets` and
/// `join_namespace("/widgets", "/id/:id")` is `/widgets/id/:id`.
pub fn join_namespace(namespace: &str, path: &str) -> String {
    let ns = namespace.trim_end_matches('/');
    let tail = path.trim_start_matches('/');
    match (ns.is_empty(), tail.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{tail}"),
        (false, true) => ensure_leading_slash(ns),
        (false, false) => format!("{}/{tail}", ensure_leading_slash(ns)),
    }
}

/// Check that `path` can be mounted on the request router.
///
/// Every segment of the normalized template is either literal text or a
/// single `{name}` placeholder filling the whole segment. A segment may
/// not start with `:` or `*`, and braces only appear around a placeholder.
pub fn check_template(path: &str) -> Result<(), CoreError> {
    let template = normalize(path);
    let invalid = |reason: &'static str| CoreError::InvalidTemplate {
        path: path.to_string(),
        reason,
    };
    for segment in template.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with(':') {
            return Err(invalid("placeholder has no name"));
        }
        if segment.starts_with('*') {
            return Err(invalid("wildcard segments are not supported"));
        }
        if !segment.contains(['{', '}']) {
            continue;
        }
        let name = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| invalid("a placeholder must fill its whole segment"))?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("placeholder names are letters, digits and `_`"));
        }
    }
    Ok(())
}

/// `true` when `path` has the leading-slash shape routes must declare.
pub fn is_route_path(path: &str) -> bool {
    path.starts_with('/')
}

fn ensure_leading_slash(s: &str) -> String {
    if s.starts_with('/') {
        s.to_string()
    } else {
        format!("/{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn placeholder_syntax_is_rewritten() {
        assert_eq!(to_openapi_template("/id/:id"), "/id/{id}");
        assert_eq!(
            to_openapi_template("/:org/items/:item_id/x"),
            "/{org}/items/{item_id}/x"
        );
        assert_eq!(to_openapi_template("/plain"), "/plain");
    }

    #[test]
    fn colon_inside_segment_is_kept() {
        assert_eq!(to_openapi_template("/a:b"), "/a:b");
        assert_eq!(to_openapi_template("/:"), "/:");
    }

    #[test]
    fn mountable_templates_pass() {
        for path in ["/", "/shop/:id", "/shop/{sku}/detail", "/a:b", "/v1.2/items"] {
            assert!(check_template(path).is_ok(), "{path}");
        }
    }

    #[test]
    fn malformed_templates_are_rejected() {
        let malformed = [
            "/x/:", "/a/{", "/a/}", "/a/*rest", "/a/:id-x", "/a/{}", "/a/{b-c}", "/a/x{id}",
        ];
        for path in malformed {
            assert!(
                matches!(check_template(path), Err(CoreError::InvalidTemplate { .. })),
                "{path}"
            );
        }
    }

    #[test]
    fn normalize_strips_trailing_and_duplicate_slashes() {
        assert_eq!(normalize("/a/:id/"), "/a/{id}");
        assert_eq!(normalize("//a//b"), "/a/b");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn namespace_join() {
        assert_eq!(join_namespace("/widgets", "/"), "/widgets");
        assert_eq!(join_namespace("/widgets/", "/id/:id"), "/widgets/id/:id");
        assert_eq!(join_namespace("widgets", "add"), "/widgets/add");
        assert_eq!(join_namespace("", "/"), "/");
        assert_eq!(join_namespace("/", "/x"), "/x");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(path in "(/[a-z:]{0,6}){0,5}/?") {
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.starts_with('/'));
        }

        #[test]
        fn joined_paths_stay_under_namespace(ns in "[a-z]{1,8}", tail in "(/[a-z]{1,5}){0,3}") {
            let joined = join_namespace(&format!("/{ns}"), &tail);
            let prefix = format!("/{}", ns);
            prop_assert!(joined.starts_with(&prefix));
            prop_assert!(is_route_path(&joined));
        }
    }
}
