//! `errorMessage` resolution.
//!
//! A declaration is attached to the data location of the schema node that
//! carries it. Errors at or below that location are matched against the
//! declaration, innermost declaration first:
//!
//! - a string replaces every error at or below the node;
//! - `required` (string, or map of property to message) replaces
//!   `required` errors at the node;
//! - other keyword-keyed strings replace that keyword's errors at the node;
//! - `properties` (map of child to message) replaces errors at or below the
//!   named child;
//! - `_` replaces anything else at or below the node.
//!
//! Placeholders: `${/pointer}` reads the validated data from the root,
//! `${N}` and `${N/pointer}` read relative to the node N levels above the
//! declaring node.

use serde_json::Value;

use sea_core::template;

use crate::error::FieldError;
use crate::pointer;

pub(crate) struct Declaration<'s> {
    pub(crate) path: Vec<String>,
    pub(crate) spec: &'s Value,
    pub(crate) order: usize,
}

pub(crate) struct Resolved {
    pub(crate) error: FieldError,
    pub(crate) templated: bool,
}

pub(crate) fn apply(
    mut declarations: Vec<Declaration<'_>>,
    errors: Vec<FieldError>,
    root: &Value,
) -> Vec<Resolved> {
    declarations.sort_by(|a, b| {
        b.path
            .len()
            .cmp(&a.path.len())
            .then(b.order.cmp(&a.order))
    });

    let mut out: Vec<Resolved> = Vec::new();
    for error in errors {
        let segments = pointer::segments(&error.instance_path);
        let matched = declarations
            .iter()
            .find_map(|d| select(d, &segments, &error).map(|t| (t, d)));

        let resolved = match matched {
            Some((template, declaration)) => Resolved {
                error: FieldError {
                    message: render(template, &declaration.path, root),
                    ..error
                },
                templated: true,
            },
            None => Resolved {
                error,
                templated: false,
            },
        };

        let duplicate = out.iter().any(|r| {
            r.error.instance_path == resolved.error.instance_path
                && r.error.message == resolved.error.message
        });
        if !duplicate {
            out.push(resolved);
        }
    }
    out
}

fn select<'s>(
    declaration: &Declaration<'s>,
    segments: &[String],
    error: &FieldError,
) -> Option<&'s str> {
    if !segments.starts_with(&declaration.path) {
        return None;
    }
    let map = match declaration.spec {
        Value::String(s) => return Some(s.as_str()),
        Value::Object(map) => map,
        _ => return None,
    };

    let depth = declaration.path.len();
    if segments.len() == depth {
        if error.keyword == "required" {
            match map.get("required") {
                Some(Value::String(s)) => return Some(s.as_str()),
                Some(Value::Object(per_property)) => {
                    if let Some(msg) = error
                        .property
                        .as_ref()
                        .and_then(|p| per_property.get(p))
                        .and_then(Value::as_str)
                    {
                        return Some(msg);
                    }
                }
                _ => {}
            }
        } else if !matches!(error.keyword.as_str(), "properties" | "items" | "_") {
            if let Some(msg) = map.get(&error.keyword).and_then(Value::as_str) {
                return Some(msg);
            }
        }
    } else if let Some(msg) = map
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| props.get(&segments[depth]))
        .and_then(Value::as_str)
    {
        return Some(msg);
    }

    map.get("_").and_then(Value::as_str)
}

fn render(template: &str, base: &[String], root: &Value) -> String {
    template::render(template, |key| {
        lookup(key, base, root).map(template::display_value)
    })
}

fn lookup<'v>(key: &str, base: &[String], root: &'v Value) -> Option<&'v Value> {
    if key.starts_with('/') {
        return root.pointer(key);
    }
    let (levels, rest) = match key.split_once('/') {
        Some((n, rest)) => (n, format!("/{rest}")),
        None => (key, String::new()),
    };
    let levels: usize = levels.parse().ok()?;
    let keep = base.len().checked_sub(levels)?;
    let pointer = format!("{}{rest}", pointer::join(&base[..keep]));
    root.pointer(&pointer)
}
