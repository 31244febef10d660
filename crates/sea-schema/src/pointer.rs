//! JSON Pointer helpers shared by the walkers and message templating.

/// Split a JSON Pointer into unescaped segments. `""` is the root.
pub(crate) fn segments(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Join segments into a JSON Pointer, escaping `~` and `/`.
pub(crate) fn join(segments: &[String]) -> String {
    let mut out = String::new();
    for s in segments {
        out.push('/');
        out.push_str(&s.replace('~', "~0").replace('/', "~1"));
    }
    out
}
