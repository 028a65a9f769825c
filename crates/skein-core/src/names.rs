/// Separator between namespace segments in a qualified combinator name.
pub const NAMESPACE_SEP: &str = "::";

/// Join a namespace path and a local name into the canonical qualified form,
/// e.g. `(["a", "b"], "c")` becomes `"a::b::c"`.
pub fn qualify(path: &[String], name: &str) -> String {
    let mut s = String::new();
    for segment in path {
        s.push_str(segment);
        s.push_str(NAMESPACE_SEP);
    }
    s.push_str(name);
    s
}

/// Join namespace segments without a trailing local name.
pub fn qualify_path(path: &[String]) -> String {
    path.join(NAMESPACE_SEP)
}
