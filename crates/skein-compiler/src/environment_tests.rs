use crate::environment::{Namespace, Range, declare, declare_implicit, find_namespace, lookup};

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

#[test]
fn declare_rejects_duplicates_locally() {
    let ns = Namespace::shared();
    declare(&ns, &path(&["A"]), "x", "A::x").unwrap();
    assert!(declare(&ns, &path(&["A"]), "x", "A::x").is_err());
    // the same name in a sibling namespace is fine
    declare(&ns, &path(&["B"]), "x", "B::x").unwrap();
}

#[test]
fn declare_implicit_overwrites() {
    let ns = Namespace::shared();
    declare_implicit(&ns, &path(&["Fields"]), "get", "Fields::get");
    declare_implicit(&ns, &path(&["Fields"]), "get", "Fields::get");
    assert_eq!(
        lookup(&ns, &path(&["Fields"]), "get").as_deref(),
        Some("Fields::get")
    );
}

#[test]
fn lookup_walks_the_namespace_tree() {
    let ns = Namespace::shared();
    declare(&ns, &path(&["A", "B"]), "x", "A::B::x").unwrap();
    assert_eq!(lookup(&ns, &path(&["A", "B"]), "x").as_deref(), Some("A::B::x"));
    assert_eq!(lookup(&ns, &path(&["A"]), "x"), None);
    assert!(find_namespace(&ns, &path(&["A", "B"])).is_some());
    assert!(find_namespace(&ns, &path(&["C"])).is_none());
}

#[test]
fn range_prefers_inner_frames() {
    let globals = Namespace::shared();
    let mut range = Range::new(globals);
    range.declare("X", "V_0").unwrap();
    range.enter();
    range.declare("X", "V_1").unwrap();
    assert_eq!(range.get("X").as_deref(), Some("V_1"));
    range.leave();
    assert_eq!(range.get("X").as_deref(), Some("V_0"));
}

#[test]
fn range_rejects_duplicate_bindings_in_one_frame() {
    let globals = Namespace::shared();
    let mut range = Range::new(globals);
    range.declare("X", "V_0").unwrap();
    assert!(range.declare("X", "V_1").is_err());
}

#[test]
fn unqualified_lookup_falls_through_to_uses() {
    let globals = Namespace::shared();
    declare(&globals, &[], "f", "f").unwrap();
    declare(&globals, &path(&["System"]), "true", "System::true").unwrap();

    let mut range = Range::new(globals);
    // globals are always in scope
    assert_eq!(range.get("f").as_deref(), Some("f"));
    // System only after a using
    assert_eq!(range.get("true"), None);
    range.add_using(&path(&["System"]));
    assert_eq!(range.get("true").as_deref(), Some("System::true"));
}

#[test]
fn qualified_lookup_consults_uses_only() {
    let globals = Namespace::shared();
    declare(&globals, &path(&["A"]), "x", "A::x").unwrap();
    let mut range = Range::new(globals);
    range.declare("x", "V_0").unwrap();
    // locals never answer qualified lookups
    assert_eq!(range.get_qualified(&path(&["A"]), "x").as_deref(), Some("A::x"));
    assert_eq!(range.get_qualified(&path(&["B"]), "x"), None);
}

#[test]
fn uses_are_scoped_to_their_frame() {
    let globals = Namespace::shared();
    declare(&globals, &path(&["A"]), "x", "A::x").unwrap();
    let mut range = Range::new(globals);
    range.enter();
    range.add_using(&path(&["A"]));
    assert_eq!(range.get("x").as_deref(), Some("A::x"));
    range.leave();
    assert_eq!(range.get("x"), None);
}

#[test]
fn add_using_ignores_unknown_namespaces() {
    let globals = Namespace::shared();
    let mut range = Range::new(globals);
    range.add_using(&path(&["Nowhere"]));
    assert_eq!(range.get("x"), None);
}
