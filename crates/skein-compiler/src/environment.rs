//! Nested namespaces and lexical ranges used during name resolution.
//!
//! A [`Namespace`] maps local names to their fully qualified form and owns
//! its child namespaces; the module namespace tree is built by the declare
//! pass and read by identify and by emission. A [`Range`] is the stack of
//! lexical scopes identify pushes at match, let and object bodies: lookups
//! walk the frames top-down, consulting each frame's in-use namespaces
//! before descending.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

pub type NamespaceRef = Rc<RefCell<Namespace>>;

/// Attempted to declare a name that already exists locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redeclared;

#[derive(Debug, Default)]
pub struct Namespace {
    local: IndexMap<String, String>,
    children: IndexMap<String, NamespaceRef>,
}

impl Namespace {
    pub fn shared() -> NamespaceRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.local.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.local.keys().map(|s| s.as_str())
    }
}

/// Walk `path` below `ns`, creating missing namespaces along the way.
fn ensure_namespace(ns: &NamespaceRef, path: &[String]) -> NamespaceRef {
    let mut cur = ns.clone();
    for segment in path {
        let next = cur
            .borrow_mut()
            .children
            .entry(segment.clone())
            .or_insert_with(Namespace::shared)
            .clone();
        cur = next;
    }
    cur
}

/// Walk `path` below `ns` without creating anything.
pub fn find_namespace(ns: &NamespaceRef, path: &[String]) -> Option<NamespaceRef> {
    let mut cur = ns.clone();
    for segment in path {
        let next = cur.borrow().children.get(segment).cloned()?;
        cur = next;
    }
    Some(cur)
}

/// Declare `name` under `path`, failing when it already exists there.
pub fn declare(
    ns: &NamespaceRef,
    path: &[String],
    name: &str,
    qualified: &str,
) -> Result<(), Redeclared> {
    let target = ensure_namespace(ns, path);
    let mut target = target.borrow_mut();
    if target.local.contains_key(name) {
        return Err(Redeclared);
    }
    target.local.insert(name.to_string(), qualified.to_string());
    Ok(())
}

/// Declare `name` under `path`, silently overwriting an existing entry.
/// Used for object fields, which share names across objects.
pub fn declare_implicit(ns: &NamespaceRef, path: &[String], name: &str, qualified: &str) {
    let target = ensure_namespace(ns, path);
    target
        .borrow_mut()
        .local
        .insert(name.to_string(), qualified.to_string());
}

/// Resolve `path::name` below `ns`.
pub fn lookup(ns: &NamespaceRef, path: &[String], name: &str) -> Option<String> {
    let target = find_namespace(ns, path)?;
    let result = target.borrow().get(name);
    result
}

#[derive(Debug, Default)]
struct Frame {
    locals: IndexMap<String, String>,
    uses: Vec<NamespaceRef>,
}

/// A stack of lexical scopes over a global namespace tree.
///
/// The root frame's first `use` is the global namespace itself, so
/// unqualified combinators declared at the module root resolve everywhere.
#[derive(Debug)]
pub struct Range {
    frames: Vec<Frame>,
}

impl Range {
    pub fn new(globals: NamespaceRef) -> Self {
        Self {
            frames: vec![Frame {
                locals: IndexMap::new(),
                uses: vec![globals],
            }],
        }
    }

    pub fn enter(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn leave(&mut self) {
        // the root frame stays
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind `name` in the current frame.
    pub fn declare(&mut self, name: &str, qualified: &str) -> Result<(), Redeclared> {
        let frame = self.frames.last_mut().expect("range has a root frame");
        if frame.locals.contains_key(name) {
            return Err(Redeclared);
        }
        frame.locals.insert(name.to_string(), qualified.to_string());
        Ok(())
    }

    /// Unqualified lookup: frame locals, then the frame's uses in order,
    /// then the next frame down.
    pub fn get(&self, name: &str) -> Option<String> {
        for frame in self.frames.iter().rev() {
            if let Some(q) = frame.locals.get(name) {
                return Some(q.clone());
            }
            for ns in &frame.uses {
                if let Some(q) = ns.borrow().get(name) {
                    return Some(q);
                }
            }
        }
        None
    }

    /// Qualified lookup consults only the uses of each frame.
    pub fn get_qualified(&self, path: &[String], name: &str) -> Option<String> {
        for frame in self.frames.iter().rev() {
            for ns in &frame.uses {
                if let Some(q) = lookup(ns, path, name) {
                    return Some(q);
                }
            }
        }
        None
    }

    /// Bring the namespace at `path` (below the globals) into scope for the
    /// current frame. Unknown paths are ignored.
    pub fn add_using(&mut self, path: &[String]) {
        let globals = self.globals();
        if let Some(ns) = find_namespace(&globals, path) {
            self.frames
                .last_mut()
                .expect("range has a root frame")
                .uses
                .push(ns);
        }
    }

    fn globals(&self) -> NamespaceRef {
        self.frames[0].uses[0].clone()
    }
}
