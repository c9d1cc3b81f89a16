//! Read-only snapshot of the routines defined in source files.
//!
//! A file is a tree: the main routine (script or function) at the root and
//! nested sub-routines below it in declaration order. Only the bodies are
//! mutable, since that is where breakpoints are stored.

use super::breakpoints::{StatementList, StatementStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    Script,
    #[default]
    Function,
}

/// Serializable description of a routine and everything nested in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSource {
    pub name: String,
    #[serde(default)]
    pub kind: RoutineKind,
    pub begin_line: u32,
    pub end_line: u32,
    /// Start lines of the statements in this routine's own body.
    #[serde(default)]
    pub statements: Vec<u32>,
    #[serde(default)]
    pub subroutines: Vec<RoutineSource>,
}

impl RoutineSource {
    pub fn function(name: impl Into<String>, begin_line: u32, end_line: u32) -> Self {
        Self {
            name: name.into(),
            kind: RoutineKind::Function,
            begin_line,
            end_line,
            statements: Vec::new(),
            subroutines: Vec::new(),
        }
    }

    pub fn script(name: impl Into<String>, begin_line: u32, end_line: u32) -> Self {
        Self {
            kind: RoutineKind::Script,
            ..Self::function(name, begin_line, end_line)
        }
    }

    pub fn with_statements(mut self, lines: impl IntoIterator<Item = u32>) -> Self {
        self.statements.extend(lines);
        self
    }

    pub fn with_subroutine(mut self, sub: RoutineSource) -> Self {
        self.subroutines.push(sub);
        self
    }
}

/// Index of a routine in its [`RoutineTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutineId(usize);

impl RoutineId {
    /// The main routine of every tree.
    pub const ROOT: RoutineId = RoutineId(0);
}

#[derive(Debug)]
pub struct RoutineNode<S> {
    pub name: String,
    pub kind: RoutineKind,
    pub begin_line: u32,
    pub end_line: u32,
    pub parent: Option<RoutineId>,
    children: Vec<RoutineId>,
    body: S,
}

impl<S> RoutineNode<S> {
    pub fn contains(&self, line: u32) -> bool {
        self.begin_line <= line && line <= self.end_line
    }

    pub fn is_function(&self) -> bool {
        self.kind == RoutineKind::Function
    }

    pub fn body(&self) -> &S {
        &self.body
    }
}

/// Arena holding one file's routines. The root is always at index zero and
/// children are stored in declaration order.
#[derive(Debug)]
pub struct RoutineTree<S = StatementList> {
    nodes: Vec<RoutineNode<S>>,
}

impl<S> RoutineTree<S> {
    /// Build a tree, creating each body from its statement lines.
    pub fn from_source_with<F>(source: RoutineSource, mut make_body: F) -> Self
    where
        F: FnMut(&[u32]) -> S,
    {
        let mut tree = Self { nodes: Vec::new() };
        tree.push(source, None, &mut make_body);
        tree
    }

    fn push<F>(&mut self, source: RoutineSource, parent: Option<RoutineId>, make_body: &mut F) -> RoutineId
    where
        F: FnMut(&[u32]) -> S,
    {
        let id = RoutineId(self.nodes.len());
        self.nodes.push(RoutineNode {
            body: make_body(&source.statements),
            name: source.name,
            kind: source.kind,
            begin_line: source.begin_line,
            end_line: source.end_line,
            parent,
            children: Vec::new(),
        });
        for sub in source.subroutines {
            let child = self.push(sub, Some(id), make_body);
            self.nodes[id.0].children.push(child);
        }
        id
    }

    /// Name of the main routine, which doubles as the file name.
    pub fn name(&self) -> &str {
        &self.nodes[0].name
    }

    pub fn node(&self, id: RoutineId) -> &RoutineNode<S> {
        &self.nodes[id.0]
    }

    pub fn body_mut(&mut self, id: RoutineId) -> &mut S {
        &mut self.nodes[id.0].body
    }

    pub fn children(&self, id: RoutineId) -> &[RoutineId] {
        &self.nodes[id.0].children
    }

    /// All routines nested under `id`, depth first in declaration order.
    pub fn descendants(&self, id: RoutineId) -> Vec<RoutineId> {
        let mut out = Vec::new();
        let mut stack: Vec<RoutineId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// First routine below the root with the given name.
    pub fn find_subroutine(&self, name: &str) -> Option<RoutineId> {
        self.descendants(RoutineId::ROOT)
            .into_iter()
            .find(|&id| self.node(id).name == name)
    }
}

impl<S: StatementStore> RoutineTree<S> {
    pub fn has_breakpoints(&self) -> bool {
        self.nodes.iter().any(|n| n.body.has_breakpoints())
    }
}

impl From<RoutineSource> for RoutineTree<StatementList> {
    fn from(source: RoutineSource) -> Self {
        Self::from_source_with(source, |lines| StatementList::new(lines.iter().copied()))
    }
}

/// Resolves routine names to the trees that define them.
pub trait RoutineDirectory {
    type Store: StatementStore;

    fn resolve(&self, name: &str, class: Option<&str>) -> Option<&RoutineTree<Self::Store>>;

    fn resolve_mut(&mut self, name: &str, class: Option<&str>)
        -> Option<&mut RoutineTree<Self::Store>>;
}

/// Key used in listings: `name` for plain routines, `@class/name` for methods.
pub(crate) fn routine_key(name: &str, class: Option<&str>) -> String {
    match class {
        Some(class) => format!("@{class}/{name}"),
        None => name.to_string(),
    }
}

/// Inverse of [`routine_key`].
pub(crate) fn split_routine_key(key: &str) -> (Option<&str>, &str) {
    key.strip_prefix('@')
        .and_then(|rest| rest.split_once('/'))
        .map_or((None, key), |(class, name)| (Some(class), name))
}

/// `F>helper` names sub-routine `helper` of file `F`.
pub(crate) fn split_subroutine(name: &str) -> (&str, Option<&str>) {
    match name.split_once('>') {
        Some((file, sub)) => (file, Some(sub)),
        None => (name, None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DirectoryKey {
    class: Option<String>,
    name: String,
}

/// A directory backed by routine snapshots held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    routines: BTreeMap<DirectoryKey, RoutineTree>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of [`RoutineSource`] files.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let sources: Vec<RoutineSource> = serde_json::from_str(s)?;
        let mut directory = Self::new();
        for source in sources {
            directory.insert(source);
        }
        Ok(directory)
    }

    pub fn insert(&mut self, source: RoutineSource) {
        self.insert_tree(None, source);
    }

    pub fn insert_method(&mut self, class: impl Into<String>, source: RoutineSource) {
        self.insert_tree(Some(class.into()), source);
    }

    fn insert_tree(&mut self, class: Option<String>, source: RoutineSource) {
        let tree = RoutineTree::from(source);
        let key = DirectoryKey {
            class,
            name: tree.name().to_string(),
        };
        self.routines.insert(key, tree);
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

fn directory_key(name: &str, class: Option<&str>) -> DirectoryKey {
    DirectoryKey {
        class: class.map(str::to_string),
        name: name.to_string(),
    }
}

impl RoutineDirectory for InMemoryDirectory {
    type Store = StatementList;

    fn resolve(&self, name: &str, class: Option<&str>) -> Option<&RoutineTree> {
        self.routines.get(&directory_key(name, class))
    }

    fn resolve_mut(&mut self, name: &str, class: Option<&str>) -> Option<&mut RoutineTree> {
        self.routines.get_mut(&directory_key(name, class))
    }
}
