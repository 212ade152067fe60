// This module defines the symbol tree produced by the decoder and consumed by the printer.
// A Symbol is a node with a Kind tag, an ordered list of shared children and an optional
// payload that is either an integer index or a text string. Children are reference counted
// so that a subtree recorded in the substitution table can be pushed again by a later
// back-reference without copying. Nodes are assembled as owned values while the decoder is
// building them and are never mutated once wrapped in an Rc; operations that "change" a
// node build a new one. The module also hosts the kind predicates and the small attribute
// enums that are stored in node payloads.

//! Symbol tree data model.

pub mod attrs;
pub mod kind;

use std::fmt;
use std::rc::Rc;

pub use attrs::{Directness, FuncSigParamKind, ValueWitnessKind};
pub use kind::Kind;

pub const STDLIB_NAME: &str = "Swift";
pub const OBJC_MODULE: &str = "__C";
pub const C_MODULE: &str = "__C_Synthesized";
pub const LLDB_EXPRESSIONS_MODULE_PREFIX: &str = "__lldb_expr_";

/// Payload carried by a node. Text and index are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    None,
    Index(u64),
    Text(String),
}

/// A node of the decoded symbol tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    kind: Kind,
    children: Vec<Rc<Symbol>>,
    payload: Payload,
    /// Height of the subtree rooted here; a leaf has depth 1.
    depth: usize,
}

fn subtree_depth(children: &[Rc<Symbol>]) -> usize {
    1 + children.iter().map(|c| c.depth).max().unwrap_or(0)
}

impl Symbol {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            payload: Payload::None,
            depth: 1,
        }
    }

    pub fn with_children(kind: Kind, children: Vec<Rc<Symbol>>) -> Self {
        Self {
            kind,
            depth: subtree_depth(&children),
            children,
            payload: Payload::None,
        }
    }

    pub fn with_child(kind: Kind, child: Rc<Symbol>) -> Self {
        Self::with_children(kind, vec![child])
    }

    pub fn with_text(kind: Kind, text: impl Into<String>) -> Self {
        Self {
            kind,
            children: Vec::new(),
            payload: Payload::Text(text.into()),
            depth: 1,
        }
    }

    pub fn with_index(kind: Kind, index: u64) -> Self {
        Self {
            kind,
            children: Vec::new(),
            payload: Payload::Index(index),
            depth: 1,
        }
    }

    /// `Type(kind(children))`, the shape every decoded type takes on the stack.
    pub fn typed(kind: Kind, children: Vec<Rc<Symbol>>) -> Self {
        Self::with_child(Kind::Type, Rc::new(Self::with_children(kind, children)))
    }

    /// `Type(kind(Swift, name))` for a standard library nominal type.
    pub fn stdlib_type(kind: Kind, name: &str) -> Self {
        Self::typed(
            kind,
            vec![
                Rc::new(Self::with_text(Kind::Module, STDLIB_NAME)),
                Rc::new(Self::with_text(Kind::Identifier, name)),
            ],
        )
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn children(&self) -> &[Rc<Symbol>] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&Rc<Symbol>> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Rc<Symbol>> {
        self.children.first()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes on the longest path from this node down to a leaf.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn index(&self) -> Option<u64> {
        match self.payload {
            Payload::Index(i) => Some(i),
            _ => None,
        }
    }

    pub fn push(&mut self, child: Rc<Symbol>) {
        self.depth = self.depth.max(child.depth + 1);
        self.children.push(child);
    }

    pub fn extend_children(&mut self, children: impl IntoIterator<Item = Rc<Symbol>>) {
        self.children.extend(children);
        self.depth = subtree_depth(&self.children);
    }

    pub fn insert(&mut self, index: usize, child: Rc<Symbol>) {
        let index = index.min(self.children.len());
        self.depth = self.depth.max(child.depth + 1);
        self.children.insert(index, child);
    }

    pub fn set_child(&mut self, index: usize, child: Rc<Symbol>) {
        if let Some(slot) = self.children.get_mut(index) {
            *slot = child;
        }
        self.depth = subtree_depth(&self.children);
    }

    pub fn remove_child(&mut self, index: usize) -> Option<Rc<Symbol>> {
        let removed = (index < self.children.len()).then(|| self.children.remove(index));
        self.depth = subtree_depth(&self.children);
        removed
    }

    pub fn reverse_children(&mut self) {
        self.children.reverse();
    }

    /// Copy of this node under a new kind, with `extra` children appended.
    pub fn renamed(&self, kind: Kind, extra: Vec<Rc<Symbol>>) -> Symbol {
        let mut children = self.children.clone();
        children.extend(extra);
        Symbol {
            kind,
            depth: subtree_depth(&children),
            children,
            payload: self.payload.clone(),
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == Kind::Identifier && self.text() == Some(name)
    }

    pub fn is_swift_module(&self) -> bool {
        self.kind == Kind::Module && self.text() == Some(STDLIB_NAME)
    }

    /// Simple types print without parentheses when followed by a postfix.
    pub fn is_simple_type(&self) -> bool {
        match self.kind {
            Kind::Type => self.first_child().is_some_and(|c| c.is_simple_type()),
            kind => kind.is_simple_type(),
        }
    }

    pub fn need_space_before_type(&self) -> bool {
        match self.kind {
            Kind::Type => self
                .first_child()
                .is_some_and(|c| c.need_space_before_type()),
            Kind::FunctionType
            | Kind::NoEscapeFunctionType
            | Kind::UncurriedFunctionType
            | Kind::DependentGenericType => false,
            _ => true,
        }
    }

    /// Indented one-node-per-line dump of the tree.
    pub fn tree_string(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, depth: usize) {
        use std::fmt::Write as _;
        let _ = write!(out, "{:indent$}{:?}", "", self.kind, indent = depth * 2);
        match &self.payload {
            Payload::None => {}
            Payload::Index(i) => {
                let _ = write!(out, " #{i}");
            }
            Payload::Text(s) => {
                let _ = write!(out, " {s:?}");
            }
        }
        out.push('\n');
        for child in &self.children {
            child.write_tree(out, depth + 1);
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::printer::render(self, crate::RenderOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdlib_type_shape() {
        let int = Symbol::stdlib_type(Kind::Structure, "Int");
        assert_eq!(int.kind(), Kind::Type);
        let nominal = int.first_child().unwrap();
        assert_eq!(nominal.kind(), Kind::Structure);
        assert!(nominal.child(0).unwrap().is_swift_module());
        assert!(nominal.child(1).unwrap().is_identifier("Int"));
    }

    #[test]
    fn test_renamed_keeps_payload_and_appends() {
        let ident = Symbol::with_text(Kind::Identifier, "Foo");
        let module = ident.renamed(Kind::Module, Vec::new());
        assert_eq!(module.kind(), Kind::Module);
        assert_eq!(module.text(), Some("Foo"));
        assert!(module.is_empty());
    }

    #[test]
    fn test_simple_type_looks_through_type_wrapper() {
        let tuple = Symbol::typed(Kind::Tuple, Vec::new());
        assert!(tuple.is_simple_type());
        let func = Symbol::typed(Kind::FunctionType, Vec::new());
        assert!(!func.is_simple_type());
        assert!(!func.need_space_before_type());
    }

    #[test]
    fn test_depth_follows_children() {
        let int = Symbol::stdlib_type(Kind::Structure, "Int");
        assert_eq!(int.depth(), 3);

        let mut list = Symbol::new(Kind::TypeList);
        assert_eq!(list.depth(), 1);
        list.push(Rc::new(int));
        assert_eq!(list.depth(), 4);
        list.push(Rc::new(Symbol::with_text(Kind::Identifier, "x")));
        assert_eq!(list.depth(), 4);
        list.remove_child(0);
        assert_eq!(list.depth(), 2);
    }

    #[test]
    fn test_tree_string_indents_children() {
        let t = Symbol::stdlib_type(Kind::Structure, "Int");
        let dump = t.tree_string();
        assert_eq!(
            dump,
            "Type\n  Structure\n    Module \"Swift\"\n    Identifier \"Int\"\n"
        );
    }
}
