//! The intermediate tree a schema is read into before it becomes PSM.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Nodes are never deallocated while a
//! [`PDiagram`] is alive; detached subtrees are flagged as removed instead.

use indexmap::IndexMap;
use xcase_psm::{Multiplicity, SimpleDataType};
use xcase_xsd::QName;

pub type NodeId = usize;

/// What a structural-representative placeholder points to, before resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SrTarget {
    /// `<xs:element type="T"/>` naming a global complex type
    Type(QName),
    /// `<xs:element ref="e"/>`
    ElementRef(QName),
    /// `<xs:group ref="g"/>`
    Group(QName),
}

/// The type of an attribute, already checked against the schema
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PType {
    Builtin(String),
    /// A simple type of the schema, by name
    Simple(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PAttribute {
    pub name: String,
    pub alias: Option<String>,
    pub type_: Option<PType>,
    pub multiplicity: Multiplicity,
    pub default: Option<String>,
}

impl PAttribute {
    pub fn new(name: impl Into<String>, type_: Option<PType>, multiplicity: Multiplicity) -> Self {
        Self {
            name: name.into(),
            alias: None,
            type_,
            multiplicity,
            default: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PClass {
    pub name: String,
    pub element_label: Option<String>,
    /// Multiplicity of the association leading to this class; ignored for roots
    pub multiplicity: Multiplicity,
    pub is_abstract: bool,
    /// Base type of a `complexContent` extension, until resolved into `general`
    pub extension_of: Option<QName>,
    pub general: Option<NodeId>,
    pub sr_of: Option<SrTarget>,
    /// The class this placeholder structurally represents, once resolved
    pub represents: Option<NodeId>,
    pub attributes: Vec<PAttribute>,
    pub attribute_group_refs: Vec<QName>,
    pub documentation: Vec<String>,
    /// Stand-in left behind when an extending class was moved to the roots
    pub created_by_extension: bool,
}

impl PClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn labelled(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            element_label: Some(label.into()),
            ..Self::new(name)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PNodeKind {
    Class(PClass),
    ContentContainer { name: String },
    ContentChoice,
    AttributeContainer { attributes: Vec<PAttribute> },
    /// A sequence that is flattened into its parent
    Dummy,
    Comment(String),
}

#[derive(Clone, Debug)]
pub struct PNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: PNodeKind,
    pub removed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PDiagram {
    nodes: Vec<PNode>,
    pub roots: Vec<NodeId>,
    /// Root classes of global complex types
    pub type_roots: IndexMap<QName, NodeId>,
    /// Classes carrying the label of a global element
    pub element_nodes: IndexMap<QName, NodeId>,
    /// Root classes of global model groups
    pub group_roots: IndexMap<QName, NodeId>,
    pub simple_types: Vec<SimpleDataType>,
    pub classes_count: usize,
}

impl PDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> &PNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PNode {
        &mut self.nodes[id]
    }

    pub fn class(&self, id: NodeId) -> Option<&PClass> {
        match &self.nodes[id].kind {
            PNodeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn class_mut(&mut self, id: NodeId) -> Option<&mut PClass> {
        match &mut self.nodes[id].kind {
            PNodeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Creates a node below `parent`, or a new root.
    pub fn add_node(&mut self, parent: Option<NodeId>, kind: PNodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(PNode {
            parent,
            children: Vec::new(),
            kind,
            removed: false,
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Live class nodes, in creation order.
    pub fn class_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|id| !self.nodes[*id].removed && self.class(*id).is_some())
            .collect()
    }

    /// Live nodes of any kind, in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|id| !self.nodes[*id].removed)
            .collect()
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(parent) => &mut self.nodes[parent].children,
            None => &mut self.roots,
        }
    }

    /// Unlinks `id` from its parent (or from the roots); returns its former position.
    pub fn detach(&mut self, id: NodeId) -> Option<(Option<NodeId>, usize)> {
        let parent = self.nodes[id].parent.take();
        let siblings = self.siblings_mut(parent);
        let index = siblings.iter().position(|sibling| *sibling == id)?;
        siblings.remove(index);
        Some((parent, index))
    }

    /// Links a detached node at `index` below `parent`, or among the roots.
    pub fn attach(&mut self, id: NodeId, parent: Option<NodeId>, index: usize) {
        self.nodes[id].parent = parent;
        let siblings = self.siblings_mut(parent);
        let index = index.min(siblings.len());
        siblings.insert(index, id);
    }

    /// Puts `replacement` where `id` is and detaches `id`. Returns `false` if `id` is not linked.
    pub fn replace(&mut self, id: NodeId, replacement: NodeId) -> bool {
        self.detach(replacement);
        match self.detach(id) {
            Some((parent, index)) => {
                self.attach(replacement, parent, index);
                true
            }
            None => false,
        }
    }

    /// Detaches `id` and flags its whole subtree as removed.
    pub fn remove_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.nodes[current].removed = true;
            stack.extend(self.nodes[current].children.iter().copied());
        }
    }

    /// Replaces `id` by its children, in order.
    pub fn splice_children(&mut self, id: NodeId) -> bool {
        let Some((parent, index)) = self.detach(id) else {
            return false;
        };
        let children = std::mem::take(&mut self.nodes[id].children);
        for (offset, child) in children.into_iter().enumerate() {
            self.attach(child, parent, index + offset);
        }
        self.nodes[id].removed = true;
        true
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id].parent;
        }
        false
    }

    /// The subtree below `id` in pre-order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<_> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.nodes[current].children.iter().rev().copied());
        }
        result
    }

    /// Classes whose placeholder link points at `target`.
    pub fn representatives_of(&self, target: NodeId) -> Vec<NodeId> {
        self.class_ids()
            .into_iter()
            .filter(|id| self.class(*id).is_some_and(|c| c.represents == Some(target)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (PDiagram, NodeId, NodeId, NodeId) {
        let mut diagram = PDiagram::new();
        let root = diagram.add_node(None, PNodeKind::Class(PClass::new("Root")));
        let dummy = diagram.add_node(Some(root), PNodeKind::Dummy);
        let leaf = diagram.add_node(Some(dummy), PNodeKind::Class(PClass::new("Leaf")));
        (diagram, root, dummy, leaf)
    }

    #[test]
    fn splicing_keeps_child_order() {
        let (mut diagram, root, dummy, leaf) = tree();
        let other = diagram.add_node(Some(dummy), PNodeKind::ContentChoice);
        let last = diagram.add_node(Some(root), PNodeKind::ContentChoice);

        assert!(diagram.splice_children(dummy));
        assert_eq!(diagram.children(root), &[leaf, other, last]);
        assert_eq!(diagram.node(leaf).parent, Some(root));
        assert!(diagram.node(dummy).removed);
    }

    #[test]
    fn replace_moves_a_root_into_place() {
        let (mut diagram, root, dummy, leaf) = tree();
        let other_root = diagram.add_node(None, PNodeKind::Class(PClass::new("Other")));

        assert!(diagram.replace(leaf, other_root));
        assert_eq!(diagram.roots, vec![root]);
        assert_eq!(diagram.children(dummy), &[other_root]);
        assert_eq!(diagram.node(leaf).parent, None);
        assert!(diagram.is_ancestor(root, other_root));
    }

    #[test]
    fn removed_subtrees_are_not_listed() {
        let (mut diagram, root, dummy, leaf) = tree();
        diagram.remove_subtree(dummy);
        assert_eq!(diagram.class_ids(), vec![root]);
        assert!(diagram.node(leaf).removed);
        assert!(diagram.descendants(root).is_empty());
    }
}
