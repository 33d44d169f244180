//! Parent-linked IR tree stored in an arena.
//!
//! Nodes are addressed by [`NodeId`] and never freed: a detached subtree
//! simply stops being reachable from the root. Parent and child links are
//! indices, so every structural edit (detach, reparent, insert-above) is
//! O(number of siblings) with no ownership juggling.

use smallvec::SmallVec;

use garnet_types::WType;

use crate::{NodeId, Span, Template};

/// One node of the intermediate tree.
#[derive(Clone, Debug)]
pub struct IrNode {
    pub template: Template,
    pub wtype: WType,
    pub span: Span,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    label: Option<u32>,
}

/// Arena of IR nodes with a single root.
#[derive(Clone, Debug)]
pub struct IrTree {
    nodes: Vec<IrNode>,
    next_label: u32,
}

impl Default for IrTree {
    fn default() -> Self {
        Self::new()
    }
}

impl IrTree {
    /// The root node, created with the tree.
    pub const ROOT: NodeId = NodeId::new(0);

    pub fn new() -> Self {
        let root = IrNode {
            template: Template::Root,
            wtype: WType::Blank,
            span: Span::DUMMY,
            parent: None,
            children: SmallVec::new(),
            label: None,
        };
        IrTree {
            nodes: vec![root],
            next_label: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Number of nodes ever allocated, reachable or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].children.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &IrNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn template(&self, id: NodeId) -> &Template {
        &self.nodes[id.index()].template
    }

    #[inline]
    pub fn set_template(&mut self, id: NodeId, template: Template) {
        self.nodes[id.index()].template = template;
    }

    #[inline]
    pub fn wtype(&self, id: NodeId) -> WType {
        self.nodes[id.index()].wtype
    }

    #[inline]
    pub fn set_wtype(&mut self, id: NodeId, wtype: WType) {
        self.nodes[id.index()].wtype = wtype;
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    #[inline]
    pub fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.index()].span = span;
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Branch label of a block or loop node.
    #[inline]
    pub fn label(&self, id: NodeId) -> Option<u32> {
        self.nodes[id.index()].label
    }

    /// Allocate a detached node. Blocks and loops draw a fresh label.
    pub fn create(&mut self, template: Template, wtype: WType) -> NodeId {
        let label = if template.takes_label() {
            let label = self.next_label;
            self.next_label += 1;
            tracing::trace!(label, ?template, "allocated branch label");
            Some(label)
        } else {
            None
        };
        let id = NodeId::from_len(self.nodes.len());
        self.nodes.push(IrNode {
            template,
            wtype,
            span: Span::DUMMY,
            parent: None,
            children: SmallVec::new(),
            label,
        });
        id
    }

    /// Allocate a node and append it as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, template: Template, wtype: WType) -> NodeId {
        let id = self.create(template, wtype);
        self.attach_last(parent, id);
        id
    }

    /// Move `node` to the end of `parent`'s children.
    ///
    /// Idempotent: a node already under `parent` keeps its position.
    pub fn reparent(&mut self, node: NodeId, parent: NodeId) {
        if self.parent(node) == Some(parent) {
            return;
        }
        debug_assert!(
            !self.is_within(parent, node),
            "reparenting {node:?} under its own descendant {parent:?}"
        );
        self.detach(node);
        self.attach_last(parent, node);
    }

    /// Move `node` to the front of `parent`'s children.
    pub fn prepend(&mut self, parent: NodeId, node: NodeId) {
        self.detach(node);
        self.nodes[node.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(0, node);
    }

    /// Unlink `node` from its parent. The subtree below it stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != node);
        }
    }

    /// Detach every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.index()].children);
        for child in children {
            self.nodes[child.index()].parent = None;
        }
    }

    /// Splice a new node between `node` and its parent, keeping `node`'s
    /// position among its siblings. Returns the new node.
    pub fn insert_above(&mut self, node: NodeId, template: Template, wtype: WType) -> NodeId {
        let above = self.create(template, wtype);
        self.nodes[above.index()].span = self.span(node);
        if let Some(parent) = self.parent(node) {
            let siblings = &mut self.nodes[parent.index()].children;
            if let Some(slot) = siblings.iter_mut().find(|c| **c == node) {
                *slot = above;
            }
            self.nodes[above.index()].parent = Some(parent);
        }
        self.nodes[node.index()].parent = Some(above);
        self.nodes[above.index()].children.push(node);
        above
    }

    /// Strict ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(node),
        }
    }

    /// Nearest strict ancestor whose template satisfies `pred`.
    pub fn find_ancestor(
        &self,
        node: NodeId,
        mut pred: impl FnMut(&Template) -> bool,
    ) -> Option<NodeId> {
        self.ancestors(node).find(|&a| pred(self.template(a)))
    }

    /// `true` if `node` is `ancestor` or lies below it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Number of nodes in the subtree rooted at `node`, itself included.
    pub fn subtree_len(&self, node: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            count += 1;
            stack.extend_from_slice(self.children(n));
        }
        count
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    tree: &'a IrTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

impl IrTree {
    fn attach_last(&mut self, parent: NodeId, node: NodeId) {
        self.nodes[node.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(node);
    }
}
