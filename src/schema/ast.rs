//! In-memory schema tree.
//!
//! Nodes live in one arena owned by the [`Document`]; children are held
//! by id and every non-root node keeps a non-owning parent id for upward
//! traversal during scope resolution. The tree is acyclic by
//! construction: ids are only ever appended and a node is attached to at
//! most one parent.

pub type NodeId = usize;

/// Field payload: declared type, wire number and modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldData {
    pub type_name: String,
    pub number: i64,
    pub repeated: bool,
    pub optional: bool,
}

/// Rpc payload: request and response message names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcData {
    pub request: String,
    pub response: String,
}

/// Closed set of definition node variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Message,
    Field(FieldData),
    Service,
    Rpc(RpcData),
    Enum,
    EnumValue(i64),
}

/// One definition node. `comment` holds the block lines verbatim (without
/// the leading `//`); `inline_comment` is the trailing comment on the
/// declaration line, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub comment: Vec<String>,
    pub inline_comment: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            comment: Vec::new(),
            inline_comment: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, NodeKind::Message)
    }

    pub fn field(&self) -> Option<&FieldData> {
        match &self.kind {
            NodeKind::Field(data) => Some(data),
            _ => None,
        }
    }

    pub fn rpc(&self) -> Option<&RpcData> {
        match &self.kind {
            NodeKind::Rpc(data) => Some(data),
            _ => None,
        }
    }
}

/// A parsed schema document: header statements plus the definition tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Comment lines preceding the header statements (license banners).
    pub head_comments: Vec<String>,
    pub syntax: Option<String>,
    pub package: Option<String>,
    pub imports: Vec<String>,
    /// `option name = "value";` statements in source order.
    pub options: Vec<(String, String)>,
    nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node, returning its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Attach a previously allocated node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Attach a previously allocated node at the document top level.
    pub fn add_root(&mut self, id: NodeId) {
        self.nodes[id].parent = None;
        self.roots.push(id);
    }

    /// Package name normalized for use as an identifier (`a.b` -> `a_b`).
    pub fn package_ident(&self) -> String {
        self.package.as_deref().unwrap_or_default().replace('.', "_")
    }

    /// Value of a named `option`, if declared.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Ids of the ancestor chain of `id`, root first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes[id].parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.nodes[parent].parent;
        }
        chain.reverse();
        chain
    }

    /// Pre-order walk over the whole tree.
    pub fn walk(&self, f: &mut impl FnMut(NodeId, &Node)) {
        fn visit(doc: &Document, id: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
            f(id, doc.node(id));
            for &child in &doc.node(id).children {
                visit(doc, child, f);
            }
        }
        for &root in &self.roots {
            visit(self, root, f);
        }
    }

    /// Ids of every node in pre-order. Snapshot for mutation passes.
    pub fn all_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        self.walk(&mut |id, _| ids.push(id));
        ids
    }

    /// Top-level node ids of a given predicate.
    pub fn roots_where(&self, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.roots
            .iter()
            .copied()
            .filter(|&id| pred(self.node(id)))
            .collect()
    }
}
