//! The boundary between the vnode engine and the embedder

use futures_util::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;

use crate::{Error, Node, NodeStream, Reference, Source};

/// How deep sources may nest before resolution fails with [`Error::DepthExceeded`]
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Hooks an embedder provides to customise how sources become nodes and how nodes are hydrated.
///
/// Every method has a no-op default.
pub trait Context: Send + Sync + 'static {
    /// Replace element creation entirely. Returning `Some` bypasses every built-in rule.
    fn create_element(&self, _source: &Source, _options: &SourceOptions) -> Option<NodeStream> {
        None
    }

    /// The hydration hook, if this context can hydrate at all
    fn hydrator(&self) -> Option<&dyn Hydrator> {
        None
    }

    /// Register a standalone node under its reference
    fn set(&self, _reference: Reference, _node: Node) -> BoxFuture<'static, Result<(), Error>> {
        future::ready(Ok(())).boxed()
    }
}

/// Attaches runtime behaviour to a resolved node.
///
/// A hydrator that accepts a node owns that node's subtree; the walker does not descend into it.
pub trait Hydrator: Send + Sync {
    fn hydrate(&self, node: Node, tree: Option<Arc<Tree>>) -> BoxFuture<'static, Result<(), Error>>;
}

/// A context that does nothing
pub struct DummyContext;
impl Context for DummyContext {}

/// Whether two handles point at the same context instance
pub fn same_context(a: &Arc<dyn Context>, b: &Arc<dyn Context>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// The configuration a source is resolved with
#[derive(Clone)]
pub struct SourceOptions {
    pub context: Arc<dyn Context>,
    /// The reference assigned to nodes built directly from the source
    pub reference: Reference,
    pub max_depth: usize,
}

impl SourceOptions {
    pub fn new(context: Arc<dyn Context>, reference: impl Into<Reference>) -> Self {
        Self {
            context,
            reference: reference.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<Reference>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether these options were created for `context`
    pub fn is_for(&self, context: &Arc<dyn Context>) -> bool {
        same_context(&self.context, context)
    }
}

impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceOptions")
            .field("reference", &self.reference)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Where a node sits in the tree being hydrated.
///
/// Only references are recorded; the nodes themselves belong to the snapshot being walked.
#[derive(Debug, Clone)]
pub struct Tree {
    pub reference: Reference,
    /// References of every child in the current snapshot, in order
    pub children: Arc<[Reference]>,
    pub parent: Option<Arc<Tree>>,
}

impl Tree {
    pub fn new(
        reference: Reference,
        children: Arc<[Reference]>,
        parent: Option<Arc<Tree>>,
    ) -> Self {
        Self {
            reference,
            children,
            parent,
        }
    }

    pub fn ancestors(&self) -> TreeAncestors<'_> {
        TreeAncestors {
            current: self.parent.as_deref(),
        }
    }

    /// Number of ancestors above this frame
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }
}

#[derive(Clone)]
/// An ancestor traverser for a [`Tree`] frame
pub struct TreeAncestors<'a> {
    current: Option<&'a Tree>,
}

impl<'a> Iterator for TreeAncestors<'a> {
    type Item = &'a Tree;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = current.parent.as_deref();
        Some(current)
    }
}

#[test]
fn test_same_context() {
    let a: Arc<dyn Context> = Arc::new(DummyContext);
    let b: Arc<dyn Context> = Arc::new(DummyContext);
    let options = SourceOptions::new(a.clone(), "root");

    assert!(options.is_for(&a));
    assert!(!options.is_for(&b));
}

#[test]
fn test_tree_ancestors() {
    let root = Arc::new(Tree::new("root".into(), Arc::from(vec!["a".into()]), None));
    let a = Arc::new(Tree::new("a".into(), Arc::from(vec![]), Some(root)));
    let leaf = Tree::new("b".into(), Arc::from(vec![]), Some(a));

    let references: Vec<_> = leaf.ancestors().map(|tree| tree.reference.clone()).collect();
    assert_eq!(references, vec![Reference::from("a"), Reference::from("root")]);
    assert_eq!(leaf.depth(), 2);
}
