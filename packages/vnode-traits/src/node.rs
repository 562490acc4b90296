use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::{Context, Error, Reference, Source, SourceOptions};

/// One complete, ordered child set at a point in time. Frozen once created.
pub type Snapshot = Arc<[Node]>;

/// A lazy sequence of children snapshots
pub type SnapshotStream = BoxStream<'static, Result<Snapshot, Error>>;

/// A lazy sequence of resolved nodes
pub type NodeStream = BoxStream<'static, Result<Node, Error>>;

/// A handle to a node's children sequence.
///
/// Children are cold: nothing runs until the stream returned by [`Children::stream`] is polled.
#[derive(Clone)]
pub struct Children(ChildrenInner);

#[derive(Clone)]
enum ChildrenInner {
    /// Restartable. Each call to `stream` starts an independent iteration.
    Factory(Arc<dyn Fn() -> SnapshotStream + Send + Sync>),
    /// Single pass. The first caller takes the stream, everyone after sees it exhausted.
    Live(Arc<Mutex<Option<SnapshotStream>>>),
}

impl Children {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> SnapshotStream + Send + Sync + 'static,
    {
        Self(ChildrenInner::Factory(Arc::new(factory)))
    }

    /// Wrap a stream that can only be consumed once, such as a channel receiver
    pub fn from_stream<S>(snapshots: S) -> Self
    where
        S: Stream<Item = Result<Snapshot, Error>> + Send + 'static,
    {
        Self(ChildrenInner::Live(Arc::new(Mutex::new(Some(
            snapshots.boxed(),
        )))))
    }

    /// A children sequence that finishes without ever yielding
    pub fn empty() -> Self {
        Self::new(|| stream::empty().boxed())
    }

    pub fn stream(&self) -> SnapshotStream {
        match &self.0 {
            ChildrenInner::Factory(factory) => factory(),
            ChildrenInner::Live(slot) => slot
                .lock()
                .ok()
                .and_then(|mut slot| slot.take())
                .unwrap_or_else(|| stream::empty().boxed()),
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ChildrenInner::Factory(_) => f.write_str("Children::Factory"),
            ChildrenInner::Live(_) => f.write_str("Children::Live"),
        }
    }
}

/// The variant specific data of a [`Node`]
#[derive(Debug)]
pub enum NodeKind {
    /// A node built from a source with no more specific shape
    Plain {
        source: Option<Source>,
        options: Option<SourceOptions>,
    },
    /// A terminal node wrapping a string or number
    Scalar {
        value: Reference,
        options: Option<SourceOptions>,
    },
    /// A grouping container. Its children are inlined wherever it appears among siblings.
    Fragment,
    /// An opaque marker only renderers interpret
    Native { source: Option<Node> },
    /// A node waiting for hydration
    Hydratable {
        source: Node,
        options: Option<SourceOptions>,
    },
    /// A node that has been hydrated
    Hydrated,
}

/// An immutable element of the virtual tree.
///
/// A node never changes after it is created. Change is expressed by the next snapshot on a parent's
/// children sequence. `children` being `None` means the node is terminal, which is different from a
/// children sequence that currently yields empty snapshots.
#[derive(Clone)]
pub struct Node {
    reference: Reference,
    kind: Arc<NodeKind>,
    children: Option<Children>,
}

impl Node {
    fn with_kind(reference: Reference, kind: NodeKind) -> Self {
        Self {
            reference,
            kind: Arc::new(kind),
            children: None,
        }
    }

    /// A plain node with no source, options or children
    pub fn new(reference: impl Into<Reference>) -> Self {
        Self::plain(reference, None, None)
    }

    pub fn plain(
        reference: impl Into<Reference>,
        source: Option<Source>,
        options: Option<SourceOptions>,
    ) -> Self {
        Self::with_kind(reference.into(), NodeKind::Plain { source, options })
    }

    pub fn scalar(
        reference: impl Into<Reference>,
        value: Reference,
        options: Option<SourceOptions>,
    ) -> Self {
        Self::with_kind(reference.into(), NodeKind::Scalar { value, options })
    }

    pub fn fragment(children: Children) -> Self {
        Self::with_kind(Reference::Fragment, NodeKind::Fragment).with_children(children)
    }

    pub fn native(reference: impl Into<Reference>, source: Option<Node>) -> Self {
        Self::with_kind(reference.into(), NodeKind::Native { source })
    }

    pub fn hydratable(
        reference: impl Into<Reference>,
        source: Node,
        options: Option<SourceOptions>,
    ) -> Self {
        Self::with_kind(reference.into(), NodeKind::Hydratable { source, options })
    }

    pub fn hydrated(reference: impl Into<Reference>) -> Self {
        Self::with_kind(reference.into(), NodeKind::Hydrated)
    }

    /// Attach a children sequence, consuming the node being built
    pub fn with_children(mut self, children: Children) -> Self {
        self.children = Some(children);
        self
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> Option<&Children> {
        self.children.as_ref()
    }

    /// Start iterating the children sequence, if there is one
    pub fn children_stream(&self) -> Option<SnapshotStream> {
        self.children.as_ref().map(Children::stream)
    }

    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_fragment(&self) -> bool {
        matches!(*self.kind, NodeKind::Fragment)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(*self.kind, NodeKind::Scalar { .. })
    }

    pub fn is_native(&self) -> bool {
        matches!(*self.kind, NodeKind::Native { .. })
    }

    pub fn is_hydrated(&self) -> bool {
        matches!(*self.kind, NodeKind::Hydrated)
    }

    /// Whether `context` may hydrate this node.
    ///
    /// Holds for hydratable nodes without options, or whose options were created for `context`.
    pub fn is_hydratable(&self, context: &Arc<dyn Context>) -> bool {
        match &*self.kind {
            NodeKind::Hydratable { options, .. } => options
                .as_ref()
                .is_none_or(|options| options.is_for(context)),
            _ => false,
        }
    }

    /// The value of a scalar node
    pub fn scalar_value(&self) -> Option<&Reference> {
        match &*self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The options this node was resolved with, if it kept them
    pub fn options(&self) -> Option<&SourceOptions> {
        match &*self.kind {
            NodeKind::Plain { options, .. }
            | NodeKind::Scalar { options, .. }
            | NodeKind::Hydratable { options, .. } => options.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("reference", &self.reference)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .finish()
    }
}

#[test]
fn test_fragment_carries_marker() {
    let fragment = Node::fragment(Children::empty());
    assert!(fragment.is_fragment());
    assert!(fragment.reference().is_fragment());
    assert!(fragment.has_children());
}

#[test]
fn test_terminal_nodes_have_no_children() {
    let scalar = Node::scalar("a", Reference::from("a"), None);
    assert!(scalar.is_scalar());
    assert!(scalar.children_stream().is_none());
    assert_eq!(scalar.scalar_value(), Some(&Reference::from("a")));
}

#[test]
fn test_native_nodes() {
    let native = Node::native("canvas", Some(Node::new("src")));
    assert!(native.is_native());
    assert!(!native.is_fragment());
    assert!(!native.has_children());
    assert!(matches!(
        native.kind(),
        NodeKind::Native { source: Some(source) } if source.reference() == &Reference::from("src")
    ));

    assert!(Node::native("canvas", None).is_native());
    assert!(!Node::new("plain").is_native());
}
