use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{BoxStream, Stream, StreamExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::{Error, MarshalledNode, Node, Reference, SourceOptions};

/// A function component. Called with the resolution options, returns the next source to resolve.
pub type Component = Arc<dyn Fn(&SourceOptions) -> Result<Source, Error> + Send + Sync>;

/// A value that is only available later. Each call starts a fresh future.
pub type Deferred = Arc<dyn Fn() -> BoxFuture<'static, Result<Source, Error>> + Send + Sync>;

pub type SourceStream = BoxStream<'static, Result<Source, Error>>;

/// Starts a fresh stream of sources each time it is called
pub type SourceStreamFactory = Arc<dyn Fn() -> SourceStream + Send + Sync>;

/// Anything that can be turned into nodes.
///
/// Every variant is cheap to clone so that a children sequence can restart from the same sources.
#[derive(Clone, Default)]
pub enum Source {
    #[default]
    Absent,
    /// A terminal reference: string, number or symbol
    Reference(Reference),
    Node(Node),
    Component(Component),
    /// A single value that resolves later
    Promise(Deferred),
    /// Values requested one at a time. The next value is only requested once the previous one is
    /// fully resolved.
    Generator(SourceStreamFactory),
    Iterable(Arc<[Source]>),
    /// An asynchronous iterable. Every element is resolved concurrently as its own lane.
    Stream(SourceStreamFactory),
    /// A serialized node that still needs building
    Marshalled(Arc<MarshalledNode>),
    /// Any other value
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Source {
    pub fn component<F>(component: F) -> Self
    where
        F: Fn(&SourceOptions) -> Result<Source, Error> + Send + Sync + 'static,
    {
        Self::Component(Arc::new(component))
    }

    pub fn promise<F, Fut>(deferred: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Source, Error>> + Send + 'static,
    {
        Self::Promise(Arc::new(move || deferred().boxed()))
    }

    pub fn generator<F, S>(generator: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<Source, Error>> + Send + 'static,
    {
        Self::Generator(Arc::new(move || generator().boxed()))
    }

    pub fn stream<F, S>(sources: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<Source, Error>> + Send + 'static,
    {
        Self::Stream(Arc::new(move || sources().boxed()))
    }

    pub fn iter<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        Self::Iterable(sources.into_iter().map(Into::into).collect())
    }

    pub fn marshalled(node: MarshalledNode) -> Self {
        Self::Marshalled(Arc::new(node))
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, Self::Node(node) if node.is_fragment())
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    pub fn is_promise(&self) -> bool {
        matches!(self, Self::Promise(_))
    }

    pub fn is_generator(&self) -> bool {
        matches!(self, Self::Generator(_))
    }

    /// A synchronous or asynchronous iterable of further sources
    pub fn is_iterable(&self) -> bool {
        matches!(self, Self::Iterable(_) | Self::Stream(_))
    }

    pub fn is_marshalled(&self) -> bool {
        matches!(self, Self::Marshalled(_))
    }

    /// Whether a node constructor has to build a node from this source before it can be placed
    /// among children
    pub fn requires_construction(&self) -> bool {
        matches!(
            self,
            Self::Reference(_) | Self::Marshalled(_) | Self::Generator(_)
        )
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Component(_) => f.write_str("Component"),
            Self::Promise(_) => f.write_str("Promise"),
            Self::Generator(_) => f.write_str("Generator"),
            Self::Iterable(sources) => f.debug_tuple("Iterable").field(sources).finish(),
            Self::Stream(_) => f.write_str("Stream"),
            Self::Marshalled(node) => f.debug_tuple("Marshalled").field(node).finish(),
            Self::Opaque(_) => f.write_str("Opaque"),
        }
    }
}

impl From<Reference> for Source {
    fn from(value: Reference) -> Self {
        Self::Reference(value)
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Self::Reference(value.into())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Self::Reference(value.into())
    }
}

impl From<i64> for Source {
    fn from(value: i64) -> Self {
        Self::Reference(value.into())
    }
}

impl From<Node> for Source {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<MarshalledNode> for Source {
    fn from(value: MarshalledNode) -> Self {
        Self::marshalled(value)
    }
}

impl From<Vec<Source>> for Source {
    fn from(value: Vec<Source>) -> Self {
        Self::Iterable(value.into())
    }
}

impl<T: Into<Source>> From<Option<T>> for Source {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

#[test]
fn test_classify_shapes() {
    use crate::Children;
    use futures_util::stream;

    assert!(Source::Absent.is_absent());
    assert!(Source::from("a").is_reference());
    assert!(Source::from(Node::new("a")).is_node());
    assert!(!Source::from(Node::new("a")).is_fragment());
    assert!(Source::from(Node::fragment(Children::empty())).is_fragment());
    assert!(Source::iter(["a", "b"]).is_iterable());
    assert!(Source::stream(|| stream::empty()).is_iterable());
    assert!(Source::generator(|| stream::empty()).is_generator());
    assert!(Source::promise(|| async { Ok(Source::Absent) }).is_promise());
    assert!(Source::component(|_| Ok(Source::Absent)).is_component());
    assert!(Source::from(None::<Node>).is_absent());
}

#[test]
fn test_construction_cases() {
    use futures_util::stream;

    assert!(Source::from(7i64).requires_construction());
    assert!(Source::generator(|| stream::empty()).requires_construction());
    assert!(Source::marshalled(MarshalledNode::new("a")).requires_construction());
    assert!(!Source::from(Node::new("a")).requires_construction());
    assert!(!Source::iter(Vec::<Source>::new()).requires_construction());
}

#[test]
fn test_classifying_never_runs_sources() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();
    let source = Source::promise(move || {
        flag.store(true, Ordering::SeqCst);
        async { Ok(Source::Absent) }
    });

    assert!(source.is_promise());
    assert!(!source.is_reference());
    assert!(!source.requires_construction());
    assert!(!called.load(Ordering::SeqCst));
}
