//! The children aggregator.
//!
//! Turns any number of sources into one children sequence. Every source becomes a lane of snapshots
//! and the lanes are combined with [`union`], so the sequence always holds the latest snapshot of
//! every source that has produced one, in source order.

use futures_util::future;
use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;
use vnode_traits::{Children, DEFAULT_MAX_DEPTH, Error, Node, Snapshot, SnapshotStream, Source};

use crate::merge::Merge;

/// Builds a node from a source the aggregator cannot place among children as it is
pub type NodeFactory = Arc<dyn Fn(Source) -> Result<Node, Error> + Send + Sync>;

/// Combine lanes of snapshots into one sequence of concatenated snapshots
pub fn union<S>(lanes: S) -> SnapshotStream
where
    S: Stream<Item = Result<SnapshotStream, Error>> + Send + 'static,
{
    Merge::new(lanes)
        .map_ok(|snapshots| {
            snapshots
                .iter()
                .flat_map(|snapshot| snapshot.iter().cloned())
                .collect::<Snapshot>()
        })
        .boxed()
}

/// Aggregate `sources` with the default depth limit
pub fn children<I>(create_node: NodeFactory, sources: I) -> SnapshotStream
where
    I: IntoIterator<Item = Source>,
{
    Aggregator::new(create_node).children(sources)
}

/// Start `make` on first poll instead of when the stream is built
pub(crate) fn cold<F>(make: F) -> SnapshotStream
where
    F: FnOnce() -> SnapshotStream + Send + 'static,
{
    stream::once(future::lazy(move |_| make())).flatten().boxed()
}

fn failed(err: Error) -> SnapshotStream {
    stream::once(future::ready(Err(err))).boxed()
}

#[derive(Clone)]
pub struct Aggregator {
    create_node: NodeFactory,
    max_depth: usize,
}

impl Aggregator {
    pub fn new(create_node: NodeFactory) -> Self {
        Self {
            create_node,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The children sequence of `sources`.
    ///
    /// A single source is used as the sequence directly, anything else is a union with one lane per
    /// source.
    pub fn children<I>(&self, sources: I) -> SnapshotStream
    where
        I: IntoIterator<Item = Source>,
    {
        let mut sources: Vec<Source> = sources.into_iter().collect();
        if sources.len() == 1 {
            return self.lane(sources.remove(0));
        }

        let this = self.clone();
        cold(move || union(stream::iter(sources).map(move |source| Ok(this.each_source(source, 0)))))
    }

    /// A restartable [`Children`] handle over `sources`
    pub fn into_children(self, sources: Vec<Source>) -> Children {
        Children::new(move || self.children(sources.clone()))
    }

    /// The lane a single source contributes to a union
    pub fn lane(&self, source: Source) -> SnapshotStream {
        let this = self.clone();
        cold(move || this.each_source(source, 0))
    }

    fn each_source(&self, source: Source, depth: usize) -> SnapshotStream {
        if depth > self.max_depth {
            #[cfg(feature = "tracing")]
            tracing::debug!("children nested deeper than {}", self.max_depth);

            return failed(Error::DepthExceeded {
                limit: self.max_depth,
            });
        }

        match source {
            Source::Absent => stream::empty().boxed(),
            Source::Promise(deferred) => {
                let this = self.clone();
                stream::once(async move { deferred().await })
                    .map_ok(move |source| this.each_source(source, depth + 1))
                    .try_flatten()
                    .boxed()
            }
            Source::Node(node) if node.is_fragment() => node
                .children_stream()
                .unwrap_or_else(|| stream::empty().boxed()),
            Source::Node(node) => stream::once(future::ready(Ok(Snapshot::from([node])))).boxed(),
            Source::Iterable(sources) => {
                let this = self.clone();
                let sources = sources.to_vec();
                union(
                    stream::iter(sources)
                        .map(move |source| Ok(this.each_source(source, depth + 1))),
                )
            }
            Source::Stream(sources) => {
                let this = self.clone();
                union(sources().map_ok(move |source| this.each_source(source, depth + 1)))
            }
            source => match (self.create_node)(source) {
                Ok(node) => self.each_source(Source::Node(node), depth + 1),
                Err(err) => failed(err),
            },
        }
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
