//! A lazily resolved, continuously updating virtual node tree.
//!
//! Sources of any shape (references, nodes, components, promises, generators, iterables, streams
//! and marshalled descriptors) are resolved into [`Node`]s with [`create_element`]. Every node's
//! children are a sequence of snapshots, and a new snapshot is produced whenever any source that
//! feeds the children produces something new. The tree can then be walked: [`children_filtered`]
//! collects matching descendants and [`hydrate`] hands nodes to the embedder's
//! [`Hydrator`](vnode_traits::Hydrator).
//!
//! Everything is cold. Building a stream never runs user code, polling it does.
//!
//! The types and the traits embedders implement live in [vnode-traits](https://docs.rs/vnode-traits)
//! and are re-exported here.
//!
//! ## Feature flags
//!  - `default`: Enables the features listed below.
//!  - `tracing`: Enables tracing support.

/// Progressive merge of lanes
pub mod merge;

mod children;
mod create_element;
mod filter;
mod flatten;
mod hydrate;
mod scalar;

pub use children::{Aggregator, NodeFactory, children, union};
pub use create_element::{create_element, node_factory, scalar_node};
pub use filter::{Predicate, children_filtered};
pub use flatten::flatten;
pub use hydrate::{hydrate, hydrate_children};
pub use scalar::get_scalar;

pub use vnode_traits::{
    Children, Context, DEFAULT_MAX_DEPTH, DummyContext, Error, Hydrator, MarshalledNode, Node,
    NodeKind, NodeStream, Reference, Snapshot, SnapshotStream, Source, SourceOptions, Tree,
};
