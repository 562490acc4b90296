//! Shared types and boundary traits for vnode.
//!
//! The engine lives in the [vnode](https://docs.rs/vnode) crate. This crate holds the values it passes
//! around ([`Node`], [`Source`], [`Reference`]) and the traits embedders implement to hook into it
//! ([`Context`], [`Hydrator`]).

mod error;
pub use error::{BoxError, Error};

mod reference;
pub use reference::{Reference, Symbol};

mod node;
pub use node::{Children, Node, NodeKind, NodeStream, Snapshot, SnapshotStream};

mod source;
pub use source::{Component, Deferred, Source, SourceStream, SourceStreamFactory};

mod context;
pub use context::{
    Context, DEFAULT_MAX_DEPTH, DummyContext, Hydrator, SourceOptions, Tree, TreeAncestors,
    same_context,
};

pub mod marshal;
pub use marshal::{MarshalledNode, MarshalledReference};
