//! Helpers shared by the vnode integration tests

use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use vnode_traits::{
    Children, Context, Error, Hydrator, Node, Reference, Snapshot, SnapshotStream, Tree,
};

/// A context that records what the engine asked of it
#[derive(Clone, Default)]
pub struct RecordingContext {
    log: Arc<Mutex<Vec<String>>>,
    hydrating: bool,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that also hydrates every hydratable node it is handed
    pub fn hydrating() -> Self {
        Self {
            hydrating: true,
            ..Self::default()
        }
    }

    pub fn record(&self, entry: impl Into<String>) {
        if let Ok(mut log) = self.log.lock() {
            log.push(entry.into());
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl Context for RecordingContext {
    fn hydrator(&self) -> Option<&dyn Hydrator> {
        self.hydrating.then_some(self as &dyn Hydrator)
    }

    fn set(&self, reference: Reference, _node: Node) -> BoxFuture<'static, Result<(), Error>> {
        self.record(format!("set {reference}"));
        future::ready(Ok(())).boxed()
    }
}

impl Hydrator for RecordingContext {
    fn hydrate(&self, node: Node, tree: Option<Arc<Tree>>) -> BoxFuture<'static, Result<(), Error>> {
        match tree {
            Some(tree) => self.record(format!("hydrate {} in {}", node.reference(), tree.reference)),
            None => self.record(format!("hydrate {}", node.reference())),
        }
        future::ready(Ok(())).boxed()
    }
}

/// The references of every node in `snapshot`, in order
pub fn references(snapshot: &Snapshot) -> Vec<Reference> {
    snapshot.iter().map(|node| node.reference().clone()).collect()
}

/// A snapshot of plain nodes named by `references`
pub fn snapshot_of(references: &[&str]) -> Snapshot {
    references.iter().map(|reference| Node::new(*reference)).collect()
}

/// A lane that yields exactly one snapshot
pub fn fixed_lane(snapshot: Snapshot) -> SnapshotStream {
    stream::once(future::ready(Ok(snapshot))).boxed()
}

/// A lane fed by hand, one item per send
pub fn live_lane() -> (mpsc::UnboundedSender<Result<Snapshot, Error>>, SnapshotStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let lane = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed();
    (tx, lane)
}

/// A single pass children sequence fed by hand
pub fn live_children() -> (mpsc::UnboundedSender<Result<Snapshot, Error>>, Children) {
    let (tx, lane) = live_lane();
    (tx, Children::from_stream(lane))
}
