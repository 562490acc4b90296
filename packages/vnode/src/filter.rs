use futures_util::future;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use vnode_traits::{Node, Snapshot, SnapshotStream};

use crate::children::union;

/// Decides whether a node belongs in a filtered children sequence
pub type Predicate = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// The children of `node`, keeping only nodes that match `predicate`.
///
/// Non-matching children are replaced by their own filtered children, so matches are collected from
/// the whole subtree while keeping tree order. Every snapshot of `node` produces at least one
/// snapshot, which is empty when nothing matched. A node without children yields nothing.
pub fn children_filtered(node: &Node, predicate: Predicate) -> SnapshotStream {
    let Some(children) = node.children().cloned() else {
        return stream::empty().boxed();
    };

    stream::once(future::lazy(move |_| children.stream()))
        .flatten()
        .map_ok(move |snapshot| filter_snapshot(snapshot, predicate.clone()))
        .try_flatten()
        .boxed()
}

fn filter_snapshot(snapshot: Snapshot, predicate: Predicate) -> SnapshotStream {
    if snapshot.is_empty() || snapshot.iter().all(|node| predicate(node)) {
        return stream::once(future::ready(Ok(snapshot))).boxed();
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("filtering {} children", snapshot.len());

    let lanes = stream::iter(snapshot.to_vec()).map(move |child| {
        Ok(if predicate(&child) {
            stream::once(future::ready(Ok(Snapshot::from([child])))).boxed()
        } else {
            children_filtered(&child, predicate.clone())
        })
    });
    or_empty(union(lanes))
}

/// Yield an empty snapshot if `snapshots` finishes without yielding anything
fn or_empty(snapshots: SnapshotStream) -> SnapshotStream {
    stream::unfold(
        (Some(snapshots), false),
        |(snapshots, yielded)| async move {
            let mut snapshots = snapshots?;
            match snapshots.next().await {
                Some(item) => Some((item, (Some(snapshots), true))),
                None if yielded => None,
                None => Some((Ok(Snapshot::from([])), (None, true))),
            }
        },
    )
    .boxed()
}
