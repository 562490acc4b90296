use futures_util::future;
use futures_util::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use vnode_traits::{Children, Error, Node, NodeStream, Snapshot, SnapshotStream};

use crate::children::{cold, union};

/// Yield `node`, inlining the children of every fragment nested directly inside it.
///
/// Anything other than a fragment is yielded unchanged.
pub fn flatten(node: Node) -> NodeStream {
    let node = match node.children() {
        Some(children) if node.is_fragment() => {
            let children = children.clone();
            Node::fragment(Children::new(move || {
                let children = children.clone();
                cold(move || flatten_snapshots(children.stream()))
            }))
        }
        _ => node,
    };
    stream::once(future::ready(Ok(node))).boxed()
}

fn flatten_snapshots(snapshots: SnapshotStream) -> SnapshotStream {
    Switch {
        outer: Some(snapshots),
        inner: None,
        expand: flatten_snapshot,
    }
    .boxed()
}

fn flatten_snapshot(snapshot: Snapshot) -> SnapshotStream {
    if !snapshot.iter().any(Node::is_fragment) {
        return stream::once(future::ready(Ok(snapshot))).boxed();
    }

    let lanes = stream::iter(snapshot.to_vec()).map(|child| {
        Ok(match child.children() {
            Some(children) if child.is_fragment() => flatten_snapshots(children.stream()),
            _ if child.is_fragment() => stream::empty().boxed(),
            _ => stream::once(future::ready(Ok(Snapshot::from([child])))).boxed(),
        })
    });
    union(lanes)
}

/// Follows the expansion of the latest outer snapshot.
///
/// A new outer snapshot drops the expansion of the previous one, even if it is still live. The
/// first error ends the whole stream.
struct Switch {
    outer: Option<SnapshotStream>,
    inner: Option<SnapshotStream>,
    expand: fn(Snapshot) -> SnapshotStream,
}

impl Switch {
    fn fail(&mut self, err: Error) -> Poll<Option<Result<Snapshot, Error>>> {
        self.outer = None;
        self.inner = None;
        Poll::Ready(Some(Err(err)))
    }
}

impl Stream for Switch {
    type Item = Result<Snapshot, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let mut switched = false;
            if let Some(outer) = this.outer.as_mut() {
                match outer.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(snapshot))) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!("flatten switched to a snapshot of {}", snapshot.len());

                        this.inner = Some((this.expand)(snapshot));
                        switched = true;
                    }
                    Poll::Ready(Some(Err(err))) => return this.fail(err),
                    Poll::Ready(None) => this.outer = None,
                    Poll::Pending => {}
                }
            }

            if let Some(inner) = this.inner.as_mut() {
                match inner.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(snapshot))) => return Poll::Ready(Some(Ok(snapshot))),
                    Poll::Ready(Some(Err(err))) => return this.fail(err),
                    Poll::Ready(None) => this.inner = None,
                    Poll::Pending => {}
                }
            }

            // The outer stream may already hold a newer snapshot
            if switched {
                continue;
            }

            return match (&this.outer, &this.inner) {
                (None, None) => Poll::Ready(None),
                _ => Poll::Pending,
            };
        }
    }
}
