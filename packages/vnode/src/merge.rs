//! Progressive merge of concurrently updating lanes.
//!
//! Every lane is a stream of values. The merge keeps the latest value of each lane and, whenever
//! any lane produces a new one, yields the latest values of every lane that has produced something,
//! in lane order.

use futures_util::stream::{BoxStream, SelectAll, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use vnode_traits::Error;

pub type Lane<T> = BoxStream<'static, Result<T, Error>>;

type IndexedLane<T> = BoxStream<'static, (usize, Result<T, Error>)>;

/// The merge stream. See the [module docs](self).
///
/// Lanes are supplied by a stream so that new lanes can join while earlier ones are running. A lane's
/// index is its arrival order. The merge finishes once the lane supply and every lane have finished.
///
/// The first error, whether from the lane supply or from any lane, is yielded and then the merge
/// finishes. Every remaining lane is dropped at that point.
pub struct Merge<T> {
    lanes: Option<BoxStream<'static, Result<Lane<T>, Error>>>,
    active: SelectAll<IndexedLane<T>>,
    latest: Vec<Option<T>>,
    failed: bool,
}

impl<T> Unpin for Merge<T> {}

impl<T: Clone + Send + 'static> Merge<T> {
    pub fn new<S>(lanes: S) -> Self
    where
        S: Stream<Item = Result<Lane<T>, Error>> + Send + 'static,
    {
        Self {
            lanes: Some(lanes.boxed()),
            active: SelectAll::new(),
            latest: Vec::new(),
            failed: false,
        }
    }

    fn push_lane(&mut self, lane: Lane<T>) {
        let index = self.latest.len();
        self.latest.push(None);
        self.active.push(lane.map(move |item| (index, item)).boxed());

        #[cfg(feature = "tracing")]
        tracing::trace!("merge lane {index} joined");
    }

    fn fail(&mut self, err: Error) -> Poll<Option<Result<Vec<T>, Error>>> {
        self.failed = true;
        self.lanes = None;
        self.active = SelectAll::new();
        self.latest.clear();

        #[cfg(feature = "tracing")]
        tracing::debug!("merge aborted: {err}");

        Poll::Ready(Some(Err(err)))
    }

    fn current(&self) -> Vec<T> {
        self.latest.iter().flatten().cloned().collect()
    }
}

impl<T: Clone + Send + 'static> Stream for Merge<T> {
    type Item = Result<Vec<T>, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.failed {
            return Poll::Ready(None);
        }

        while let Some(lanes) = this.lanes.as_mut() {
            match lanes.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(lane))) => this.push_lane(lane),
                Poll::Ready(Some(Err(err))) => return this.fail(err),
                Poll::Ready(None) => this.lanes = None,
                Poll::Pending => break,
            }
        }

        match this.active.poll_next_unpin(cx) {
            Poll::Ready(Some((index, Ok(value)))) => {
                this.latest[index] = Some(value);
                Poll::Ready(Some(Ok(this.current())))
            }
            Poll::Ready(Some((_, Err(err)))) => this.fail(err),
            // An empty lane set is only finished once no more lanes can join
            Poll::Ready(None) if this.lanes.is_none() => {
                #[cfg(feature = "tracing")]
                tracing::trace!("merge of {} lanes finished", this.latest.len());

                Poll::Ready(None)
            }
            Poll::Ready(None) | Poll::Pending => Poll::Pending,
        }
    }
}

/// Merge a fixed set of lanes
pub fn merge<T, I>(lanes: I) -> Merge<T>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Lane<T>>,
{
    let lanes: Vec<_> = lanes.into_iter().map(Ok).collect();
    Merge::new(futures_util::stream::iter(lanes))
}
