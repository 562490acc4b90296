//! Walking a resolved tree and handing hydratable nodes to the context's hydrator.
//!
//! The walk follows every snapshot a children sequence ever produces, so it only finishes once
//! every children sequence in the tree has finished.

use futures_util::future::{self, BoxFuture, FutureExt, TryFutureExt};
use futures_util::stream::TryStreamExt;
use std::sync::Arc;
use vnode_traits::{Context, Error, Node, Tree};

/// Hydrate `node` and everything below it.
///
/// Does nothing, and never polls any children, if the context has no hydrator.
pub async fn hydrate(context: Arc<dyn Context>, node: Node) -> Result<(), Error> {
    hydrate_node(context, node, None).await
}

fn hydrate_node(
    context: Arc<dyn Context>,
    node: Node,
    tree: Option<Arc<Tree>>,
) -> BoxFuture<'static, Result<(), Error>> {
    async move {
        let hook = match context.hydrator() {
            None => return Ok(()),
            Some(_) if node.is_hydrated() => return Ok(()),
            Some(hydrator) if node.is_hydratable(&context) => {
                #[cfg(feature = "tracing")]
                tracing::trace!("hydrating {}", node.reference());

                Some(hydrator.hydrate(node.clone(), tree.clone()))
            }
            Some(_) => None,
        };

        match hook {
            Some(hook) => hook.await,
            None => hydrate_children(context, node, tree).await,
        }
    }
    .boxed()
}

/// Hydrate every child of every snapshot `node`'s children sequence produces.
///
/// All children of one snapshot are hydrated concurrently. The next snapshot is only requested once
/// they have all finished.
pub async fn hydrate_children(
    context: Arc<dyn Context>,
    node: Node,
    tree: Option<Arc<Tree>>,
) -> Result<(), Error> {
    if context.hydrator().is_none() {
        return Ok(());
    }
    let Some(snapshots) = node.children_stream() else {
        return Ok(());
    };

    snapshots
        .try_for_each(|snapshot| {
            let frame = Arc::new(Tree::new(
                node.reference().clone(),
                snapshot.iter().map(|child| child.reference().clone()).collect(),
                tree.clone(),
            ));
            let hydrating = snapshot
                .iter()
                .cloned()
                .map(|child| hydrate_node(context.clone(), child, Some(frame.clone())))
                .collect::<Vec<_>>();

            future::try_join_all(hydrating).map_ok(|_| ())
        })
        .await
}
