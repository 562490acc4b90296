//! Resolve a marshalled node tree and print the final state of every children sequence.
//!
//! Usage: `vnode-dump [path/to/tree.json]`. Without a path the bundled example tree is used.

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::TryStreamExt;
use std::sync::Arc;
use vnode::{DummyContext, Node, Snapshot, Source, SourceOptions, create_element};
use vnode_traits::{BoxError, MarshalledNode};

const DEFAULT_TREE: &str = include_str!("../assets/tree.json");

fn main() -> Result<(), BoxError> {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt::init();

    let json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEFAULT_TREE.to_owned(),
    };
    let tree: MarshalledNode = serde_json::from_str(&json)?;

    let rt = tokio::runtime::Builder::new_current_thread().build()?;
    rt.block_on(async {
        let options = SourceOptions::new(Arc::new(DummyContext), "root");
        let nodes: Vec<Node> = create_element(Source::marshalled(tree), options)
            .try_collect()
            .await?;

        for node in nodes {
            print_node(node, 0).await?;
        }
        Ok::<_, BoxError>(())
    })
}

fn print_node(node: Node, depth: usize) -> BoxFuture<'static, Result<(), vnode::Error>> {
    async move {
        let Some(snapshots) = node.children_stream() else {
            match node.scalar_value() {
                Some(value) => println!("{:indent$}{} = {value}", "", node.reference(), indent = depth * 2),
                None => println!("{:indent$}{}", "", node.reference(), indent = depth * 2),
            }
            return Ok(());
        };

        let snapshots: Vec<Snapshot> = snapshots.try_collect().await?;
        println!(
            "{:indent$}{} ({} updates)",
            "",
            node.reference(),
            snapshots.len(),
            indent = depth * 2
        );

        if let Some(last) = snapshots.last() {
            for child in last.iter().cloned() {
                print_node(child, depth + 1).await?;
            }
        }
        Ok(())
    }
    .boxed()
}
