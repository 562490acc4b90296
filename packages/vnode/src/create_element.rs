//! Resolving sources into nodes.
//!
//! [`create_element`] is the entry point. Rules are tried in order and the first that matches wins:
//!
//!  1. The context's own [`Context::create_element`](vnode_traits::Context::create_element) hook.
//!  2. Components are called with the options and their result is resolved.
//!  3. Promises are awaited and their value is resolved.
//!  4. Nodes are [flattened](crate::flatten).
//!  5. References become a single scalar node.
//!  6. Generators are resolved one value at a time. The next value is only requested once the
//!     previous one has been fully resolved.
//!  7. Iterables and streams become one fragment whose children aggregate every element.
//!  8. Marshalled nodes are built from their descriptor.
//!  9. Anything else becomes a plain node carrying the source and options.

use futures_util::future;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use vnode_traits::{
    Children, Error, MarshalledNode, Node, NodeStream, Reference, SnapshotStream, Source,
    SourceOptions, SourceStream,
};

use crate::children::{Aggregator, NodeFactory, cold, union};
use crate::flatten;

/// Resolve `source` into a stream of nodes.
///
/// Nothing runs until the stream is first polled: no component is called and no future is
/// started.
pub fn create_element(source: Source, options: SourceOptions) -> NodeStream {
    stream::once(future::lazy(move |_| resolve(source, options, 0)))
        .flatten()
        .boxed()
}

/// The node constructor the resolver hands to the children aggregator
pub fn node_factory(options: SourceOptions) -> NodeFactory {
    Arc::new(move |source| Ok(construct(source, &options)))
}

fn construct(source: Source, options: &SourceOptions) -> Node {
    match source {
        Source::Reference(reference) => scalar_node(reference.clone(), reference, options),
        Source::Marshalled(marshalled) => build_marshalled(&marshalled, options),
        Source::Node(node) => node,
        source => {
            let options = options.clone();
            Node::fragment(Children::new(move || {
                let aggregator = aggregator(&options);
                let nodes = create_element(source.clone(), options.clone());
                cold(move || {
                    union(nodes.map_ok(move |node| aggregator.lane(Source::Node(node))))
                })
            }))
        }
    }
}

/// A terminal node holding `value`
pub fn scalar_node(reference: Reference, value: Reference, options: &SourceOptions) -> Node {
    Node::scalar(reference, value, Some(options.clone()))
}

fn aggregator(options: &SourceOptions) -> Aggregator {
    Aggregator::new(node_factory(options.clone())).with_max_depth(options.max_depth)
}

fn build_marshalled(marshalled: &MarshalledNode, options: &SourceOptions) -> Node {
    let node = Node::plain(marshalled.reference(), None, Some(options.clone()));
    match &marshalled.children {
        Some(children) => {
            let sources = children.iter().cloned().map(Source::marshalled).collect();
            node.with_children(aggregator(options).into_children(sources))
        }
        None => node,
    }
}

fn failed(err: Error) -> NodeStream {
    stream::once(future::ready(Err(err))).boxed()
}

fn resolve(source: Source, options: SourceOptions, depth: usize) -> NodeStream {
    if depth > options.max_depth {
        #[cfg(feature = "tracing")]
        tracing::debug!("sources nested deeper than {}", options.max_depth);

        return failed(Error::DepthExceeded {
            limit: options.max_depth,
        });
    }

    if let Some(nodes) = options.context.create_element(&source, &options) {
        return nodes;
    }

    match source {
        Source::Component(component) => match component(&options) {
            Ok(next) => resolve(next, options, depth + 1),
            Err(err) => failed(err),
        },
        Source::Promise(deferred) => stream::once(async move { deferred().await })
            .map_ok(move |next| resolve(next, options.clone(), depth + 1))
            .try_flatten()
            .boxed(),
        Source::Node(node) => flatten(node),
        Source::Reference(value) => {
            let node = scalar_node(options.reference.clone(), value, &options);
            stream::once(future::ready(Ok(node))).boxed()
        }
        Source::Generator(generator) => generator()
            .map_ok(move |next| resolve(next, options.clone(), depth + 1))
            .try_flatten()
            .boxed(),
        elements @ (Source::Iterable(_) | Source::Stream(_)) => {
            let fragment = Node::fragment(Children::new(move || {
                let elements = elements.clone();
                let options = options.clone();
                cold(move || element_children(elements, options, depth))
            }));
            stream::once(future::ready(Ok(fragment))).boxed()
        }
        Source::Marshalled(marshalled) => {
            let node = build_marshalled(&marshalled, &options);
            stream::once(future::ready(Ok(node))).boxed()
        }
        source => {
            let node = Node::plain(
                options.reference.clone(),
                Some(source),
                Some(options.clone()),
            )
            .with_children(aggregator(&options).into_children(Vec::new()));
            stream::once(future::ready(Ok(node))).boxed()
        }
    }
}

/// Every element is one lane, and every node an element resolves to is a lane within it
fn element_children(elements: Source, options: SourceOptions, depth: usize) -> SnapshotStream {
    let elements: SourceStream = match elements {
        Source::Iterable(sources) => stream::iter(sources.to_vec().into_iter().map(Ok)).boxed(),
        Source::Stream(sources) => sources(),
        _ => stream::empty().boxed(),
    };

    let aggregator = aggregator(&options);
    union(elements.map_ok(move |element| {
        let aggregator = aggregator.clone();
        union(
            resolve(element, options.clone(), depth + 1)
                .map_ok(move |node| aggregator.lane(Source::Node(node))),
        )
    }))
}
