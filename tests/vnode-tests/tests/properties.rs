use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::{Arc, Mutex};
use vnode::{
    Children, Error, Node, NodeFactory, Predicate, Reference, Snapshot, Source, SourceOptions,
    children, children_filtered, create_element, hydrate, node_factory, union,
};
use vnode_tests::{
    RecordingContext, fixed_lane, live_children, live_lane, references, snapshot_of,
};

fn options(context: RecordingContext) -> SourceOptions {
    SourceOptions::new(Arc::new(context), "root")
}

fn factory() -> NodeFactory {
    node_factory(options(RecordingContext::new()))
}

async fn last_snapshot(snapshots: vnode::SnapshotStream) -> Option<Vec<Reference>> {
    let snapshots: Vec<Snapshot> = snapshots.try_collect().await.unwrap();
    snapshots.last().map(references)
}

#[tokio::test]
async fn absent_source_has_no_children() {
    let snapshots: Vec<_> = children(factory(), [Source::Absent]).collect().await;
    assert!(snapshots.is_empty());
}

#[tokio::test]
async fn promise_of_node_resolves_to_that_node() {
    let x = Node::new("x");
    let promised = {
        let x = x.clone();
        Source::promise(move || {
            let x = x.clone();
            async move { Ok(Source::Node(x)) }
        })
    };

    let direct: Vec<Node> = create_element(Source::Node(x.clone()), options(RecordingContext::new()))
        .try_collect()
        .await
        .unwrap();
    let awaited: Vec<Node> = create_element(promised.clone(), options(RecordingContext::new()))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(direct.len(), 1);
    assert_eq!(awaited.len(), 1);
    assert_eq!(direct[0].reference(), awaited[0].reference());

    assert_eq!(
        last_snapshot(children(factory(), [promised])).await,
        last_snapshot(children(factory(), [Source::Node(x)])).await
    );
}

#[tokio::test]
async fn fragment_is_the_same_as_its_children() {
    let fragment = {
        let children = Children::new(|| fixed_lane(snapshot_of(&["a", "b"])));
        Node::fragment(children)
    };

    let as_fragment = last_snapshot(children(factory(), [Source::Node(fragment)])).await;
    let as_sources = last_snapshot(children(
        factory(),
        [Source::Node(Node::new("a")), Source::Node(Node::new("b"))],
    ))
    .await;

    assert_eq!(as_fragment, Some(vec![Reference::from("a"), Reference::from("b")]));
    assert_eq!(as_fragment, as_sources);
}

#[tokio::test]
async fn union_follows_every_update_of_one_lane() {
    const UPDATES: usize = 5;

    let (tx, live) = live_lane();
    let lanes = vec![
        Ok(fixed_lane(snapshot_of(&["first"]))),
        Ok(live),
        Ok(fixed_lane(snapshot_of(&["last"]))),
    ];
    let mut merged = union(stream::iter(lanes));

    // The constant lanes report before the live one has anything
    let mut seen = 0;
    while seen < 2 {
        let snapshot = merged.next().await.unwrap().unwrap();
        assert!(!references(&snapshot).contains(&Reference::from("live 0")));
        seen += 1;
    }

    for update in 0..UPDATES {
        let reference = format!("live {update}");
        tx.send(Ok(snapshot_of(&[reference.as_str()]))).unwrap();

        let snapshot = merged.next().await.unwrap().unwrap();
        assert_eq!(
            references(&snapshot),
            vec![
                Reference::from("first"),
                Reference::from(reference),
                Reference::from("last")
            ]
        );
    }

    drop(tx);
    assert!(merged.next().await.is_none());
}

#[tokio::test]
async fn filter_without_match_yields_empty_snapshot() {
    let node = Node::new("root").with_children(Children::new(|| fixed_lane(snapshot_of(&["a", "b"]))));
    let never: Predicate = Arc::new(|_| false);

    let snapshots: Vec<Snapshot> = children_filtered(&node, never).try_collect().await.unwrap();

    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].is_empty());
}

#[tokio::test]
async fn generator_is_driven_one_value_at_a_time() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let generator = {
        let log = log.clone();
        Source::generator(move || {
            let log = log.clone();
            stream::unfold(1, move |step| {
                let log = log.clone();
                async move {
                    if step > 3 {
                        return None;
                    }
                    log.lock().unwrap().push(format!("pull {step}"));

                    let done = log.clone();
                    let value = Source::promise(move || {
                        let done = done.clone();
                        async move {
                            done.lock().unwrap().push(format!("resolved r{step}"));
                            Ok(Source::from(format!("r{step}")))
                        }
                    });
                    Some((Ok(value), step + 1))
                }
            })
        })
    };

    let nodes: Vec<Node> = create_element(generator, options(RecordingContext::new()))
        .try_collect()
        .await
        .unwrap();

    let values: Vec<_> = nodes.iter().filter_map(Node::scalar_value).cloned().collect();
    assert_eq!(
        values,
        vec![Reference::from("r1"), Reference::from("r2"), Reference::from("r3")]
    );
    assert_eq!(
        *log.lock().unwrap(),
        vec!["pull 1", "resolved r1", "pull 2", "resolved r2", "pull 3", "resolved r3"]
    );
}

#[tokio::test]
async fn hydrate_without_hook_does_nothing() {
    let context = RecordingContext::new();
    let polled = Arc::new(Mutex::new(false));
    let node = {
        let polled = polled.clone();
        Node::new("root").with_children(Children::new(move || {
            *polled.lock().unwrap() = true;
            fixed_lane(snapshot_of(&["a"]))
        }))
    };

    hydrate(Arc::new(context.clone()), node).await.unwrap();

    assert!(context.log().is_empty());
    assert!(!*polled.lock().unwrap());
}

#[tokio::test]
async fn hydrate_descends_into_every_snapshot() {
    let context = RecordingContext::hydrating();
    let (tx, children) = live_children();
    let hydratable = |reference: &str| Node::hydratable(reference, Node::new(reference), None);

    tx.send(Ok(Snapshot::from([hydratable("a")]))).unwrap();
    tx.send(Ok(Snapshot::from([hydratable("a"), hydratable("b")]))).unwrap();
    drop(tx);

    let node = Node::new("root").with_children(children);
    hydrate(Arc::new(context.clone()), node).await.unwrap();

    assert_eq!(
        context.log(),
        vec!["hydrate a in root", "hydrate a in root", "hydrate b in root"]
    );
}

#[tokio::test]
async fn hydration_errors_propagate() {
    struct Failing;
    impl vnode::Context for Failing {
        fn hydrator(&self) -> Option<&dyn vnode::Hydrator> {
            Some(self)
        }
    }
    impl vnode::Hydrator for Failing {
        fn hydrate(
            &self,
            _node: Node,
            _tree: Option<Arc<vnode::Tree>>,
        ) -> futures_util::future::BoxFuture<'static, Result<(), Error>> {
            Box::pin(async { Err(Error::hydration_failed("detached")) })
        }
    }

    let node = Node::new("root").with_children(Children::new(|| {
        fixed_lane(Snapshot::from([Node::hydratable("a", Node::new("a"), None)]))
    }));

    let result = hydrate(Arc::new(Failing), node).await;
    assert!(matches!(result, Err(Error::Hydrate(_))));
}

#[tokio::test]
async fn hydration_passes_through_plain_nodes() {
    let context = RecordingContext::hydrating();
    let leaf = Node::hydratable("leaf", Node::new("leaf"), None);
    let mid = Node::new("mid").with_children(Children::new(move || {
        fixed_lane(Snapshot::from([leaf.clone()]))
    }));
    let node = Node::new("root")
        .with_children(Children::new(move || fixed_lane(Snapshot::from([mid.clone()]))));

    hydrate(Arc::new(context.clone()), node).await.unwrap();

    assert_eq!(context.log(), vec!["hydrate leaf in mid"]);
}

#[tokio::test]
async fn siblings_are_hydrated_concurrently() {
    use tokio::sync::oneshot;

    /// "first" only finishes once "second" has started
    struct Handshake {
        tx: Mutex<Option<oneshot::Sender<()>>>,
        rx: Mutex<Option<oneshot::Receiver<()>>>,
    }
    impl vnode::Context for Handshake {
        fn hydrator(&self) -> Option<&dyn vnode::Hydrator> {
            Some(self)
        }
    }
    impl vnode::Hydrator for Handshake {
        fn hydrate(
            &self,
            node: Node,
            _tree: Option<Arc<vnode::Tree>>,
        ) -> futures_util::future::BoxFuture<'static, Result<(), Error>> {
            if node.reference() == &Reference::from("first") {
                let rx = self.rx.lock().unwrap().take();
                Box::pin(async move {
                    match rx {
                        Some(rx) => rx.await.map_err(Error::hydration_failed),
                        None => Err(Error::hydration_failed("hydrated twice")),
                    }
                })
            } else {
                if let Some(tx) = self.tx.lock().unwrap().take() {
                    let _ = tx.send(());
                }
                Box::pin(async { Ok(()) })
            }
        }
    }

    let (tx, rx) = oneshot::channel();
    let context = Handshake {
        tx: Mutex::new(Some(tx)),
        rx: Mutex::new(Some(rx)),
    };
    let hydratable = |reference: &str| Node::hydratable(reference, Node::new(reference), None);
    let siblings = Snapshot::from([hydratable("first"), hydratable("second")]);
    let node =
        Node::new("root").with_children(Children::new(move || fixed_lane(siblings.clone())));

    let walk = hydrate(Arc::new(context), node);
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), walk).await;
    assert!(matches!(result, Ok(Ok(()))));
}
