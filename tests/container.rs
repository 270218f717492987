use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::{error::Error as _, sync::Arc, time::Duration};
use tracing_test::traced_test;
use wirebox::{Abstract, Arg, Arguments, Container, Inject, Injectable, InstantiateErrorKind, ResolveErrorKind, Signature};

struct Database;

struct Repository {
    database: Arc<Database>,
}

struct Settings {
    dsn: String,
}

impl Injectable for Settings {
    type Deps = (Arg<String>,);

    fn construct((Arg(dsn),): Self::Deps) -> Result<Self, InstantiateErrorKind> {
        Ok(Self { dsn })
    }

    fn signature() -> Signature {
        Signature::new(["dsn"]).with_default("dsn", "postgres://localhost")
    }
}

#[tokio::test]
#[traced_test]
async fn test_singleton_identity() {
    let container = Container::new();
    container.singleton(|| Ok::<_, InstantiateErrorKind>(Database));

    let database_1 = container.get::<Database>().await.unwrap();
    let database_2 = container.get::<Database>().await.unwrap();

    assert!(Arc::ptr_eq(&database_1, &database_2));
}

#[tokio::test]
#[traced_test]
async fn test_register_builds_distinct_instances() {
    let container = Container::new();
    container
        .singleton(|| Ok::<_, InstantiateErrorKind>(Database))
        .register(|Inject(database): Inject<Database>| async move { Ok::<_, InstantiateErrorKind>(Repository { database }) });

    let repository_1 = container.get::<Repository>().await.unwrap();
    let repository_2 = container.get::<Repository>().await.unwrap();

    assert!(!Arc::ptr_eq(&repository_1, &repository_2));
    assert!(Arc::ptr_eq(&repository_1.database, &repository_2.database));
}

#[tokio::test]
#[traced_test]
async fn test_call_binds_explicit_argument_regardless_of_order() {
    let container = Container::new();
    container.singleton(|| Ok::<_, InstantiateErrorKind>(Database));

    let (database, value) = container
        .call(
            |Inject(database): Inject<Database>, Arg(value): Arg<String>| Ok::<_, InstantiateErrorKind>((database, value)),
            Arguments::new().arg("explicit"),
        )
        .await
        .unwrap();

    assert_eq!(value, "explicit");
    assert!(Arc::ptr_eq(&database, &container.get::<Database>().await.unwrap()));

    let (value, _database) = container
        .call(
            |Arg(value): Arg<String>, Inject(database): Inject<Database>| async move {
                Ok::<_, InstantiateErrorKind>((value, database))
            },
            Arguments::new().arg("explicit"),
        )
        .await
        .unwrap();

    assert_eq!(value, "explicit");
}

#[tokio::test]
#[traced_test]
async fn test_unbound() {
    let container = Container::new();

    assert!(matches!(
        container.resolve_value("no-such-service").await,
        Err(ResolveErrorKind::Unbound { abstract_ }) if abstract_ == Abstract::name("no-such-service")
    ));
    assert!(matches!(container.get::<Database>().await, Err(ResolveErrorKind::Unbound { .. })));
}

#[tokio::test]
#[traced_test]
async fn test_build_error_keeps_source_and_is_not_cached() {
    let build_count = Arc::new(AtomicU8::new(0));

    let container = Container::new();
    container.singleton({
        let build_count = build_count.clone();
        move || {
            build_count.fetch_add(1, Ordering::SeqCst);
            Err::<Database, _>(anyhow::anyhow!("connection refused"))
        }
    });

    let err = match container.get::<Database>().await {
        Err(err) => err,
        Ok(_) => panic!("build error expected"),
    };

    assert!(matches!(&err, ResolveErrorKind::Build { abstract_, .. } if *abstract_ == Abstract::of::<Database>()));
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("connection refused"));

    assert!(container.get::<Database>().await.is_err());
    assert_eq!(build_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
#[traced_test]
async fn test_dependency_error_names_parameter() {
    let container = Container::new();
    container.register(|Inject(database): Inject<Database>| Ok::<_, InstantiateErrorKind>(Repository { database }));

    let err = match container.get::<Repository>().await {
        Err(err) => err,
        Ok(_) => panic!("dependency error expected"),
    };

    assert!(matches!(&err, ResolveErrorKind::Dependency { parameter, abstract_, .. }
        if parameter == "#0" && *abstract_ == Abstract::of::<Database>()));
    assert!(matches!(err.root_cause(), ResolveErrorKind::Unbound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn test_concurrent_singleton_built_once() {
    let build_count = Arc::new(AtomicU8::new(0));

    let container = Container::new();
    container.singleton({
        let build_count = build_count.clone();
        move || {
            std::thread::sleep(Duration::from_millis(20));
            build_count.fetch_add(1, Ordering::SeqCst);
            Ok::<_, InstantiateErrorKind>(Database)
        }
    });

    let handles = (0..16)
        .map(|_| {
            let container = container.clone();
            tokio::spawn(async move { container.get::<Database>().await.unwrap() })
        })
        .collect::<Vec<_>>();

    let mut databases = Vec::new();
    for handle in handles {
        databases.push(handle.await.unwrap());
    }

    assert_eq!(build_count.load(Ordering::SeqCst), 1);
    assert!(databases.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[tokio::test]
#[traced_test]
async fn test_make_constructs_unbound_injectable() {
    let container = Container::new();

    let settings_1 = container.make::<Settings>().await.unwrap();
    let settings_2 = container.make::<Settings>().await.unwrap();

    assert_eq!(settings_1.dsn, "postgres://localhost");
    assert!(!Arc::ptr_eq(&settings_1, &settings_2));
    assert!(matches!(container.get::<Settings>().await, Err(ResolveErrorKind::Unbound { .. })));
}

#[tokio::test]
#[traced_test]
async fn test_get_tagged() {
    let container = Container::new();
    container.singleton(|Arg(name): Arg<String>| Ok::<_, InstantiateErrorKind>(Settings { dsn: name }));

    let primary_1 = container.get_tagged::<Settings, _, _>(["primary"]).await.unwrap();
    let primary_2 = container.get_tagged::<Settings, _, _>(["primary"]).await.unwrap();
    let replica = container.get_tagged::<Settings, _, _>(["replica"]).await.unwrap();

    assert_eq!(primary_1.dsn, "primary");
    assert_eq!(replica.dsn, "replica");
    assert!(Arc::ptr_eq(&primary_1, &primary_2));
}

struct Client;
struct Gateway;

#[tokio::test]
#[traced_test]
async fn test_cycle_through_container_parameter() {
    let cyclic = Arc::new(AtomicBool::new(false));

    let container = Container::new();
    container
        .singleton({
            let cyclic = cyclic.clone();
            move |container: Container| {
                let cyclic = cyclic.clone();
                async move {
                    if let Err(err) = container.get::<Gateway>().await {
                        cyclic.store(matches!(err.root_cause(), ResolveErrorKind::CyclicDependency { .. }), Ordering::SeqCst);
                        return Err(InstantiateErrorKind::from(anyhow::Error::from(err)));
                    }
                    Ok(Client)
                }
            }
        })
        .singleton(|Inject(_client): Inject<Client>| Ok::<_, InstantiateErrorKind>(Gateway));

    let result = tokio::time::timeout(Duration::from_secs(2), container.get::<Client>())
        .await
        .expect("resolution of a cycle hung");

    assert!(matches!(result, Err(ResolveErrorKind::Build { .. })));
    assert!(cyclic.load(Ordering::SeqCst));
}
