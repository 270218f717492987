#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tokio::runtime::Builder;
use wirebox::{Arg, Arguments, Concrete, Config, Container, Inject, InstantiateErrorKind};

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA;

fn container_many(config: Config) -> Container {
    let container = Container::new();
    container
        .register_concrete(Concrete::new(|| async { Ok::<_, InstantiateErrorKind>(CAAA) }), config)
        .register_concrete(
            Concrete::new(|Inject(caaa): Inject<CAAA>| async move { Ok::<_, InstantiateErrorKind>(CAA(caaa)) }),
            config,
        )
        .register_concrete(
            Concrete::new(|Inject(caa): Inject<CAA>| async move { Ok::<_, InstantiateErrorKind>(CA(caa)) }),
            config,
        )
        .register_concrete(
            Concrete::new(|Inject(ca): Inject<CA>| async move { Ok::<_, InstantiateErrorKind>(C(ca)) }),
            config,
        )
        .register_concrete(Concrete::new(|| async { Ok::<_, InstantiateErrorKind>(B(2)) }), config)
        .register_concrete(
            Concrete::new(|Inject(b): Inject<B>, Inject(c): Inject<C>| async move { Ok::<_, InstantiateErrorKind>(A(b, c)) }),
            config,
        );
    container
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("get_single", |b| {
        let container = Container::new();
        container.singleton(|| async { Ok::<_, InstantiateErrorKind>(CAAA) });

        b.to_async(Builder::new_current_thread().build().unwrap()).iter(|| {
            let container = container.clone();
            async move { container.get::<CAAA>().await.unwrap() }
        });
    })
    .bench_function("get_many_cached", |b| {
        let container = container_many(Config::singleton());

        b.to_async(Builder::new_current_thread().build().unwrap()).iter(|| {
            let container = container.clone();
            async move { container.get::<A>().await.unwrap() }
        });
    })
    .bench_function("get_many_transient", |b| {
        let container = container_many(Config::transient());

        b.to_async(Builder::new_current_thread().build().unwrap()).iter(|| {
            let container = container.clone();
            async move { container.get::<A>().await.unwrap() }
        });
    })
    .bench_function("get_many_scoped", |b| {
        let container = container_many(Config::scoped());

        b.to_async(Builder::new_current_thread().build().unwrap()).iter(|| {
            let container = container.clone();
            async move {
                container
                    .scope(|scoped| async move { scoped.get::<A>().await.unwrap() })
                    .await
            }
        });
    })
    .bench_function("call_with_arguments", |b| {
        let container = Container::new();
        container.singleton(|| async { Ok::<_, InstantiateErrorKind>(B(2)) });

        b.to_async(Builder::new_current_thread().build().unwrap()).iter(|| {
            let container = container.clone();
            async move {
                container
                    .call(
                        |Inject(b): Inject<B>, Arg(value): Arg<i32>| async move { Ok::<_, InstantiateErrorKind>(b.0 + value) },
                        Arguments::new().arg(1_i32),
                    )
                    .await
                    .unwrap()
            }
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
