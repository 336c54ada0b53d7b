//! Benchmarks for topology construction and manifest emission.
//!
//! Measures how building the composite instances and serializing them
//! scales with the number of datanodes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docker_hadoop::catalog::build_topology;
use docker_hadoop::config::{ClusterConfig, FeatureSelection};
use docker_hadoop::fragment::Fragment;
use docker_hadoop::instance;
use docker_hadoop::manifest;

fn selection(datanodes: u32) -> FeatureSelection {
    FeatureSelection {
        all: true,
        datanodes,
        presto_workers: datanodes,
        ..FeatureSelection::default()
    }
}

fn bench_instance_build(c: &mut Criterion) {
    let fragments: Vec<Fragment> = (0..16)
        .map(|i| {
            Fragment::new(format!("role{}", i))
                .image("local-hadoop")
                .volume(format!("./vol{}", i % 4), format!("/vol{}", i % 4))
                .env("SHARED", i)
                .env(format!("ROLE_{}", i), "on")
                .host(format!("alias{}", i))
        })
        .collect();

    c.bench_function("instance_build_16_fragments", |b| {
        b.iter(|| instance::build(black_box("node"), black_box(&fragments)))
    });
}

fn bench_topology_scaling(c: &mut Criterion) {
    let config = ClusterConfig::default();
    let mut group = c.benchmark_group("topology_scaling");

    for datanodes in [1u32, 2, 4, 6] {
        let selection = selection(datanodes);
        group.bench_with_input(
            BenchmarkId::new("build", datanodes),
            &selection,
            |b, selection| b.iter(|| build_topology(black_box(&config), black_box(selection))),
        );

        let topology = match build_topology(&config, &selection) {
            Ok(topology) => topology,
            Err(_) => continue,
        };
        group.bench_with_input(
            BenchmarkId::new("emit", datanodes),
            &topology,
            |b, topology| {
                b.iter(|| manifest::emit(black_box(&topology.instances), &topology.auxiliary, &config))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_instance_build, bench_topology_scaling);
criterion_main!(benches);
