use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use project_hosting_server::{
    models::{QuotaField, QuotaLimitSet},
    services::QuotaLayers,
};

const MB: i64 = 1024 * 1024;

fn defaults() -> QuotaLimitSet {
    QuotaLimitSet {
        pending_projects_max: Some(3),
        total_storage_max: Some(1024 * MB),
        project_storage_max: Some(512 * MB),
        versions_per_day_max: Some(10),
        version_size_max: Some(256 * MB),
        files_per_version_max: Some(10),
        file_size_max: Some(100 * MB),
    }
}

/// Layer stacks from "defaults only" up to every override present.
fn layer_stacks() -> Vec<(&'static str, QuotaLayers)> {
    let base = QuotaLayers {
        defaults: defaults(),
        ..Default::default()
    };
    vec![
        ("defaults", base),
        (
            "project_type",
            QuotaLayers {
                project_type: Some(QuotaLimitSet::default().with(QuotaField::FileSizeMax, 200 * MB)),
                ..base
            },
        ),
        (
            "all_layers",
            QuotaLayers {
                user: Some(QuotaLimitSet::default().with(QuotaField::PendingProjectsMax, 25)),
                project: Some(QuotaLimitSet::default().with(QuotaField::ProjectStorageMax, 2048 * MB)),
                project_type: Some(QuotaLimitSet::default().with(QuotaField::FileSizeMax, 200 * MB)),
                ..base
            },
        ),
    ]
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("quota_resolve");

    for (name, layers) in layer_stacks() {
        group.bench_with_input(BenchmarkId::new("resolve", name), &layers, |b, layers| {
            b.iter(|| black_box(layers).resolve())
        });
    }

    group.finish();
}

fn bench_explain(c: &mut Criterion) {
    let mut group = c.benchmark_group("quota_explain");

    for (name, layers) in layer_stacks() {
        group.bench_with_input(BenchmarkId::new("explain", name), &layers, |b, layers| {
            b.iter(|| black_box(layers).explain())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_explain);
criterion_main!(benches);
