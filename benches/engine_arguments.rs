//! This bench test validates and serializes a hypothesis carrying a large
//! enforcement set, the way a launcher does before every run.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use tetrahyp::{
    Field, HypothesisConfig,
    domain::{
        Algorithm, ConstraintKind, EnforcedMesh, EnforcedVertex, GroupDimension, GroupRef,
        OptionType, ParallelStrategy, Point,
    },
};
use tempfile::TempDir;

/// Builds an HPC hypothesis with thousands of enforced entries
fn preseed_hypothesis(working_directory: &TempDir) -> HypothesisConfig {
    let mut config = HypothesisConfig::for_algorithm(Algorithm::MgTetraHpc);
    config
        .set_field(
            Field::WorkingDirectory,
            tetrahyp::Value::Text(working_directory.path().display().to_string()),
        )
        .unwrap();
    config
        .set_field(Field::ParallelStrategy, ParallelStrategy::Aggressive)
        .unwrap();
    config.set_field(Field::MaxThreads, 16_i64).unwrap();

    for i in 0..2_000 {
        let x = f64::from(i);
        config
            .add_enforced_vertex(EnforcedVertex::at(Point::new(x, x * 0.5, -x)).with_size(0.1))
            .unwrap();
    }
    for i in 0..200 {
        config
            .add_enforced_mesh(EnforcedMesh::new(
                format!("skin-{}", i % 7),
                ConstraintKind::Face,
                GroupRef::new(format!("0:1:2:{i}"), GroupDimension::Two),
            ))
            .unwrap();
    }
    for i in 0..20 {
        config
            .set_text_option(&format!("option_{i}"), &i.to_string(), OptionType::Numeric)
            .unwrap();
    }
    config
}

fn engine_arguments(c: &mut Criterion) {
    let tmp_dir = TempDir::new().unwrap();
    let config = preseed_hypothesis(&tmp_dir);

    c.bench_function("validate", |b| b.iter(|| config.validate()));

    c.bench_function("engine arguments", |b| {
        b.iter_batched(
            || config.clone(),
            |config| config.to_engine_arguments().unwrap().fingerprint(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, engine_arguments);
criterion_main!(benches);
