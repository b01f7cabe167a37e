//! Benchmarks for the projection variants

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rowsparse::{conjugate, conjugate_dense, ConjugationConfig, ConjugationIndices, SparseMatrix};

/// 1D Laplacian of size `n`
fn laplacian(n: usize) -> SparseMatrix {
    let mut triplets = Vec::with_capacity(3 * n);
    for i in 0..n {
        if i > 0 {
            triplets.push((i, i - 1, -1.0));
        }
        triplets.push((i, i, 2.0));
        if i + 1 < n {
            triplets.push((i, i + 1, -1.0));
        }
    }
    SparseMatrix::from_triplets(n, &triplets)
}

/// Piecewise-linear coarsening basis with `r` hat functions
fn hat_basis(n: usize, r: usize) -> SparseMatrix {
    let width = (n / r).max(1);
    let mut triplets = Vec::with_capacity(2 * n);
    for i in 0..n {
        let k = (i / width).min(r - 1);
        let weight = (i % width) as f64 / width as f64;
        triplets.push((i, k, 1.0 - weight));
        if k + 1 < r && weight > 0.0 {
            triplets.push((i, k + 1, weight));
        }
    }
    SparseMatrix::from_triplets(n, &triplets)
}

fn bench_conjugation(c: &mut Criterion) {
    let mut group = c.benchmark_group("conjugation");
    let config = ConjugationConfig::quiet();

    for &n in &[1_000usize, 10_000] {
        let matrix = laplacian(n);
        let basis = hat_basis(n, 20);

        group.bench_with_input(BenchmarkId::new("outline", n), &n, |b, _| {
            b.iter(|| black_box(conjugate(&matrix, &basis, &config)))
        });

        let (indices, mut reduced) = ConjugationIndices::with_pattern(&matrix, &basis, &config)
            .expect("pattern is built from the same inputs");
        group.bench_with_input(BenchmarkId::new("precomputed", n), &n, |b, _| {
            b.iter(|| {
                indices
                    .conjugate(&matrix, &basis, &mut reduced)
                    .expect("pattern unchanged");
                black_box(&reduced);
            })
        });

        let dense_basis = basis.to_dense_with_columns(20);
        group.bench_with_input(BenchmarkId::new("dense", n), &n, |b, _| {
            b.iter(|| black_box(conjugate_dense(&matrix, &dense_basis.view())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_conjugation);
criterion_main!(benches);
