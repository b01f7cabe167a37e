//! Benchmarks for batch elimination against the reference form

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rowsparse::{IndexBase, SparseMatrix};

/// Banded matrix with `bandwidth` entries on each side of the diagonal
fn banded(n: usize, bandwidth: usize) -> SparseMatrix {
    let mut triplets = Vec::new();
    for i in 0..n {
        for j in i.saturating_sub(bandwidth)..(i + bandwidth + 1).min(n) {
            triplets.push((i, j, 1.0 + (i + j) as f64));
        }
    }
    SparseMatrix::from_triplets(n, &triplets)
}

fn bench_elimination(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_rows_columns");

    for &n in &[500usize, 2_000] {
        let matrix = banded(n, 4);
        // every tenth index, like boundary dofs of a structured mesh
        let removed: Vec<usize> = (0..n).step_by(10).collect();

        group.bench_with_input(BenchmarkId::new("batch", n), &n, |b, _| {
            b.iter_batched(
                || matrix.clone(),
                |mut m| m.remove_rows_columns(&removed, IndexBase::Zero),
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("slow", n), &n, |b, _| {
            b.iter_batched(
                || matrix.clone(),
                |mut m| m.remove_rows_columns_slow(&removed, IndexBase::Zero),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_elimination);
criterion_main!(benches);
