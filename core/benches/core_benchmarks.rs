use criterion::{Criterion, black_box, criterion_group, criterion_main};

use aster_core::arena::Arena;
use aster_core::math::{IDENTITY_MATRIX, Vec3, mat4_array_mul, mat4_from_translation, mat4_to_array};

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

fn bench_arena_insert(c: &mut Criterion) {
    c.bench_function("arena_insert_1000", |b| {
        b.iter(|| {
            let mut arena = Arena::with_capacity(1000);
            for i in 0..1000u32 {
                black_box(arena.insert(black_box(i)));
            }
            arena
        });
    });
}

fn bench_arena_churn(c: &mut Criterion) {
    c.bench_function("arena_insert_remove_churn", |b| {
        let mut arena = Arena::with_capacity(256);
        let mut handles: Vec<_> = (0..256u32).map(|i| arena.insert(i)).collect();
        b.iter(|| {
            for h in handles.drain(..) {
                black_box(arena.remove(h));
            }
            for i in 0..256u32 {
                handles.push(arena.insert(i));
            }
        });
    });
}

fn bench_arena_get(c: &mut Criterion) {
    let mut arena = Arena::new();
    let handles: Vec<_> = (0..1000u32).map(|i| arena.insert(i)).collect();
    c.bench_function("arena_get_1000", |b| {
        b.iter(|| {
            for h in &handles {
                black_box(arena.get(black_box(*h)));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Array matrix bridging
// ---------------------------------------------------------------------------

fn bench_mat4_array_mul(c: &mut Criterion) {
    let a = mat4_to_array(&mat4_from_translation(Vec3::new(1.0, 2.0, 3.0)));
    c.bench_function("mat4_array_mul", |b| {
        b.iter(|| black_box(mat4_array_mul(black_box(&a), black_box(&IDENTITY_MATRIX))));
    });
}

criterion_group!(
    benches,
    bench_arena_insert,
    bench_arena_churn,
    bench_arena_get,
    bench_mat4_array_mul,
);
criterion_main!(benches);
