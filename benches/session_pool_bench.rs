use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use sqlweave::exprn::{column, in_values, Table};
use sqlweave::session::{ContextKey, Database, SessionPool, SqliteConnectionFactory};
use sqlweave::sql::{to_sql, Dialect};

fn bench_checkout(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkout");

    let pool = SessionPool::new(SqliteConnectionFactory::in_memory());
    drop(pool.get().unwrap());
    group.bench_function("pool_get_release_warm", |b| {
        b.iter(|| {
            let session = pool.get().unwrap();
            black_box(session.connection_id());
        })
    });

    let db = Database::new(SqliteConnectionFactory::in_memory());
    let held = db.get_session().unwrap();
    group.bench_function("database_get_session_cached", |b| {
        b.iter(|| black_box(db.get_session().unwrap()))
    });
    drop(held);

    let scope = ContextKey::new_scope();
    group.bench_function("database_get_session_scope", |b| {
        b.iter(|| black_box(db.get_session_for(&scope).unwrap()))
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let table = Table::new("orders", &["id", "customer_id"]).unwrap();

    for size in [1usize, 16, 256] {
        let predicate = in_values(column(&table.column("id").unwrap()), 0..size as i64);
        group.bench_with_input(BenchmarkId::new("in_values", size), &predicate, |b, predicate| {
            b.iter(|| black_box(to_sql(predicate.as_ref(), Dialect::Sqlite)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_checkout, bench_render);
criterion_main!(benches);
