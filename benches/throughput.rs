use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use bql::{Bql, MapResolver};

const SPEC: &str = r#"{
    "domain": "people",
    "fields": {
        "fname": { "type": "string" },
        "lname": { "type": "string", "hasCiKeyword": true },
        "sign": { "type": "category" },
        "isAlive": { "type": "boolean" },
        "dob": { "type": "date" },
        "age": { "type": "number" }
    }
}"#;

const QUERY: &str = r#"(FIRE | sign = virgo) & isAlive = true & dob >= 1980-06 & !(lname IN (smith, "de la cruz")) & /^mc/i"#;

fn build_shared() -> (Bql, Arc<MapResolver>) {
    let bql = Bql::from_spec_str(SPEC).unwrap();
    let resolver = MapResolver::new().with("people", "FIRE", "sign IN (aries, leo, sagittarius)");
    (bql, Arc::new(resolver))
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let (bql, resolver) = build_shared();

        group.bench_function(&format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let bql = bql.clone();
                        let resolver = Arc::clone(&resolver);
                        thread::spawn(move || {
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                if let Ok(rs) = bql.parse_with(QUERY, resolver.as_ref(), None) {
                                    let _ = bql.compile(&rs);
                                }
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
