use std::sync::Arc;
use std::thread;

use bql::{Bql, MapResolver};

const QUERIES: &[&str] = &[
    "sign = leo & isAlive = true",
    "(dob >= 1990 & dob < 2000) | age > 65",
    r#"fname IN (alice, "bob smith") & !(lname = Jones)"#,
    "/^mc/i | \"hello world\"",
    "WATER & isAlive = true",
];

#[test]
fn parse_and_compile_across_threads() {
    let bql = Bql::from_spec_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/people.json")).unwrap();
    let resolver = Arc::new(MapResolver::new().with("people", "WATER", "sign IN (cancer, scorpio, pisces)"));

    let expected: Vec<String> = QUERIES
        .iter()
        .map(|q| {
            let rs = bql.parse_with(q, resolver.as_ref(), None).unwrap();
            serde_json::to_string(&bql.compile(&rs).unwrap()).unwrap()
        })
        .collect();
    let expected = Arc::new(expected);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let bql = bql.clone();
            let resolver = Arc::clone(&resolver);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                for round in 0..50 {
                    let i = (t + round) % QUERIES.len();
                    let rs = bql.parse_with(QUERIES[i], resolver.as_ref(), None).unwrap();
                    let out = serde_json::to_string(&bql.compile(&rs).unwrap()).unwrap();
                    assert_eq!(out, expected[i]);
                    assert_eq!(bql.parse_with(&bql.render(&rs), resolver.as_ref(), None).unwrap(), rs);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn shared_engine_behind_arc() {
    let bql = Arc::new(
        Bql::from_spec_str(r#"{ "fields": { "n": { "type": "number" } } }"#).unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let bql = Arc::clone(&bql);
            thread::spawn(move || bql.compile_text(&format!("n = {i}")).unwrap())
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let query = handle.join().unwrap();
        assert_eq!(query["term"]["n"], i as i64);
    }
}
