use bql::{Bql, MapResolver};

fn main() {
    let bql = Bql::from_spec_file("demos/people.json").expect("failed to load field spec");

    let resolver = MapResolver::new()
        .with("people", "FIRE", "sign IN (aries, leo, sagittarius)")
        .with_owner("people", "ann", "FAVORITES", "lname IN (smith, jones) | fname = Ann");

    let queries = [
        "(FIRE & isAlive = true) | dob >= 1990-05",
        "!(FAVORITES) & age > 30",
        r#""open source" & fname LIKE /^jo/i"#,
        "sign = aries & isAlive = true | sign = leo",
    ];

    for text in queries {
        println!("query:    {text}");
        match bql.parse_with(text, &resolver, Some("ann")) {
            Ok(ruleset) => {
                println!("canonical: {}", bql.render(&ruleset));
                match bql.compile(&ruleset) {
                    Ok(query) => println!(
                        "compiled: {}",
                        serde_json::to_string_pretty(&query).expect("query is valid JSON")
                    ),
                    Err(err) => println!("compile error: {err}"),
                }
            }
            Err(err) => println!("parse error: {err}"),
        }
        println!();
    }
}
