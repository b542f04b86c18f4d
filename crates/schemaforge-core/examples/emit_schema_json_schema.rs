use schemaforge_core::{Database, Operation};
use schemars::schema_for;

fn main() {
    let which = std::env::args().nth(1).unwrap_or_else(|| "snapshot".to_string());
    let schema = match which.as_str() {
        "operation" => schema_for!(Operation),
        _ => schema_for!(Database),
    };
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
