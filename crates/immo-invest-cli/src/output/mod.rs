pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Result fields that hold the row-per-entry part of a computation, in the
/// order they are looked for.
const ROW_KEYS: [&str; 6] = [
    "years",
    "scenarios",
    "rental_variations",
    "financing_options",
    "methods",
    "differences",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// First array of objects in the result, e.g. the schedule years.
fn row_array(result: &serde_json::Map<String, Value>) -> Option<(&'static str, &[Value])> {
    ROW_KEYS.iter().find_map(|key| match result.get(*key) {
        Some(Value::Array(rows)) if rows.first().is_some_and(Value::is_object) => {
            Some((*key, rows.as_slice()))
        }
        _ => None,
    })
}
