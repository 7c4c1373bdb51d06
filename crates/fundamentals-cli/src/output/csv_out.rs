use serde_json::Value;
use std::io;

use super::{flatten, format_scalar};

/// Write output as a two-column `field,value` CSV to stdout, with nested
/// fields under dotted names.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in flatten(body) {
        let key = if key.is_empty() { "value".to_string() } else { key };
        let _ = wtr.write_record([key.as_str(), &format_scalar(&val)]);
    }

    let _ = wtr.flush();
}
