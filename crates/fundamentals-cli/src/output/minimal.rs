use serde_json::Value;

use super::{flatten, format_scalar};

/// Fields worth printing on their own, most important first.
const PRIORITY_KEYS: &[&str] = &[
    "enterprise_value",
    "net_profit_margin",
    "return_on_equity",
    "revenue_growth_yoy",
    "debt_to_equity",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known fields anywhere under the result, in order of
/// priority, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let fields = flatten(result);
    for key in PRIORITY_KEYS {
        let hit = fields.iter().find(|(path, val)| {
            !val.is_null() && (path.as_str() == *key || path.ends_with(&format!(".{key}")))
        });
        if let Some((_, val)) = hit {
            return format_scalar(val);
        }
    }

    match fields.first() {
        Some((key, val)) if !key.is_empty() => format!("{}: {}", key, format_scalar(val)),
        Some((_, val)) => format_scalar(val),
        None => String::new(),
    }
}
