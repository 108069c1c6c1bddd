use serde_json::Value;

/// Print just the headline figure from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Summary rows: print the WACC line
    if let Some(Value::Array(rows)) = value.get("results") {
        let wacc_row = rows
            .iter()
            .find(|r| r.get("metric").and_then(Value::as_str) == Some("WACC"));
        if let Some(row) = wacc_row {
            if let Some(v) = row.get("value") {
                println!("{}", format_minimal(v));
                return;
            }
        }
    }

    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = ["wacc", "projected_rate", "firm_value"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
