use serde_json::Value;

/// Print just the headline figure of the output.
///
/// Looks for well-known result fields in order of priority, then falls
/// back to the first field. Bare arrays (the `schedule` command) print
/// one line per row.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "tcea_percent",
        "monthly_payment",
        "npv",
        "irr",
        "monthly_rate",
    ];

    match result_obj {
        Value::Object(map) => {
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
            }
        }
        Value::Array(rows) => {
            for row in rows {
                println!("{}", format_row(row));
            }
        }
        other => println!("{}", format_minimal(other)),
    }
}

/// `period payment balance` for schedule rows.
fn format_row(row: &Value) -> String {
    match (row.get("period"), row.get("payment"), row.get("balance")) {
        (Some(period), Some(payment), Some(balance)) => format!(
            "{} {} {}",
            format_minimal(period),
            format_minimal(payment),
            format_minimal(balance)
        ),
        _ => format_minimal(row),
    }
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
