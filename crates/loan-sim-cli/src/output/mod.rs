pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Schedule row fields in their declared order.
const ROW_COLUMNS: [&str; 7] = [
    "period",
    "due_date",
    "opening_balance",
    "payment",
    "interest",
    "principal",
    "balance",
];

/// Column headers for an array of row objects: schedule fields first in
/// schedule order, anything else after them alphabetically.
pub fn row_headers(first: &Map<String, Value>) -> Vec<String> {
    let mut headers: Vec<String> = first.keys().cloned().collect();
    headers.sort_by_key(|h| {
        ROW_COLUMNS
            .iter()
            .position(|c| c == h)
            .unwrap_or(ROW_COLUMNS.len())
    });
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_columns_follow_row_order() {
        let row = json!({
            "balance": "0", "due_date": "2024-02-15", "interest": "1",
            "opening_balance": "100", "payment": "101", "period": 1, "principal": "100"
        });
        let Value::Object(map) = row else { unreachable!() };
        assert_eq!(
            row_headers(&map),
            vec![
                "period",
                "due_date",
                "opening_balance",
                "payment",
                "interest",
                "principal",
                "balance"
            ]
        );
    }

    #[test]
    fn test_unknown_columns_trail() {
        let row = json!({"zeta": 1, "alpha": 2, "period": 3});
        let Value::Object(map) = row else { unreachable!() };
        assert_eq!(row_headers(&map), vec!["period", "alpha", "zeta"]);
    }
}
