use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields (dotted paths into nested objects)
/// in order of priority, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_paths = [
        "monthly_cashflow",
        "cashflow.monthly_cashflow",
        "break_even.required_equity",
        "required_equity",
        "adjusted_score",
        "fair_price",
        "summary.wealth_end",
        "property_vs_etf_with_savings",
        "loan_fully_repaid",
        "quick_check.light",
    ];

    if let Some(val) = priority_paths
        .iter()
        .filter_map(|path| lookup(result_obj, path))
        .find(|v| !v.is_null())
    {
        println!("{}", format_minimal(val));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
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
