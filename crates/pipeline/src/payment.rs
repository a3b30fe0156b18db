//! Payment signal detection over the free-form answer payload.

use serde_json::Value;

/// Statuses that mark a payment as settled on their own.
const SETTLED_STATUSES: [&str; 3] = ["paid", "success", "completed"];

/// Statuses that mark a payment as settled only with a positive amount.
const CAPTURED_STATUSES: [&str; 2] = ["captured", "charged"];

/// Decide whether a submission payload already represents a paid
/// conversion. Rules are checked in order; the first match wins:
///
/// 1. An explicit `paid` key is authoritative either way.
/// 2. `subscription.active` is truthy.
/// 3. `payment.status` is one of paid/success/completed (case-insensitive).
/// 4. `payment.amount > 0` and `payment.status` is captured/charged.
pub fn should_mark_paid(payload: &Value) -> bool {
    if let Some(paid) = payload.get("paid") {
        return truthy(paid);
    }

    if payload
        .pointer("/subscription/active")
        .is_some_and(truthy)
    {
        return true;
    }

    if let Some(status) = payload.pointer("/payment/status").and_then(Value::as_str) {
        let status = status.to_ascii_lowercase();

        if SETTLED_STATUSES.contains(&status.as_str()) {
            return true;
        }

        if CAPTURED_STATUSES.contains(&status.as_str())
            && payload
                .pointer("/payment/amount")
                .is_some_and(amount_positive)
        {
            return true;
        }
    }

    false
}

/// Boolean cast for loosely-typed payload values. Strings follow the usual
/// form-input convention: only "1", "true", "on", "yes" are true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            )
        }
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A positive amount, accepting both numeric and numeric-string values.
fn amount_positive(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(|f| f > 0.0),
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(|f| f > 0.0),
        _ => false,
    }
}
