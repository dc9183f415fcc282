//! Formula construction helpers
//!
//! Field names and values are interpolated as-is. Nothing here escapes
//! quotes or braces, so a value containing `'` produces a broken or
//! different formula. Callers must only pass trusted values.

use serde_json::Value;

/// `{attribute} = 'value'`
pub fn equals(attribute: &str, value: &str) -> String {
    format!("{{{}}} = '{}'", attribute, value)
}

/// `RECORD_ID() = 'id'`
pub fn record_id_equals(id: &str) -> String {
    format!("RECORD_ID() = '{}'", id)
}

/// `AND(a, b, ...)`
pub fn and<I, S>(clauses: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    call("AND", clauses)
}

/// `OR(a, b, ...)`
pub fn or<I, S>(clauses: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    call("OR", clauses)
}

/// Formula matching any of the given record ids
pub fn any_record_id<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    or(ids.into_iter().map(|id| record_id_equals(id.as_ref())))
}

/// Text used when a JSON field value is compared in a formula.
///
/// Strings are used verbatim; everything else uses its JSON rendering.
pub fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn call<I, S>(function: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    format!("{}({})", function, args.join(", "))
}
