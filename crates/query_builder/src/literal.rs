use serde_json::Value;

use crate::bindings::replace_numbered;

/// Quote a string as a PostgreSQL literal.
///
/// Single quotes and backslashes are doubled; a literal that contained a
/// backslash gets the `E` prefix.
pub fn escape_string(value: &str) -> String {
    let mut has_backslash = false;
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => escaped.push_str("''"),
            '\\' => {
                escaped.push_str("\\\\");
                has_backslash = true;
            }
            other => escaped.push(other),
        }
    }
    escaped.push('\'');

    if has_backslash {
        escaped.insert(0, 'E');
    }
    escaped
}

/// Render array text such as `{1,"a",NULL,{2,3}}`.
///
/// Strings are JSON-quoted, booleans become `"true"`/`"false"` and objects are
/// embedded as quoted JSON text.
pub fn array_literal(items: &[Value]) -> String {
    let mut out = String::from("{");
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        match item {
            Value::Null => out.push_str("NULL"),
            Value::Array(nested) => out.push_str(&array_literal(nested)),
            Value::Number(number) => out.push_str(&number.to_string()),
            Value::String(_) => out.push_str(&item.to_string()),
            Value::Bool(flag) => out.push_str(&Value::String(flag.to_string()).to_string()),
            Value::Object(_) => out.push_str(&Value::String(item.to_string()).to_string()),
        }
    }
    out.push('}');
    out
}

/// Inline `value` as SQL literal text.
pub fn escape_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_owned(),
        Value::Bool(true) => "true".to_owned(),
        Value::Bool(false) => "false".to_owned(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => escape_string(text),
        Value::Array(items) => escape_string(&array_literal(items)),
        Value::Object(_) => escape_string(&value.to_string()),
    }
}

/// SQL with every `$n` replaced by the escaped literal of `bindings[n - 1]`.
///
/// Meant for logs and debugging; requests always carry bindings separately.
/// Placeholders without a binding are left untouched.
pub fn interpolate(sql: &str, bindings: &[Value]) -> String {
    replace_numbered(sql, |position| {
        position
            .checked_sub(1)
            .and_then(|index| bindings.get(index))
            .map(escape_literal)
    })
}
