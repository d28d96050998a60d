use std::sync::OnceLock;

use regex::Regex;

fn array_accessor_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"^(.*?)((?:\[[0-9]+\])+)$").expect("array accessor regex must compile")
    })
}

/// Double-quote a single identifier.
///
/// `*` is passed through. Trailing array accessors stay outside the quotes,
/// so `topics[1]` becomes `"topics"[1]`.
pub fn quote_identifier(value: &str) -> String {
    if value == "*" {
        return value.to_owned();
    }

    let (name, accessor) = match array_accessor_regex().captures(value) {
        Some(captures) => (
            captures.get(1).map_or("", |m| m.as_str()),
            captures.get(2).map_or("", |m| m.as_str()),
        ),
        None => (value, ""),
    };

    format!("\"{}\"{accessor}", name.replace('"', "\"\""))
}

/// Quote every `.` separated segment: `ethereum.blocks` -> `"ethereum"."blocks"`.
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}
