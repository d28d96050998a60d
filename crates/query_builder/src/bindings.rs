use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"(\\*)\?").expect("placeholder regex must compile"))
}

fn numbered_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\$([0-9]+)").expect("numbered regex must compile"))
}

fn pg_path_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"^\{.*\}$").expect("pg path regex must compile"))
}

fn path_index_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\[([0-9]+)\]").expect("path index regex must compile"))
}

/// Rewrite `?` placeholders as `$1`, `$2`, ...
///
/// A `?` preceded by an odd number of backslashes is an escaped literal `?`.
/// The backslashes in front of a placeholder are consumed either way.
pub fn position_bindings(sql: &str) -> String {
    let mut count = 0usize;
    placeholder_regex()
        .replace_all(sql, |captures: &Captures<'_>| {
            let escapes = captures.get(1).map_or(0, |m| m.len());
            if escapes % 2 == 1 {
                return "?".to_owned();
            }
            count += 1;
            format!("${count}")
        })
        .into_owned()
}

/// Replace `$n` placeholders using `render(n)`; placeholders for which it
/// returns `None` are left as they are.
pub(crate) fn replace_numbered(sql: &str, mut render: impl FnMut(usize) -> Option<String>) -> String {
    numbered_regex()
        .replace_all(sql, |captures: &Captures<'_>| {
            let whole = captures.get(0).map_or("", |m| m.as_str());
            captures
                .get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .and_then(&mut render)
                .unwrap_or_else(|| whole.to_owned())
        })
        .into_owned()
}

/// Convert a `$.a.b[0]` JSON path to PostgreSQL path text `{a,b,0}`.
/// Paths already in `{...}` form are returned unchanged.
pub fn json_path_to_pg(path: &str) -> String {
    if pg_path_regex().is_match(path) {
        return path.to_owned();
    }

    let stripped = path.strip_prefix("$.").unwrap_or(path);
    let segments = stripped.replace('.', ",");
    let segments = path_index_regex().replace_all(&segments, ",$1");
    format!("{{{segments}}}")
}
