//! Identifier sanitization for metric names, tag keys, and field keys
//!
//! Metric names and field keys share one grammar (`:` allowed), tag keys a
//! stricter one. Invalid characters are replaced with `_` rather than
//! rejected, so a sanitized identifier is always usable.

/// Whether a metric name (or field key) is valid: `[a-zA-Z][a-zA-Z0-9_:]*`.
pub fn metric_name_valid(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Sanitize a metric name or field key: first char outside `[a-zA-Z_:]`
/// becomes `_`, body chars outside `[a-zA-Z0-9_:]` become `_`.
pub fn sanitize_name(s: &str) -> String {
    sanitize_with(s, |c| c.is_ascii_alphabetic() || c == '_' || c == ':', |c| {
        c.is_ascii_alphanumeric() || c == '_' || c == ':'
    })
}

/// Sanitize a tag key: first char outside `[a-zA-Z_]` becomes `_`, body
/// chars outside `[a-zA-Z0-9_]` become `_`.
pub fn sanitize_tag_key(s: &str) -> String {
    sanitize_with(s, |c| c.is_ascii_alphabetic() || c == '_', |c| {
        c.is_ascii_alphanumeric() || c == '_'
    })
}

/// Sanitize a name prefix: only the first char is held to `[a-zA-Z_:]`,
/// the rest is left untouched.
pub fn sanitize_name_prefix(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if !(c.is_ascii_alphabetic() || c == '_' || c == ':') => {
            let mut out = String::with_capacity(s.len());
            out.push('_');
            out.push_str(chars.as_str());
            out
        }
        _ => s.to_string(),
    }
}

/// Sanitize a name suffix: every char outside `[a-zA-Z0-9_:]` becomes `_`.
/// No first-char rule applies, the suffix lands mid-name.
pub fn sanitize_name_suffix(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Escape a string field value for line-protocol output: `"` and `\` are
/// backslash-escaped.
pub fn escape_field_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

fn sanitize_with(
    s: &str,
    first_ok: impl Fn(char) -> bool,
    body_ok: impl Fn(char) -> bool,
) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        let ok = if i == 0 { first_ok(c) } else { body_ok(c) };
        out.push(if ok { c } else { '_' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validity() {
        assert!(metric_name_valid("cpu_usage"));
        assert!(metric_name_valid("namespace:metric"));
        assert!(metric_name_valid("a"));
        assert!(!metric_name_valid(""));
        assert!(!metric_name_valid("1cpu"));
        assert!(!metric_name_valid("_cpu"));
        assert!(!metric_name_valid("cpu usage"));
    }

    #[test]
    fn sanitize_names() {
        assert_eq!(sanitize_name("cpu.usage"), "cpu_usage");
        assert_eq!(sanitize_name("9lives"), "_lives");
        assert_eq!(sanitize_name("ns:counter"), "ns:counter");
        assert_eq!(sanitize_name("_private"), "_private");
    }

    #[test]
    fn sanitize_tag_keys() {
        assert_eq!(sanitize_tag_key("host.name"), "host_name");
        assert_eq!(sanitize_tag_key("ns:key"), "ns_key");
        assert_eq!(sanitize_tag_key("0key"), "_key");
    }

    #[test]
    fn sanitize_prefixes() {
        // only the first character is checked
        assert_eq!(sanitize_name_prefix("app."), "app.");
        assert_eq!(sanitize_name_prefix("9app."), "_app.");
        assert_eq!(sanitize_name_prefix(":ns"), ":ns");
        assert_eq!(sanitize_name_prefix(""), "");
    }

    #[test]
    fn sanitize_suffixes() {
        // body grammar for every character, a leading digit survives
        assert_eq!(sanitize_name_suffix(".total"), "_total");
        assert_eq!(sanitize_name_suffix("9items"), "9items");
        assert_eq!(sanitize_name_suffix("a.b:c"), "a_b:c");
        assert_eq!(sanitize_name_suffix(""), "");
    }

    #[test]
    fn escape_strings() {
        assert_eq!(escape_field_value(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_field_value(r"a\b"), r"a\\b");
        assert_eq!(escape_field_value("plain"), "plain");
    }
}
