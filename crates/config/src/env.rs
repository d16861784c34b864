//! Environment variable substitution
//!
//! String values that consist entirely of `$VAR` or `${VAR}` are replaced
//! with the variable's value. Partial interpolation inside longer strings
//! is deliberately not performed; an unset variable leaves the value
//! untouched.

use toml::Value;

/// Recursively substitute environment variable references in string values.
pub fn substitute_env(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Some(var) = env_var_name(s) {
                if let Ok(replacement) = std::env::var(var) {
                    tracing::trace!(variable = %s, "replaced environment variable");
                    *s = replacement;
                }
            }
        }
        Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                substitute_env(v);
            }
        }
        Value::Array(array) => {
            for v in array.iter_mut() {
                substitute_env(v);
            }
        }
        _ => {}
    }
}

// Matches `$WORD` or `${WORD}` where WORD is `[A-Za-z0-9_]+`, anchored to
// the whole string.
fn env_var_name(s: &str) -> Option<&str> {
    let rest = s.strip_prefix('$')?;
    let name = rest
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(rest);
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_string_references_match() {
        assert_eq!(env_var_name("$HOME"), Some("HOME"));
        assert_eq!(env_var_name("${HOME}"), Some("HOME"));
        assert_eq!(env_var_name("$MY_VAR_2"), Some("MY_VAR_2"));
    }

    #[test]
    fn partial_or_malformed_references_ignored() {
        assert_eq!(env_var_name("prefix $HOME"), None);
        assert_eq!(env_var_name("$HOME/suffix"), None);
        assert_eq!(env_var_name("${HOME"), None);
        assert_eq!(env_var_name("$"), None);
        assert_eq!(env_var_name("plain"), None);
    }

    #[test]
    fn substitutes_nested_values() {
        std::env::set_var("OPTIC_ENV_TEST_TOKEN", "secret");

        let mut value: Value = toml::from_str(
            r#"
[sinks.http]
kind = "http"
token = "$OPTIC_ENV_TEST_TOKEN"
urls = ["${OPTIC_ENV_TEST_TOKEN}", "literal"]
"#,
        )
        .unwrap();

        substitute_env(&mut value);

        let sink = value["sinks"]["http"].as_table().unwrap();
        assert_eq!(sink["token"].as_str(), Some("secret"));
        assert_eq!(sink["urls"][0].as_str(), Some("secret"));
        assert_eq!(sink["urls"][1].as_str(), Some("literal"));
    }

    #[test]
    fn unset_variable_left_untouched() {
        let mut value = Value::String("$OPTIC_ENV_TEST_UNSET_VARIABLE".into());
        substitute_env(&mut value);
        assert_eq!(value.as_str(), Some("$OPTIC_ENV_TEST_UNSET_VARIABLE"));
    }
}
