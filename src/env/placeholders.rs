use thiserror::Error;

use crate::env::EnvMap;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("Empty template placeholder")]
    Empty,
    #[error("Invalid template variable: {0}")]
    InvalidKey(String),
    #[error("Missing template variable: {0}")]
    Missing(String),
}

impl PlaceholderError {
    /// Name of the variable that could not be resolved, if any.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Missing(key) | Self::InvalidKey(key) => Some(key),
            Self::Empty => None,
        }
    }
}

/// Replace `{NAME}` placeholders with values from `vars`.
///
/// `\{` and `\}` produce literal braces. A `{` that is not followed by a
/// valid start character is copied through unchanged, so JSON-looking text
/// survives expansion.
pub fn expand_placeholders(input: &str, vars: &EnvMap) -> Result<String, PlaceholderError> {
    expand_with(input, |key| vars.get(key).cloned())
}

/// Same as [`expand_placeholders`], with a caller-supplied lookup.
pub fn expand_with<F>(input: &str, lookup: F) -> Result<String, PlaceholderError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(&next) = chars.peek() {
                    match next {
                        '{' | '}' => {
                            output.push(next);
                            chars.next();
                        }
                        _ => {
                            output.push('\\');
                            output.push(next);
                            chars.next();
                        }
                    }
                } else {
                    output.push('\\');
                }
            }
            '{' => {
                let Some(&next_char) = chars.peek() else {
                    output.push('{');
                    continue;
                };
                if !is_start_char(next_char) {
                    output.push('{');
                    continue;
                }

                let mut key = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '}' {
                        chars.next();
                        break;
                    }
                    key.push(next);
                    chars.next();
                }

                if key.is_empty() {
                    return Err(PlaceholderError::Empty);
                }

                if !is_valid_key(&key) {
                    return Err(PlaceholderError::InvalidKey(key));
                }

                let value = lookup(&key).ok_or(PlaceholderError::Missing(key))?;
                output.push_str(&value);
            }
            _ => output.push(ch),
        }
    }

    Ok(output)
}

/// Names of every placeholder referenced by `input`, in order of appearance.
pub fn referenced_variables(input: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' if chars.peek().copied().is_some_and(is_start_char) => {
                let mut key = String::new();
                for next in chars.by_ref() {
                    if next == '}' {
                        break;
                    }
                    key.push(next);
                }
                if is_valid_key(&key) && !names.contains(&key) {
                    names.push(key);
                }
            }
            _ => {}
        }
    }

    names
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if is_start_char(c) => {}
        _ => return false,
    }

    for ch in chars {
        let valid = ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-');
        if !valid {
            return false;
        }
    }
    true
}

fn is_start_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn expand_placeholders_substitutes_known_values() {
        let env = vars(&[("task_id", "abc123")]);
        let rendered = expand_placeholders("/tasks/{task_id}", &env).unwrap();
        assert_eq!(rendered, "/tasks/abc123");
    }

    #[test]
    fn expand_placeholders_ignores_process_environment() {
        let env = EnvMap::new();
        let err = expand_placeholders("{PATH}", &env).unwrap_err();
        assert_eq!(err, PlaceholderError::Missing("PATH".to_string()));
    }

    #[test]
    fn expand_placeholders_rejects_invalid_keys() {
        let env = EnvMap::new();
        let err = expand_placeholders("{BAD!}", &env).unwrap_err();
        assert!(err.to_string().contains("Invalid template variable"));
        assert_eq!(err.variable(), Some("BAD!"));
    }

    #[test]
    fn expand_placeholders_leaves_non_placeholder_braces() {
        let env = EnvMap::new();
        let rendered = expand_placeholders(r#"{"a": 1} { } \{x\}"#, &env).unwrap();
        assert_eq!(rendered, r#"{"a": 1} { } {x}"#);
    }

    #[test]
    fn expand_with_uses_custom_lookup() {
        let rendered = expand_with("{HOST}/api", |key| {
            (key == "HOST").then(|| "https://example.com".to_string())
        })
        .unwrap();
        assert_eq!(rendered, "https://example.com/api");
    }

    #[test]
    fn referenced_variables_lists_each_name_once() {
        let names = referenced_variables("/users/{user_id}/tasks/{task_id}?again={user_id}");
        assert_eq!(names, vec!["user_id".to_string(), "task_id".to_string()]);
        assert!(referenced_variables("/health").is_empty());
        assert!(referenced_variables(r"\{literal}").is_empty());
    }
}
