//! Placeholder substitution for template bodies.
//!
//! A placeholder is `open + key + close`, e.g. `{{ user.name }}`. Keys are
//! dot-separated paths into a JSON model; numeric segments index arrays.

use std::borrow::Cow;
use std::collections::BTreeSet;

use regex::{Captures, Regex};
use serde_json::Value;

/// Rendered content together with the keys that were found in the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionResult {
    pub content: String,
    pub matched: BTreeSet<String>,
}

/// Compiled placeholder syntax for one pair of delimiters.
///
/// A tripled token (`{{{ key }}}`, as HTML templates write unescaped values)
/// is a placeholder too and is replaced whole.
#[derive(Debug, Clone)]
pub struct Placeholders {
    open: String,
    raw_open_len: usize,
    pattern: Regex,
}

impl Placeholders {
    pub fn new(open: &str, close: &str) -> Result<Self, regex::Error> {
        let raw_open = format!("{}{}", open, open.chars().last().unwrap_or_default());
        let raw_close = format!("{}{}", close.chars().next().unwrap_or_default(), close);

        // Non-greedy and single-line so an unterminated opener never swallows
        // text from a later line. The tripled form is tried first.
        let pattern = Regex::new(&format!(
            "{}(?P<raw>.*?){}|{}(?P<inner>.*?){}",
            regex::escape(&raw_open),
            regex::escape(&raw_close),
            regex::escape(open),
            regex::escape(close)
        ))?;

        Ok(Self {
            open: open.to_string(),
            raw_open_len: raw_open.len(),
            pattern,
        })
    }

    /// Replaces every placeholder whose key resolves in `model`.
    ///
    /// Unknown keys and unterminated openers are left verbatim.
    pub fn substitute(&self, body: &str, model: &Value) -> SubstitutionResult {
        let mut matched = BTreeSet::new();

        let content = self.pattern.replace_all(body, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let (opener_len, inner) = match caps.name("raw") {
                Some(raw) => (self.raw_open_len, raw.as_str()),
                None => (
                    self.open.len(),
                    caps.name("inner").map_or("", |m| m.as_str()),
                ),
            };

            // `{{ a {{b}}`: the token is the innermost opener; everything
            // before it is literal text.
            let (literal, key) = match inner.rfind(&self.open) {
                Some(idx) => (
                    &whole[..opener_len + idx],
                    &inner[idx + self.open.len()..],
                ),
                None => ("", inner),
            };

            let key = key.trim();
            match lookup(model, key) {
                Some(value) => {
                    matched.insert(key.to_string());
                    format!("{}{}", literal, render(value))
                }
                None => whole.to_string(),
            }
        });

        SubstitutionResult {
            content: content.into_owned(),
            matched,
        }
    }
}

/// One-shot substitution with ad hoc delimiters.
///
/// Falls back to returning `body` unchanged if the delimiters cannot be
/// compiled, which only happens for pathological inputs.
pub fn substitute(body: &str, model: &Value, open: &str, close: &str) -> SubstitutionResult {
    match Placeholders::new(open, close) {
        Ok(placeholders) => placeholders.substitute(body, model),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid placeholder delimiters, leaving body untouched");
            SubstitutionResult {
                content: body.to_string(),
                matched: BTreeSet::new(),
            }
        }
    }
}

fn lookup<'a>(model: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return None;
    }

    key.split('.').try_fold(model, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn render(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn braces() -> Placeholders {
        Placeholders::new("{{", "}}").unwrap()
    }

    #[test]
    fn test_basic_substitution() {
        let result = braces().substitute("Hello {{name}}", &json!({"name": "Ada"}));
        assert_eq!(result.content, "Hello Ada");
        assert_eq!(result.matched, BTreeSet::from(["name".to_string()]));
    }

    #[test]
    fn test_empty_model_leaves_body_unchanged() {
        let result = braces().substitute("Hello {{name}}", &json!({}));
        assert_eq!(result.content, "Hello {{name}}");
        assert!(result.matched.is_empty());
    }

    #[test]
    fn test_whitespace_inside_delimiters_is_ignored() {
        let result = braces().substitute("Hi {{  name }}!", &json!({"name": "Grace"}));
        assert_eq!(result.content, "Hi Grace!");
    }

    #[test]
    fn test_nested_paths_and_array_indexes() {
        let model = json!({
            "user": {"first": "Ada", "tags": ["admin", "ops"]},
            "items": [{"title": "Engine"}]
        });
        let result = braces().substitute(
            "{{user.first}} {{user.tags.1}} {{items.0.title}} {{items.9.title}}",
            &model,
        );
        assert_eq!(result.content, "Ada ops Engine {{items.9.title}}");
        assert_eq!(result.matched.len(), 3);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let result = braces().substitute("{{Name}}", &json!({"name": "Ada"}));
        assert_eq!(result.content, "{{Name}}");
    }

    #[test]
    fn test_value_stringification() {
        let model = json!({
            "n": 42, "f": 1.5, "b": true, "z": null,
            "list": [1, 2], "obj": {"a": 1}
        });
        let result = braces().substitute("{{n}}|{{f}}|{{b}}|{{z}}|{{list}}|{{obj}}", &model);
        assert_eq!(result.content, "42|1.5|true||[1,2]|{\"a\":1}");
        assert!(result.matched.contains("z"));
    }

    #[test]
    fn test_unterminated_opener_left_verbatim() {
        let result = braces().substitute("Hello {{name", &json!({"name": "Ada"}));
        assert_eq!(result.content, "Hello {{name");
    }

    #[test]
    fn test_stray_opener_before_real_token() {
        let result = braces().substitute("a {{ b {{name}}", &json!({"name": "Ada"}));
        assert_eq!(result.content, "a {{ b Ada");
    }

    #[test]
    fn test_tripled_delimiters_are_placeholders() {
        let model = json!({"name": "Ada", "html": "<b>hi</b>"});
        let result = braces().substitute("<p>{{{ html }}}</p> {{{name}}}", &model);
        assert_eq!(result.content, "<p><b>hi</b></p> Ada");
        assert_eq!(result.matched.len(), 2);

        let missing = braces().substitute("{{{nope}}}", &model);
        assert_eq!(missing.content, "{{{nope}}}");
    }

    #[test]
    fn test_custom_delimiters() {
        let placeholders = Placeholders::new("[[", "]]").unwrap();
        let result = placeholders.substitute("Dear [[name]], {{name}}", &json!({"name": "Ada"}));
        assert_eq!(result.content, "Dear Ada, {{name}}");
    }

    #[test]
    fn test_one_shot_substitute() {
        let result = substitute("${x}", &json!({"x": 1}), "${", "}");
        assert_eq!(result.content, "1");
    }

    proptest! {
        #[test]
        fn prop_body_without_delimiters_is_untouched(body in "[^{}]*", key in "[a-z]{1,8}", value in "[a-zA-Z0-9 ]*") {
            let model = json!({ key: value });
            let result = braces().substitute(&body, &model);
            prop_assert_eq!(result.content, body);
            prop_assert!(result.matched.is_empty());
        }

        #[test]
        fn prop_known_key_is_replaced(prefix in "[^{}]*", suffix in "[^{}]*", key in "[a-z]{1,8}", value in "[^{}]*") {
            let model = json!({ key.clone(): value.clone() });
            let body = format!("{}{{{{{}}}}}{}", prefix, key, suffix);
            let result = braces().substitute(&body, &model);
            prop_assert_eq!(result.content, format!("{}{}{}", prefix, value, suffix));
            prop_assert!(result.matched.contains(&key));
        }

        #[test]
        fn prop_substitution_is_deterministic(body in ".*", value in ".*") {
            let model = json!({"name": value});
            let first = braces().substitute(&body, &model);
            let second = braces().substitute(&body, &model);
            prop_assert_eq!(first, second);
        }
    }
}
