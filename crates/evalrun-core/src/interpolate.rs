//! `{{key}}` placeholder substitution for prompt templates.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// Escaped open braces are matched first so `\{{name}}` never reaches the
// placeholder branch.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\\{\{|\{\{([a-zA-Z0-9_.-]+)\}\}").expect("placeholder pattern is valid")
});

/// Replace every `{{key}}` with `values[key]`.
///
/// Keys may contain letters, digits, `_`, `.` and `-`. Placeholders whose key
/// is absent are left verbatim. A backslash before the braces (`\{{`) emits a
/// literal `{{`.
pub fn interpolate(template: &str, values: &HashMap<String, String>) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }

    let replaced: Cow<'_, str> = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match caps.get(1) {
            None => "{{".to_string(),
            Some(key) => values
                .get(key.as_str())
                .cloned()
                .unwrap_or_else(|| caps[0].to_string()),
        }
    });
    replaced.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn replaces_known_placeholders() {
        assert_eq!(
            interpolate("Hello {{name}}", &values(&[("name", "Ada")])),
            "Hello Ada"
        );
    }

    #[test]
    fn unknown_placeholders_stay_verbatim() {
        assert_eq!(
            interpolate("Hello {{name}} {{unknown}}", &values(&[("name", "Ada")])),
            "Hello Ada {{unknown}}"
        );
    }

    #[test]
    fn keys_may_contain_separators() {
        let vals = values(&[("user.name", "Ada"), ("top-k", "3")]);
        assert_eq!(interpolate("{{user.name}}/{{top-k}}", &vals), "Ada/3");
    }

    #[test]
    fn escaped_braces_are_literal() {
        assert_eq!(
            interpolate(r"Show \{{name}} and {{name}}", &values(&[("name", "Ada")])),
            "Show {{name}} and Ada"
        );
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        let vals = values(&[("name", "Ada")]);
        assert_eq!(interpolate("plain text", &vals), "plain text");
        assert_eq!(interpolate("{{ name }}", &vals), "{{ name }}");
        assert_eq!(interpolate("", &vals), "");
    }
}
