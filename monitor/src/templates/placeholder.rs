//! Placeholder extraction and substitution.
//!
//! Placeholders use the grammar `{{ name [: description] [: default] }}`:
//!
//! - `name` may not contain `:` or `}`
//! - `description` may not contain `:` or `}` and may be empty
//! - `default` may not contain `}` and may be empty
//!
//! The default runs from the second `:` to the closing braces, so it may
//! itself contain `:`. Every segment is trimmed.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use cursor_helper::templates::{extract_variables, substitute_variables};
//!
//! let content = "Hi {{name:Your name}}, goal: {{goal:Aim::ship it}}";
//! let vars = extract_variables(content);
//! assert_eq!(vars[1].default_value.as_deref(), Some(":ship it"));
//!
//! let values = HashMap::from([("name".to_string(), "Ann".to_string())]);
//! assert_eq!(
//!     substitute_variables(content, &values),
//!     "Hi Ann, goal: {{goal:Aim::ship it}}"
//! );
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::model::Placeholder;

/// Full grammar, capturing name, description and default.
static EXTRACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^:}]+)(?::([^:}]*))?(?::([^}]*))?\}\}").expect("Invalid regex")
});

/// Name prefix plus anything up to the closing braces.
static SUBSTITUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^:}]+)(?::[^}]*)?\}\}").expect("Invalid regex"));

/// Lists the placeholders in `content` in first-occurrence order.
///
/// Later occurrences of a name are ignored, including their description
/// and default. Names that are blank after trimming are skipped.
#[must_use]
pub fn extract_variables(content: &str) -> Vec<Placeholder> {
    let mut seen = HashSet::new();
    let mut variables = Vec::new();

    for caps in EXTRACT_RE.captures_iter(content) {
        let name = caps[1].trim();
        if name.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }

        let description = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let default_value = caps.get(3).map(|m| m.as_str().trim().to_string());

        variables.push(Placeholder {
            name: name.to_string(),
            description,
            default_value,
        });
    }

    variables
}

/// Replaces every placeholder whose name is in `values` with the value, verbatim.
///
/// Placeholders without a value are left as written. Values are inserted
/// as-is and are never scanned again.
#[must_use]
pub fn substitute_variables(content: &str, values: &HashMap<String, String>) -> String {
    SUBSTITUTE_RE
        .replace_all(content, |caps: &Captures<'_>| {
            match values.get(caps[1].trim()) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Values taken from each placeholder's default, for names that have one.
#[must_use]
pub fn default_values(placeholders: &[Placeholder]) -> HashMap<String, String> {
    placeholders
        .iter()
        .filter_map(|p| {
            p.default_value
                .as_ref()
                .map(|d| (p.name.clone(), d.clone()))
        })
        .collect()
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

    fn ph(name: &str, description: Option<&str>, default_value: Option<&str>) -> Placeholder {
        Placeholder {
            name: name.into(),
            description: description.map(Into::into),
            default_value: default_value.map(Into::into),
        }
    }

    #[test]
    fn extract_reads_all_three_forms() {
        let vars = extract_variables("{{a}} {{b:Desc}} {{c:Desc:dflt}}");
        assert_eq!(
            vars,
            vec![
                ph("a", None, None),
                ph("b", Some("Desc"), None),
                ph("c", Some("Desc"), Some("dflt")),
            ]
        );
    }

    #[test]
    fn extract_greeting_scenario() {
        let vars = extract_variables("Hi {{name:Your name}}, goal: {{goal:Aim::ship it}}");
        assert_eq!(
            vars,
            vec![
                ph("name", Some("Your name"), None),
                ph("goal", Some("Aim"), Some(":ship it")),
            ]
        );
    }

    #[test]
    fn extract_keeps_first_occurrence_only() {
        let vars = extract_variables("{{x:first:1}} then {{x:second:2}} and {{y}}");
        assert_eq!(vars, vec![ph("x", Some("first"), Some("1")), ph("y", None, None)]);
    }

    #[test]
    fn extract_empty_default_differs_from_missing() {
        let vars = extract_variables("{{x::}} {{y}}");
        assert_eq!(vars[0], ph("x", None, Some("")));
        assert_eq!(vars[1].default_value, None);
    }

    #[test]
    fn extract_default_keeps_extra_colons() {
        let vars = extract_variables("{{url::http://x:8080}} {{t:Time:12:30}}");
        assert_eq!(
            vars,
            vec![ph("url", None, Some("http://x:8080")), ph("t", Some("Time"), Some("12:30"))]
        );
    }

    #[test]
    fn extract_trims_segments() {
        let vars = extract_variables("{{  file : The file :  main.rs  }}");
        assert_eq!(vars, vec![ph("file", Some("The file"), Some("main.rs"))]);
    }

    #[test]
    fn extract_skips_blank_names() {
        assert!(extract_variables("{{   }} {{ :desc}}").is_empty());
    }

    #[test]
    fn extract_ignores_single_braces() {
        assert!(extract_variables("fn main() { let x = {a}; }").is_empty());
    }

    #[test]
    fn extract_is_idempotent() {
        let content = "{{a:A}} {{b::2}} {{a}} {{c}}";
        assert_eq!(extract_variables(content), extract_variables(content));
    }

    #[test]
    fn substitute_replaces_every_occurrence() {
        let out = substitute_variables(
            "{{x:first}} and {{ x :other:d}} and {{y}}",
            &values(&[("x", "X")]),
        );
        assert_eq!(out, "X and X and {{y}}");
    }

    #[test]
    fn substitute_with_empty_map_is_identity() {
        let content = "Hi {{name:Your name}}, goal: {{goal:Aim::ship it}} {plain}";
        assert_eq!(substitute_variables(content, &HashMap::new()), content);
    }

    #[test]
    fn substitute_is_not_recursive() {
        let out = substitute_variables("{{a}}", &values(&[("a", "{{b}}"), ("b", "B")]));
        assert_eq!(out, "{{b}}");
    }

    #[test]
    fn full_substitution_leaves_no_covered_placeholders() {
        let content = "Fix {{file:File}} where {{expected:What should happen}} fails";
        let map = values(&[("file", "lib.rs"), ("expected", "parsing")]);
        let out = substitute_variables(content, &map);
        assert_eq!(out, "Fix lib.rs where parsing fails");
        assert!(extract_variables(&out).is_empty());
    }

    #[test]
    fn round_trip_keeps_unsubstituted_names() {
        let content = "{{a}} {{b:B}} {{c:C:3}}";
        let out = substitute_variables(content, &values(&[("b", "bee")]));
        let names: Vec<_> = extract_variables(&out).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn nested_brace_in_default_ends_at_first_closing_pair() {
        // The span stops at the first `}}`, so one `}` is left behind.
        let content = "{{x:d:{a}}}";
        assert_eq!(extract_variables(content), vec![ph("x", Some("d"), Some("{a"))]);
        assert_eq!(substitute_variables(content, &values(&[("x", "V")])), "V}");
    }

    #[test]
    fn default_values_only_includes_declared_defaults() {
        let vars = extract_variables("{{a}} {{b:B:bee}} {{c::}}");
        let defaults = default_values(&vars);
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults["b"], "bee");
        assert_eq!(defaults["c"], "");
    }
}
