//! `$name` / `${name}` placeholder substitution over the cmake dictionary.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Variables made available by the host editor, e.g. `project_path`.
pub type Variables = BTreeMap<String, String>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\}|(?P<invalid>))",
    )
    .expect("placeholder pattern is valid")
});

/// Substitute every placeholder in `template`.
///
/// `$$` yields a literal `$`. Any other `$` that does not start a valid
/// placeholder is reported with its 1-based line and column.
pub fn expand_str(template: &str, variables: &Variables) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&template[last..whole.start]);
        out.push_str(&substitution(template, whole.start, &caps, variables)?);
        last = whole.end;
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn substitution(
    template: &str,
    at: usize,
    caps: &Captures<'_>,
    variables: &Variables,
) -> Result<String> {
    if caps.name("escaped").is_some() {
        return Ok("$".to_string());
    }
    if let Some(name) = caps.name("named").or_else(|| caps.name("braced")) {
        return variables
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| Error::UnknownVariable(name.as_str().to_string()));
    }
    let prefix = &template[..at];
    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map_or(0, |p| p + 1);
    let col = prefix[line_start..].chars().count() + 1;
    Err(Error::InvalidPlaceholder { line, col })
}

/// Expand all strings inside `value`, descending into arrays and mappings.
/// Mapping keys and non-string scalars are left alone.
pub fn expand_value(value: &Value, variables: &Variables) -> Result<Value> {
    Ok(match value {
        Value::String(s) => Value::String(expand_str(s, variables)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| expand_value(item, variables))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => Value::Object(expand_map(map, variables)?),
        other => other.clone(),
    })
}

pub fn expand_map(map: &Map<String, Value>, variables: &Variables) -> Result<Map<String, Value>> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), expand_value(value, variables)?)))
        .collect()
}

/// Expand `map` in place. On error `map` is left untouched.
pub fn expand_in_place(map: &mut Map<String, Value>, variables: &Variables) -> Result<()> {
    *map = expand_map(map, variables)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars() -> Variables {
        Variables::from([
            ("project_path".to_string(), "/home/me/proj".to_string()),
            ("project_base_name".to_string(), "proj".to_string()),
        ])
    }

    #[test]
    fn named_and_braced() {
        let s = expand_str("$project_path/build-${project_base_name}", &vars()).unwrap();
        assert_eq!(s, "/home/me/proj/build-proj");
    }

    #[test]
    fn dollar_escape() {
        assert_eq!(expand_str("cost: $$5", &vars()).unwrap(), "cost: $5");
    }

    #[test]
    fn unknown_variable() {
        let err = expand_str("${nope}/x", &vars()).unwrap_err();
        assert!(matches!(err, Error::UnknownVariable(name) if name == "nope"));
    }

    #[test]
    fn invalid_placeholder_position() {
        let err = expand_str("ok\n  ${1bad}", &vars()).unwrap_err();
        assert!(matches!(err, Error::InvalidPlaceholder { line: 2, col: 3 }));

        let err = expand_str("trailing $", &vars()).unwrap_err();
        assert!(matches!(err, Error::InvalidPlaceholder { line: 1, col: 10 }));
    }

    #[test]
    fn recurses_into_nested_values() {
        let value = json!({
            "build_folder": "$project_path/build",
            "command_line_overrides": {
                "CMAKE_INSTALL_PREFIX": "${project_path}/install",
                "BUILD_TESTING": true,
                "JOBS": 4
            },
            "linux": { "args": ["$project_base_name", null] }
        });
        let expanded = expand_value(&value, &vars()).unwrap();
        assert_eq!(
            expanded,
            json!({
                "build_folder": "/home/me/proj/build",
                "command_line_overrides": {
                    "CMAKE_INSTALL_PREFIX": "/home/me/proj/install",
                    "BUILD_TESTING": true,
                    "JOBS": 4
                },
                "linux": { "args": ["proj", null] }
            })
        );
    }

    #[test]
    fn idempotent_once_resolved() {
        let value = json!({ "build_folder": "${project_path}/build", "generator": "Ninja" });
        let once = expand_value(&value, &vars()).unwrap();
        let twice = expand_value(&once, &vars()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn failed_expansion_leaves_map_untouched() {
        let mut map = json!({ "a": "$project_path", "b": "$missing" })
            .as_object()
            .cloned()
            .unwrap();
        let before = map.clone();
        assert!(expand_in_place(&mut map, &vars()).is_err());
        assert_eq!(map, before);
    }
}
