//! Placeholder expansion over a variable table.
//!
//! A placeholder is a name wrapped in [`VAR_CHAR`], e.g. `#name#`. Values
//! are expanded recursively; the chain of names currently being expanded
//! is threaded through the recursion so that self references and runaway
//! nesting are reported instead of overflowing the stack.

use std::collections::{BTreeMap, HashMap};

use crate::error::RuntimeError;

pub const VAR_CHAR: char = '#';
/// Longest name (in chars) recognised between two sigils.
pub const VAR_LENGTH: usize = 32;
/// Maximum number of nested expansions.
pub const VAR_DEPTH: usize = 16;

/// Read-only view of a variable table.
pub trait Variables {
    fn get_var(&self, name: &str) -> Option<&str>;
}

impl Variables for HashMap<String, String> {
    fn get_var(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Variables for BTreeMap<String, String> {
    fn get_var(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Expands every known placeholder in `input`.
pub fn expand<V: Variables + ?Sized>(values: &V, input: &str) -> Result<String, RuntimeError> {
    let mut stack = Vec::new();
    expand_with_stack(values, input, &mut stack)
}

/// Expands `input` with `stack` holding the names already being expanded.
pub fn expand_with_stack<V: Variables + ?Sized>(
    values: &V,
    input: &str,
    stack: &mut Vec<String>,
) -> Result<String, RuntimeError> {
    if !input.contains(VAR_CHAR) {
        return Ok(input.to_string());
    }
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len());
    let mut name = String::new();
    let mut name_len = 0;
    let mut in_name = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != VAR_CHAR {
            if in_name {
                name.push(c);
                name_len += 1;
                if name_len > VAR_LENGTH {
                    result.push(VAR_CHAR);
                    result.push_str(&name);
                    name.clear();
                    name_len = 0;
                    in_name = false;
                }
            } else {
                result.push(c);
            }
            i += 1;
            continue;
        }
        if !in_name {
            in_name = true;
            i += 1;
            continue;
        }
        match values.get_var(&name) {
            Some(value) => {
                if stack.len() >= VAR_DEPTH {
                    return Err(RuntimeError::VarTooDeep);
                }
                if stack.iter().any(|item| *item == name) {
                    return Err(RuntimeError::VarLoop(name));
                }
                stack.push(name.clone());
                let expanded = expand_with_stack(values, value, stack)?;
                stack.pop();
                result.push_str(&expanded);
                i += 1;
            }
            None => {
                // The closing sigil may open the next placeholder; look at it again.
                result.push(VAR_CHAR);
                result.push_str(&name);
            }
        }
        name.clear();
        name_len = 0;
        in_name = false;
    }
    if in_name {
        result.push(VAR_CHAR);
        result.push_str(&name);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn expands_nested_placeholders() {
        let values = vars(&[("A", "x#B#y"), ("B", "mid")]);
        assert_eq!(expand(&values, "#A#").unwrap(), "xmidy");
    }

    #[test]
    fn reports_self_reference() {
        let values = vars(&[("A", "#A#")]);
        let err = expand(&values, "#A#").unwrap_err();
        assert!(matches!(err, RuntimeError::VarLoop(name) if name == "A"));
    }

    #[test]
    fn reports_indirect_loop() {
        let values = vars(&[("A", "#B#"), ("B", "c #A#")]);
        let err = expand(&values, "start #A#").unwrap_err();
        assert!(matches!(err, RuntimeError::VarLoop(name) if name == "A"));
    }

    #[test]
    fn leaves_unknown_placeholders_untouched() {
        let values = vars(&[]);
        assert_eq!(expand(&values, "#missing#").unwrap(), "#missing#");
        assert_eq!(expand(&values, "a ## b").unwrap(), "a ## b");
    }

    #[test]
    fn closing_sigil_of_unknown_name_can_open_next() {
        let values = vars(&[("B", "bee")]);
        assert_eq!(expand(&values, "#A#B#").unwrap(), "#Abee");
        assert_eq!(expand(&values, "50# off #B#").unwrap(), "50# off bee");
    }

    #[test]
    fn emits_unterminated_name_literally() {
        let values = vars(&[("A", "x")]);
        assert_eq!(expand(&values, "cost #A# and #A").unwrap(), "cost x and #A");
    }

    #[test]
    fn long_names_are_not_placeholders() {
        let long = "n".repeat(VAR_LENGTH + 1);
        let values = vars(&[(long.as_str(), "value"), ("B", "bee")]);
        let input = format!("#{long}#B#");
        assert_eq!(expand(&values, &input).unwrap(), format!("#{long}bee"));

        let fits = "n".repeat(VAR_LENGTH);
        let values = vars(&[(fits.as_str(), "value")]);
        assert_eq!(expand(&values, &format!("#{fits}#")).unwrap(), "value");
    }

    #[test]
    fn limits_expansion_depth() {
        let mut values = HashMap::new();
        for i in 1..=VAR_DEPTH {
            values.insert(format!("V{i}"), format!("#V{}#", i + 1));
        }
        values.insert(format!("V{}", VAR_DEPTH), "end".to_string());
        assert_eq!(expand(&values, "#V1#").unwrap(), "end");

        values.insert(format!("V{}", VAR_DEPTH), format!("#V{}#", VAR_DEPTH + 1));
        values.insert(format!("V{}", VAR_DEPTH + 1), "end".to_string());
        assert!(matches!(
            expand(&values, "#V1#").unwrap_err(),
            RuntimeError::VarTooDeep
        ));
    }

    #[test]
    fn handles_multibyte_text() {
        let values = vars(&[("имя", "мир")]);
        assert_eq!(expand(&values, "привет, #имя#!").unwrap(), "привет, мир!");
    }
}
