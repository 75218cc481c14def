//! Language-scoped predefined variables of a definition.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::model::{DEFAULT_LANG, ScriptDefinition};
use crate::string_pool::StringPool;

/// Keys with this prefix are internal to the definition and never exported.
pub const RESERVED_PREFIX: char = '_';

/// Runtime function that loads a serialized table into the current scope.
pub const LOAD_VARS_FN: &str = "SetYamlVars";

/// Default-language table overlaid with the `lang` table, reserved keys removed.
pub fn merged_vars(definition: &ScriptDefinition, lang: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    let mut overlay = |code: &str| {
        if let Some(table) = definition.langs.get(code) {
            for (name, value) in table {
                if !name.starts_with(RESERVED_PREFIX) {
                    vars.insert(name.clone(), value.clone());
                }
            }
        }
    };
    overlay(DEFAULT_LANG);
    if lang != DEFAULT_LANG {
        overlay(lang);
    }
    vars
}

/// Builds the statement that loads the predefined variables, if there are any.
pub fn build(
    pool: &mut StringPool,
    definition: &ScriptDefinition,
    lang: &str,
) -> Result<Option<String>, CoreError> {
    let vars = merged_vars(definition, lang);
    if vars.is_empty() {
        return Ok(None);
    }
    let data = serde_yaml::to_string(&vars)?;
    Ok(Some(format!("{LOAD_VARS_FN}({})\n", pool.intern(&data))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> ScriptDefinition {
        let mut def = ScriptDefinition::new("demo");
        def.langs.insert(
            DEFAULT_LANG.to_string(),
            BTreeMap::from([
                ("greeting".to_string(), "Hello".to_string()),
                ("target".to_string(), "world".to_string()),
                ("_desc".to_string(), "internal".to_string()),
            ]),
        );
        def.langs.insert(
            "fr".to_string(),
            BTreeMap::from([
                ("greeting".to_string(), "Bonjour".to_string()),
                ("_desc".to_string(), "interne".to_string()),
            ]),
        );
        def
    }

    #[test]
    fn overlays_current_language() {
        let vars = merged_vars(&definition(), "fr");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["greeting"], "Bonjour");
        assert_eq!(vars["target"], "world");
    }

    #[test]
    fn unknown_language_keeps_defaults() {
        let vars = merged_vars(&definition(), "de");
        assert_eq!(vars["greeting"], "Hello");
        assert!(!vars.contains_key("_desc"));
    }

    #[test]
    fn emits_load_statement_with_yaml_constant() {
        let mut pool = StringPool::new();
        let statement = build(&mut pool, &definition(), "en").unwrap();
        assert_eq!(statement.as_deref(), Some("SetYamlVars(STR0)\n"));
        let loaded: BTreeMap<String, String> =
            serde_yaml::from_str(&pool.strings()[0]).expect("valid yaml");
        assert_eq!(loaded["greeting"], "Hello");
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn nothing_to_load_without_public_keys() {
        let mut def = ScriptDefinition::new("bare");
        def.langs.insert(
            DEFAULT_LANG.to_string(),
            BTreeMap::from([("_title".to_string(), "Bare".to_string())]),
        );
        let mut pool = StringPool::new();
        assert_eq!(build(&mut pool, &def, "en").unwrap(), None);
        assert!(pool.is_empty());
    }
}
