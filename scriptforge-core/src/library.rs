use std::collections::HashMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::CoreError;
use crate::model::ScriptDefinition;

/// Lookup of script definitions by name.
pub trait ScriptResolver {
    fn resolve(&self, name: &str) -> Option<&ScriptDefinition>;
}

impl ScriptResolver for HashMap<String, ScriptDefinition> {
    fn resolve(&self, name: &str) -> Option<&ScriptDefinition> {
        self.get(name)
    }
}

/// In-memory set of definitions, usually loaded from a directory.
#[derive(Debug, Clone, Default)]
pub struct ScriptLibrary {
    scripts: HashMap<String, ScriptDefinition>,
}

impl ScriptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `definition`, returning the one it replaced.
    pub fn insert(&mut self, definition: ScriptDefinition) -> Option<ScriptDefinition> {
        self.scripts.insert(definition.name.clone(), definition)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }
}

impl ScriptResolver for ScriptLibrary {
    fn resolve(&self, name: &str) -> Option<&ScriptDefinition> {
        self.scripts.get(name)
    }
}

impl FromIterator<ScriptDefinition> for ScriptLibrary {
    fn from_iter<I: IntoIterator<Item = ScriptDefinition>>(iter: I) -> Self {
        let mut library = ScriptLibrary::new();
        for definition in iter {
            library.insert(definition);
        }
        library
    }
}

/// Loads every `*.yaml`, `*.yml` and `*.json` file under `root` as one definition.
pub fn load_library(root: impl AsRef<Path>) -> Result<ScriptLibrary, CoreError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(CoreError::LibraryIo {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }
    let mut library = ScriptLibrary::new();
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if !path.is_file() || !matches!(ext, "yaml" | "yml" | "json") {
            continue;
        }
        let contents = fs::read_to_string(path).map_err(|source| CoreError::LibraryIo {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = if ext == "json" {
            serde_json::from_str::<ScriptDefinition>(&contents).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str::<ScriptDefinition>(&contents).map_err(|err| err.to_string())
        };
        let definition = parsed.map_err(|message| CoreError::LibraryParse {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!(name = %definition.name, path = %path.display(), "loaded script definition");
        if let Some(previous) = library.insert(definition) {
            tracing::warn!(name = %previous.name, "duplicate script definition replaced");
        }
    }
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;

    #[test]
    fn loads_yaml_and_json_definitions_recursively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).expect("create nested dir");
        fs::write(
            dir.path().join("hello.yaml"),
            "name: hello\nlog_level: 2\ncode: Println(msg)\n",
        )
        .expect("write yaml");
        fs::write(nested.join("bye.json"), r#"{"name": "bye", "code": "Println(`bye`)"}"#)
            .expect("write json");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");

        let library = load_library(dir.path()).expect("library should load");
        assert_eq!(library.len(), 2);
        assert_eq!(library.resolve("hello").unwrap().log_level, LogLevel::Warn);
        assert_eq!(library.resolve("bye").unwrap().log_level, LogLevel::Inherit);
        assert!(library.resolve("notes").is_none());
    }

    #[test]
    fn reports_malformed_definition() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("broken.yaml"), "params: [").expect("write yaml");
        let err = load_library(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::LibraryParse { .. }));
    }

    #[test]
    fn reports_missing_root() {
        let err = load_library("./path/that/does/not/exist").unwrap_err();
        assert!(matches!(err, CoreError::LibraryIo { .. }));
    }
}
