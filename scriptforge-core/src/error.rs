use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a compilation. No partial output survives one of these.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("script '{0}' was not found")]
    ScriptNotFound(String),
    #[error("field '{field}' of script '{script}' is required")]
    FieldRequired { field: String, script: String },
    #[error("field '{field}' of script '{script}' expects an integer, got '{value}'")]
    InvalidNumber {
        field: String,
        script: String,
        value: String,
    },
    #[error("failed to encode list value: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode predefined variables: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to read script library entry {path}: {source}")]
    LibraryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script definition in {path}: {message}")]
    LibraryParse { path: PathBuf, message: String },
}

/// Failures raised by the functions the generated program calls back into.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{0} variable refers to itself")]
    VarLoop(String),
    #[error("maximum depth reached")]
    VarTooDeep,
    #[error("no variable scope is open")]
    NoScope,
    #[error("deinit called without a matching init")]
    ScopeUnderflow,
    #[error("invalid variable table: {0}")]
    InvalidVars(#[from] serde_yaml::Error),
    #[error("unknown runtime function '{0}'")]
    UnknownFunction(String),
    #[error("runtime function '{name}' received invalid arguments")]
    InvalidArguments { name: String },
}
