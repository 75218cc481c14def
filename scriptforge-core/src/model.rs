//! Data model shared by the compiler and the definition library.
//!
//! Script nodes and definitions are produced by the external editor and
//! are read-only here. Raw parameter values stay loosely typed
//! (`serde_json::Value`) until the coercion step turns them into
//! literals.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::macro_engine;

/// Language code whose table holds the definition-default variables.
pub const DEFAULT_LANG: &str = "en";

/// Name of the definition whose parameter is inlined as raw source.
pub const SOURCE_CODE: &str = "source-code";

/// Placeholder in a definition's code template replaced by the compiled children.
pub const BODY_PLACEHOLDER: &str = "%body%";

/// Verbosity of script log output. `Inherit` means "use the caller's level".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "i64")]
pub enum LogLevel {
    Disable = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Inherit = 5,
}

impl LogLevel {
    /// The real severities, ascending. `Inherit` is not one of them.
    pub const SEVERITIES: [LogLevel; 5] = [
        LogLevel::Disable,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(LogLevel::Disable),
            1 => Some(LogLevel::Error),
            2 => Some(LogLevel::Warn),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Debug),
            5 => Some(LogLevel::Inherit),
            _ => None,
        }
    }

    /// Label printed in front of emitted log lines.
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Disable => "",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Inherit => "INHERIT",
        }
    }

    /// Constant name used in the generated severity enumeration.
    pub fn constant_name(self) -> String {
        match self {
            LogLevel::Disable => "LOG_DISABLE".to_string(),
            other => format!("LOG_{}", other.label()),
        }
    }

    pub fn is_inherit(self) -> bool {
        self == LogLevel::Inherit
    }
}

impl TryFrom<i64> for LogLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, String> {
        LogLevel::from_i64(value).ok_or_else(|| format!("log level {value} is out of range"))
    }
}

/// Definition files spell a level either as a number or by name.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Number(value) => LogLevel::try_from(value),
            LevelRepr::Name(name) => name.parse(),
        }
        .map_err(de::Error::custom)
    }
}

impl From<LogLevel> for i64 {
    fn from(level: LogLevel) -> Self {
        level.as_i64()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Disable => f.write_str("disable"),
            other => f.write_str(&other.label().to_ascii_lowercase()),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = s.parse::<i64>() {
            return LogLevel::try_from(number);
        }
        match s.to_ascii_lowercase().as_str() {
            "disable" | "off" => Ok(LogLevel::Disable),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "inherit" => Ok(LogLevel::Inherit),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Kind of a declared parameter; decides how its raw value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Checkbox,
    Textarea,
    SingleText,
    Select,
    Number,
    List,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOptions {
    pub required: bool,
    pub default: String,
    /// For `Select`: when set, the raw value is passed through with this type.
    #[serde(rename = "type")]
    pub passthrough_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub options: ParamOptions,
}

impl ParamSpec {
    /// Title shown to the user, falling back to the parameter name.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}

/// One invocation of a definition inside the user-authored tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptNode {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub children: Vec<ScriptNode>,
}

impl ScriptNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, param: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(param.into(), value);
        self
    }

    pub fn with_child(mut self, child: ScriptNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// A named, parameterized code template registered once and referenced by many nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDefinition {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "inherit_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub tree: Vec<ScriptNode>,
    #[serde(default)]
    pub langs: BTreeMap<String, BTreeMap<String, String>>,
}

fn inherit_level() -> LogLevel {
    LogLevel::Inherit
}

impl ScriptDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            log_level: LogLevel::Inherit,
            code: String::new(),
            params: Vec::new(),
            tree: Vec::new(),
            langs: BTreeMap::new(),
        }
    }

    pub fn is_raw_source(&self) -> bool {
        self.name == SOURCE_CODE
    }

    /// Resolves `#key#` placeholders in `text` against this definition's
    /// language tables: `lang` first, then the default language.
    /// Unknown or malformed placeholders are left as written.
    pub fn localize(&self, text: &str, lang: &str) -> String {
        let mut table = BTreeMap::new();
        for code in [DEFAULT_LANG, lang] {
            if let Some(entries) = self.langs.get(code) {
                table.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        macro_engine::expand(&table, text).unwrap_or_else(|_| text.to_string())
    }

    pub fn localized_title(&self, lang: &str) -> String {
        let title = if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        };
        self.localize(title, lang)
    }
}

/// Settings supplied by the caller for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Active UI language code.
    pub lang: String,
    /// Level used when the root definition declares `Inherit`.
    pub default_log_level: LogLevel,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            default_log_level: LogLevel::Info,
        }
    }
}

/// Turns a definition name into an identifier usable as a function name.
pub fn ident_name(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
