//! Process-wide state behind the runtime functions of a generated program.
//!
//! One [`ScriptRuntime`] lives for the duration of one program execution
//! and is shared by reference with the embedding layer. Scope stack and
//! log channel sit behind a single lock; every call takes it exactly once,
//! so macro expansion recursion never re-enters it.

use std::collections::BTreeMap;
use std::fmt;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::error::RuntimeError;
use crate::log_channel::LogChannel;
use crate::macro_engine;
use crate::model::LogLevel;
use crate::runtime_api::{RuntimeKind, find_runtime_function};
use crate::scope::ScopeStack;

/// Value passed between the generated program and the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Str(text) => f.write_str(text),
            ScriptValue::Int(value) => write!(f, "{value}"),
            ScriptValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::Str(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::Str(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        ScriptValue::Int(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

#[derive(Debug)]
struct RuntimeState {
    scopes: ScopeStack,
    log: LogChannel,
}

#[derive(Debug)]
pub struct ScriptRuntime {
    state: Mutex<RuntimeState>,
}

impl ScriptRuntime {
    /// Creates a runtime that forwards log lines to `sink`.
    pub fn new(sink: Sender<String>) -> Self {
        Self {
            state: Mutex::new(RuntimeState {
                scopes: ScopeStack::new(),
                log: LogChannel::new(sink),
            }),
        }
    }

    /// Creates a runtime together with the receiving end of its log channel.
    pub fn with_channel() -> (Self, Receiver<String>) {
        let (sink, receiver) = unbounded();
        (Self::new(sink), receiver)
    }

    /// `init()`: opens a new scope.
    pub fn init(&self) {
        self.state.lock().scopes.enter();
    }

    /// `init(name, value, ...)`: opens a scope seeded with the given variables.
    pub fn init_with<'v>(
        &self,
        vars: impl IntoIterator<Item = (&'v str, &'v ScriptValue)>,
    ) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        state.scopes.enter();
        for (name, value) in vars {
            state.scopes.set_variable(name, value.to_string())?;
        }
        Ok(())
    }

    /// `deinit()`: closes the innermost scope.
    pub fn deinit(&self) -> Result<(), RuntimeError> {
        self.state.lock().scopes.exit()
    }

    /// `initcmd(name, ...)`: traces the call at debug level; always true.
    pub fn init_cmd(&self, name: &str, args: &[ScriptValue]) -> bool {
        self.state.lock().log.trace(name, args);
        true
    }

    /// `LogOutput(level, message)`.
    pub fn log_output(&self, level: i64, message: &str) {
        self.state.lock().log.emit(level, message);
    }

    /// `macro(text)`: expands placeholders against the innermost scope.
    pub fn expand(&self, text: &str) -> Result<String, RuntimeError> {
        let state = self.state.lock();
        let top = state.scopes.top().ok_or(RuntimeError::NoScope)?;
        macro_engine::expand(top, text)
    }

    /// `SetLogLevel(level)`: returns the previous level.
    pub fn set_log_level(&self, level: i64) -> i64 {
        self.state.lock().log.set_level(level)
    }

    pub fn log_level(&self) -> LogLevel {
        self.state.lock().log.level()
    }

    /// `SetVariable(name, value)`: writes into the innermost scope.
    pub fn set_variable(&self, name: &str, value: &str) -> Result<(), RuntimeError> {
        self.state.lock().scopes.set_variable(name, value)
    }

    /// `SetYamlVars(text)`: loads a YAML mapping into the innermost scope.
    pub fn set_yaml_vars(&self, text: &str) -> Result<(), RuntimeError> {
        let vars: BTreeMap<String, String> = serde_yaml::from_str(text)?;
        let mut state = self.state.lock();
        for (name, value) in vars {
            state.scopes.set_variable(name, value)?;
        }
        Ok(())
    }

    pub fn scope_depth(&self) -> usize {
        self.state.lock().scopes.depth()
    }

    /// Dispatches a call made by the generated program by function name.
    pub fn call(
        &self,
        name: &str,
        args: &[ScriptValue],
    ) -> Result<Option<ScriptValue>, RuntimeError> {
        let function =
            find_runtime_function(name).ok_or_else(|| RuntimeError::UnknownFunction(name.into()))?;
        let invalid = || RuntimeError::InvalidArguments { name: name.into() };
        match (function.kind, args) {
            (RuntimeKind::Init, args) if args.len() % 2 == 0 => {
                let mut vars = Vec::with_capacity(args.len() / 2);
                for pair in args.chunks(2) {
                    match &pair[0] {
                        ScriptValue::Str(var) => vars.push((var.as_str(), &pair[1])),
                        _ => return Err(invalid()),
                    }
                }
                self.init_with(vars)?;
                Ok(None)
            }
            (RuntimeKind::Deinit, []) => self.deinit().map(|_| None),
            (RuntimeKind::InitCmd, [ScriptValue::Str(cmd), rest @ ..]) => {
                Ok(Some(ScriptValue::Bool(self.init_cmd(cmd, rest))))
            }
            (RuntimeKind::LogOutput, [ScriptValue::Int(level), ScriptValue::Str(message)]) => {
                self.log_output(*level, message);
                Ok(None)
            }
            (RuntimeKind::Macro, [ScriptValue::Str(text)]) => {
                self.expand(text).map(|out| Some(ScriptValue::Str(out)))
            }
            (RuntimeKind::SetLogLevel, [ScriptValue::Int(level)]) => {
                Ok(Some(ScriptValue::Int(self.set_log_level(*level))))
            }
            (RuntimeKind::SetVariable, [ScriptValue::Str(var), ScriptValue::Str(value)]) => {
                self.set_variable(var, value).map(|_| None)
            }
            (RuntimeKind::SetYamlVars, [ScriptValue::Str(text)]) => {
                self.set_yaml_vars(text).map(|_| None)
            }
            _ => Err(invalid()),
        }
    }
}
