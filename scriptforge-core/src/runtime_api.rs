//! Runtime functions visible to the generated program.
//!
//! This module only describes the call surface. The behavior lives in
//! [`crate::runtime::ScriptRuntime`], and the embedding layer of the
//! scripting engine is responsible for registering these prototypes.

/// Kind of runtime function, used to dispatch a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    /// Pushes a scope, optionally seeded with `name, value` pairs.
    Init,
    /// Pops the innermost scope.
    Deinit,
    /// Traces a call and returns `true`.
    InitCmd,
    LogOutput,
    Macro,
    SetLogLevel,
    SetVariable,
    /// Loads a YAML mapping into the innermost scope.
    SetYamlVars,
}

/// Metadata about a single runtime function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFunction {
    /// Name called by the generated program.
    pub name: &'static str,

    /// Prototype in the target language's notation.
    pub prototype: &'static str,

    pub kind: RuntimeKind,
}

/// The complete runtime call surface.
pub const RUNTIME_FUNCTIONS: &[RuntimeFunction] = &[
    RuntimeFunction {
        name: "init",
        prototype: "init(...)",
        kind: RuntimeKind::Init,
    },
    RuntimeFunction {
        name: "initcmd",
        prototype: "initcmd(str, ...) bool",
        kind: RuntimeKind::InitCmd,
    },
    RuntimeFunction {
        name: "deinit",
        prototype: "deinit()",
        kind: RuntimeKind::Deinit,
    },
    RuntimeFunction {
        name: "LogOutput",
        prototype: "LogOutput(int,str)",
        kind: RuntimeKind::LogOutput,
    },
    RuntimeFunction {
        name: "macro",
        prototype: "macro(str) str",
        kind: RuntimeKind::Macro,
    },
    RuntimeFunction {
        name: "SetLogLevel",
        prototype: "SetLogLevel(int) int",
        kind: RuntimeKind::SetLogLevel,
    },
    RuntimeFunction {
        name: "SetVariable",
        prototype: "SetVariable(str,str)",
        kind: RuntimeKind::SetVariable,
    },
    RuntimeFunction {
        name: "SetYamlVars",
        prototype: "SetYamlVars(str)",
        kind: RuntimeKind::SetYamlVars,
    },
];

/// Look up a runtime function by the name the program calls it with.
pub fn find_runtime_function(name: &str) -> Option<&'static RuntimeFunction> {
    RUNTIME_FUNCTIONS.iter().find(|f| f.name == name)
}

/// Runtime functions called anywhere in `source`, in table order.
pub fn collect_calls(source: &str) -> Vec<&'static RuntimeFunction> {
    RUNTIME_FUNCTIONS
        .iter()
        .filter(|f| is_called(source, f.name))
        .collect()
}

fn is_called(source: &str, name: &str) -> bool {
    let pattern = format!("{name}(");
    source.match_indices(&pattern).any(|(start, _)| {
        source[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}
