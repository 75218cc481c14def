//! Core of the ScriptForge automation toolchain.
//!
//! This crate turns a tree of script nodes, built in the visual editor,
//! into the source text of one program for the embedded scripting
//! language, and provides the runtime functions that program calls back
//! into while it runs. The pipeline is roughly:
//!
//!   script tree + definition library
//!     -> coerce     (raw parameter values -> typed literals)
//!     -> compiler   (string pool, function blocks, run block)
//!     -> program text, executed by the external engine
//!     -> runtime    (scopes, macro expansion, log output)
//!
//! Higher-level tools (CLI, web server, etc.) should depend on this
//! crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and data model
// ---------------------------------------------------------------------

pub mod error;
pub mod model;
pub mod library;

// ---------------------------------------------------------------------
// Compilation: string pool, value coercion, predefined variables
// ---------------------------------------------------------------------

pub mod string_pool;
pub mod coerce;
pub mod predefined;
pub mod compiler;

// ---------------------------------------------------------------------
// Runtime support called by the generated program
// ---------------------------------------------------------------------

pub mod runtime_api;
pub mod scope;
pub mod macro_engine;
pub mod log_channel;
pub mod runtime;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, Compiler, compile};
pub use error::{CoreError, RuntimeError};
pub use library::{ScriptLibrary, ScriptResolver, load_library};
pub use model::{Header, LogLevel, ParamKind, ParamSpec, ScriptDefinition, ScriptNode};
pub use runtime::{ScriptRuntime, ScriptValue};
