//! Coercion of raw parameter values into typed literals.
//!
//! Raw values arrive as loosely typed JSON. They are first classified by
//! the parameter kind into a [`RawValue`], then turned into a [`Literal`]
//! that the compiler can render without looking at the raw input again.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::CoreError;
use crate::macro_engine::VAR_CHAR;
use crate::model::{ParamKind, ParamSpec, ScriptDefinition};
use crate::string_pool::{StringPool, quote_literal};

/// Raw input of one parameter, tagged by the parameter kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Checkbox(String),
    Text(String),
    Select(String),
    Number(String),
    List(Vec<Value>),
}

impl RawValue {
    pub fn classify(kind: ParamKind, raw: Option<&Value>) -> Self {
        match kind {
            ParamKind::Checkbox => RawValue::Checkbox(scalar_text(raw)),
            ParamKind::Textarea | ParamKind::SingleText => RawValue::Text(scalar_text(raw)),
            ParamKind::Select => RawValue::Select(scalar_text(raw)),
            ParamKind::Number => RawValue::Number(scalar_text(raw)),
            ParamKind::List => match raw {
                Some(Value::Array(items)) => RawValue::List(items.clone()),
                _ => RawValue::List(Vec::new()),
            },
        }
    }
}

fn scalar_text(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// A coerced value, ready to be rendered into the program text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    /// Reference to a pooled string constant.
    Str(String),
    /// Pooled string that the runtime expands when the call happens.
    Macro(String),
    /// Select value passed through unchanged with a declared type.
    Passthrough { ty: String, text: String },
    /// Verbatim source text of the raw-source definition.
    Source(String),
}

impl Literal {
    pub fn type_name(&self) -> &str {
        match self {
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Str(_) | Literal::Macro(_) | Literal::Source(_) => "str",
            Literal::Passthrough { ty, .. } => ty,
        }
    }

    /// Expression form used at call sites and in variable declarations.
    pub fn render(&self) -> String {
        match self {
            Literal::Bool(value) => value.to_string(),
            Literal::Int(value) => value.to_string(),
            Literal::Str(reference) => reference.clone(),
            Literal::Macro(reference) => format!("macro({reference})"),
            Literal::Passthrough { text, .. } => text.clone(),
            Literal::Source(text) => quote_literal(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercedParam {
    pub name: String,
    pub literal: Literal,
}

/// Coerces every declared parameter of `definition`, in declaration order.
pub fn coerce_params(
    pool: &mut StringPool,
    definition: &ScriptDefinition,
    values: &BTreeMap<String, Value>,
    lang: &str,
) -> Result<Vec<CoercedParam>, CoreError> {
    definition
        .params
        .iter()
        .map(|param| {
            let literal = coerce(pool, definition, param, values.get(&param.name), lang)?;
            Ok(CoercedParam {
                name: param.name.clone(),
                literal,
            })
        })
        .collect()
}

/// Coerces one raw value according to `param`.
pub fn coerce(
    pool: &mut StringPool,
    definition: &ScriptDefinition,
    param: &ParamSpec,
    raw: Option<&Value>,
    lang: &str,
) -> Result<Literal, CoreError> {
    let required = || {
        if param.options.required {
            Err(CoreError::FieldRequired {
                field: definition.localize(param.display_title(), lang),
                script: definition.localized_title(lang),
            })
        } else {
            Ok(())
        }
    };

    let literal = match RawValue::classify(param.kind, raw) {
        RawValue::Checkbox(text) => {
            Literal::Bool(!(text.is_empty() || text == "0" || text == "false"))
        }
        RawValue::Text(mut text) => {
            if text.is_empty() {
                required()?;
                text = param.options.default.clone();
            }
            if definition.is_raw_source() {
                Literal::Source(text)
            } else if text.contains(VAR_CHAR) {
                Literal::Macro(pool.intern(&text))
            } else {
                Literal::Str(pool.intern(&text))
            }
        }
        RawValue::Select(text) => {
            if param.options.passthrough_type.is_empty() {
                Literal::Str(pool.intern(&text))
            } else {
                Literal::Passthrough {
                    ty: param.options.passthrough_type.clone(),
                    text,
                }
            }
        }
        RawValue::Number(mut text) => {
            if text.is_empty() {
                required()?;
                text = param.options.default.trim().to_string();
            }
            if text.is_empty() {
                Literal::Int(0)
            } else {
                let value = text.parse::<i64>().map_err(|_| CoreError::InvalidNumber {
                    field: definition.localize(param.display_title(), lang),
                    script: definition.localized_title(lang),
                    value: text.clone(),
                })?;
                Literal::Int(value)
            }
        }
        RawValue::List(items) => {
            if items.is_empty() {
                required()?;
                Literal::Str(pool.intern("[]"))
            } else {
                let encoded = serde_json::to_string(&items)?;
                Literal::Str(pool.intern(&encoded))
            }
        }
    };
    Ok(literal)
}
