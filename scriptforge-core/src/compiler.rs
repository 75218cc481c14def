use std::collections::{BTreeMap, HashMap, HashSet};

use crate::coerce::{CoercedParam, Literal, coerce_params};
use crate::error::CoreError;
use crate::library::ScriptResolver;
use crate::model::{BODY_PLACEHOLDER, Header, LogLevel, ParamKind, ScriptDefinition, ScriptNode, ident_name};
use crate::predefined;
use crate::runtime_api::{self, RuntimeFunction};
use crate::string_pool::{StringPool, const_name, quote_literal};

#[derive(Debug, PartialEq, Eq)]
pub struct CompilationArtifact {
    /// Complete program text.
    pub source: String,
    /// Pooled string constants in index order.
    pub constants: Vec<String>,
    /// Identifiers of the emitted function blocks, in emission order.
    pub functions: Vec<String>,
    /// Runtime functions the program calls.
    pub runtime_functions: Vec<&'static RuntimeFunction>,
}

/// How a raw-source node is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawSource {
    /// Folded into the shared preamble; the node has no call site.
    Global(String),
    /// Emitted as its own uniquely numbered function.
    Instance(String),
}

impl RawSource {
    /// The first checkbox selects the mode, the first text parameter holds the source.
    fn from_params(definition: &ScriptDefinition, values: &[CoercedParam]) -> Self {
        let mut global = false;
        let mut code = String::new();
        let mut seen_flag = false;
        let mut seen_code = false;
        for (spec, param) in definition.params.iter().zip(values) {
            match (&spec.kind, &param.literal) {
                (ParamKind::Checkbox, Literal::Bool(flag)) if !seen_flag => {
                    global = *flag;
                    seen_flag = true;
                }
                (_, Literal::Source(text)) if !seen_code => {
                    code = text.clone();
                    seen_code = true;
                }
                _ => {}
            }
        }
        if global {
            RawSource::Global(code)
        } else {
            RawSource::Instance(code)
        }
    }
}

/// State of one compilation run.
pub struct Compiler<'a, R: ScriptResolver + ?Sized> {
    resolver: &'a R,
    header: &'a Header,
    pool: StringPool,
    /// Definition name -> identifier of its emitted function.
    linked: HashMap<String, String>,
    /// Every identifier in use, including the runtime functions.
    idents: HashSet<String>,
    functions: Vec<String>,
    counter: usize,
    funcs: String,
}

impl<'a, R: ScriptResolver + ?Sized> Compiler<'a, R> {
    pub fn new(resolver: &'a R, header: &'a Header) -> Self {
        Self {
            resolver,
            header,
            pool: StringPool::new(),
            linked: HashMap::new(),
            idents: runtime_api::RUNTIME_FUNCTIONS
                .iter()
                .map(|function| function.name.to_string())
                .collect(),
            functions: Vec::new(),
            counter: 0,
            funcs: String::new(),
        }
    }

    /// Compiles the enabled nodes of `nodes` into consecutive call statements.
    pub fn compile_children(&mut self, nodes: &[ScriptNode]) -> Result<String, CoreError> {
        let mut body = String::new();
        for node in nodes.iter().filter(|node| !node.disabled) {
            body.push_str(&self.compile_node(node)?);
        }
        Ok(body)
    }

    /// Compiles one node into its call statement, emitting the definition's
    /// function block the first time the definition is seen.
    pub fn compile_node(&mut self, node: &ScriptNode) -> Result<String, CoreError> {
        if node.disabled {
            return Ok(String::new());
        }
        let resolver = self.resolver;
        let definition = resolver
            .resolve(&node.name)
            .ok_or_else(|| CoreError::ScriptNotFound(node.name.clone()))?;
        let values = coerce_params(&mut self.pool, definition, &node.values, &self.header.lang)?;

        if definition.is_raw_source() {
            let body = self.compile_children(&node.children)?;
            match RawSource::from_params(definition, &values) {
                RawSource::Global(code) => {
                    self.funcs.push_str(&code.replace(BODY_PLACEHOLDER, &body));
                    self.funcs.push('\n');
                    Ok(String::new())
                }
                RawSource::Instance(code) => {
                    let ident = self.claim_numbered_ident(&ident_name(&definition.name));
                    let code = code
                        .replace(BODY_PLACEHOLDER, &body)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    self.emit_function(definition, &ident, &[], code);
                    Ok(format!("   {ident}()\n"))
                }
            }
        } else {
            let ident = match self.linked.get(&definition.name).cloned() {
                Some(ident) => ident,
                None => self.link(definition, node, &values)?,
            };
            let args: Vec<String> = values.iter().map(|param| param.literal.render()).collect();
            Ok(format!("   {ident}({})\n", args.join(",")))
        }
    }

    /// Emits the function block of an ordinary definition and returns its identifier.
    fn link(
        &mut self,
        definition: &ScriptDefinition,
        node: &ScriptNode,
        values: &[CoercedParam],
    ) -> Result<String, CoreError> {
        // Registered before compiling children so self-references resolve.
        let ident = self.claim_ident(ident_name(&definition.name));
        self.linked.insert(definition.name.clone(), ident.clone());

        let body = self.compile_children(&node.children)?;
        let predef = predefined::build(&mut self.pool, definition, &self.header.lang)?;
        let mut code = definition
            .code
            .replace(BODY_PLACEHOLDER, &body)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        if !definition.tree.is_empty() {
            let vars: Vec<String> = values
                .iter()
                .map(|param| format!("\"{0}\", {0}", param.name))
                .collect();
            let internal = self.compile_children(&definition.tree)?;
            code.push_str(&format!("\ninit({})\n", vars.join(",")));
            code.push_str(predef.as_deref().unwrap_or_default());
            code.push('\n');
            code.push_str(&internal);
            code.push_str("\ndeinit()");
        }
        self.emit_function(definition, &ident, values, code);
        Ok(ident)
    }

    /// Takes `base`, or `base_<n>` with the first free `n` when `base` is in use.
    fn claim_ident(&mut self, base: String) -> String {
        let mut ident = base.clone();
        let mut suffix = 1;
        while !self.idents.insert(ident.clone()) {
            ident = format!("{base}_{suffix}");
            suffix += 1;
        }
        ident
    }

    /// Takes `base<counter>` for the next counter value that is not in use.
    fn claim_numbered_ident(&mut self, base: &str) -> String {
        loop {
            let ident = format!("{base}{}", self.counter);
            self.counter += 1;
            if self.idents.insert(ident.clone()) {
                return ident;
            }
        }
    }

    fn emit_function(
        &mut self,
        definition: &ScriptDefinition,
        ident: &str,
        values: &[CoercedParam],
        code: String,
    ) {
        let params: Vec<String> = values
            .iter()
            .map(|param| format!("{} {}", param.literal.type_name(), param.name))
            .collect();
        let trace_args: String = values.iter().map(|param| format!(",{}", param.name)).collect();

        let mut text = format!("func {ident}({}) {{\n", params.join(","));
        text.push_str(&format!("initcmd(`{}`{trace_args})\n", definition.name));
        if definition.log_level.is_inherit() {
            text.push_str(&code);
        } else {
            text.push_str(&format!(
                "int prevLog = SetLogLevel({})\n",
                definition.log_level.as_i64()
            ));
            text.push_str(&code);
            text.push_str("\nSetLogLevel(prevLog)");
        }
        text.push_str("\n}\n");

        tracing::debug!(script = %definition.name, function = ident, "emitted function block");
        self.funcs.push_str(&text);
        self.functions.push(ident.to_string());
    }

    /// Assembles the final program around the root definition.
    pub fn finish(mut self, root: &ScriptDefinition) -> Result<CompilationArtifact, CoreError> {
        let values = coerce_params(&mut self.pool, root, &BTreeMap::new(), &self.header.lang)?;
        let mut params = String::new();
        for param in &values {
            params.push_str(&format!(
                "{} {} = {}\n",
                param.literal.type_name(),
                param.name,
                param.literal.render()
            ));
        }
        let level = if root.log_level.is_inherit() {
            self.header.default_log_level
        } else {
            root.log_level
        };
        params.push_str(&format!("SetLogLevel({})\ninit()\n", level.as_i64()));

        let mut code = root.code.replace(BODY_PLACEHOLDER, "").trim().to_string();
        if !code.is_empty() {
            code.push('\n');
        }
        if let Some(predef) = predefined::build(&mut self.pool, root, &self.header.lang)? {
            code.insert_str(0, &predef);
        }
        let body = self.compile_children(&root.tree)?;

        let mut constants = String::new();
        if !self.pool.is_empty() {
            constants.push_str("const {\n");
            for (index, value) in self.pool.strings().iter().enumerate() {
                constants.push_str(&format!("{} = {}\n", const_name(index), quote_literal(value)));
            }
            constants.push_str("}\n");
        }
        let severities: Vec<String> = LogLevel::SEVERITIES
            .iter()
            .map(|level| level.constant_name())
            .collect();
        constants.push_str(&format!("const IOTA {{ {} }}\n", severities.join(" ")));

        let source = format!(
            "{constants}{}\nrun {{\n{params}{code}{body}\ndeinit()}}",
            self.funcs
        );
        let runtime_functions = runtime_api::collect_calls(&source);
        Ok(CompilationArtifact {
            source,
            constants: self.pool.into_strings(),
            functions: self.functions,
            runtime_functions,
        })
    }
}

/// Compiles `root` and its tree into one program.
pub fn compile<R: ScriptResolver + ?Sized>(
    root: &ScriptDefinition,
    header: &Header,
    resolver: &R,
) -> Result<CompilationArtifact, CoreError> {
    Compiler::new(resolver, header).finish(root)
}
