use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scriptforge_core::runtime_api::RUNTIME_FUNCTIONS;
use scriptforge_core::{Header, LogLevel, ScriptResolver, ScriptRuntime, compile, load_library};
use tracing_subscriber::EnvFilter;

/// Compiles visual script trees into programs for the embedded engine.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true, help = "Print diagnostic output to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a script from a definition library into program text.
    Compile {
        #[arg(short, long, value_name = "DIR", help = "Directory of script definitions")]
        library: PathBuf,

        #[arg(short, long, value_name = "NAME", help = "Name of the root script")]
        script: String,

        #[arg(short, long, help = "Write the program here instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, default_value = "en", help = "UI language code")]
        lang: String,

        #[arg(
            long,
            value_name = "LEVEL",
            default_value = "info",
            help = "Log level used when the root script inherits: disable, error, warn, info, debug"
        )]
        log_level: LogLevel,
    },
    /// Expand #name# placeholders in TEXT using the given variables.
    Expand {
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        text: String,
    },
    /// List the runtime functions available to generated programs.
    Functions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            library,
            script,
            output,
            lang,
            log_level,
        } => {
            let library = load_library(&library)
                .with_context(|| format!("failed to load script library {}", library.display()))?;
            let root = library
                .resolve(&script)
                .with_context(|| format!("root script '{script}' is not in the library"))?;
            let header = Header {
                lang,
                default_log_level: log_level,
            };
            let artifact = compile(root, &header, &library)?;
            tracing::info!(
                constants = artifact.constants.len(),
                functions = artifact.functions.len(),
                "compiled {script}"
            );
            match output {
                Some(path) => write_output(&path, artifact.source.as_bytes())?,
                None => println!("{}", artifact.source),
            }
        }
        Command::Expand { vars, text } => {
            let (runtime, _log) = ScriptRuntime::with_channel();
            runtime.init();
            for var in &vars {
                let (name, value) = var
                    .split_once('=')
                    .with_context(|| format!("variable '{var}' must be NAME=VALUE"))?;
                runtime.set_variable(name, value)?;
            }
            let expanded = runtime.expand(&text)?;
            runtime.deinit()?;
            println!("{expanded}");
        }
        Command::Functions => {
            for function in RUNTIME_FUNCTIONS {
                println!("{}", function.prototype);
            }
        }
    }
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

