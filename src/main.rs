use clap::{Parser, Subcommand};
use itertools::Itertools;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, Level};

use mandatory_rules::context::Context;
use mandatory_rules::hooks::InstanceHook;
use mandatory_rules::{parse_expression, Engine, Instance, RuleError};

/// Validate record instances against `$mandatory` / `$mandatoryIf` rules.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate an instance document; `-` reads stdin
    Validate {
        instance: PathBuf,
        /// Previous version of the instance; switches to update validation
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Run a single hook (`mandatory` or `mandatoryIf`)
        #[arg(long)]
        only: Option<String>,
        /// JSON file with engine options
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        cache_capacity: Option<usize>,
        #[arg(long)]
        cache_ttl_secs: Option<u64>,
    },
    /// Print the compiled form of a rule argument
    Parse { expression: String },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(args.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Command) -> Result<ExitCode, RuleError> {
    match command {
        Command::Parse { expression } => {
            let expr = parse_expression(&expression)?;
            println!("{}", to_json(&expr)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate {
            instance,
            previous,
            only,
            config,
            cache_capacity,
            cache_ttl_secs,
        } => {
            let mut ctx = match config {
                Some(path) => Context::from_json(&read_source(&path)?)?,
                None => Context::default(),
            };
            if let Some(capacity) = cache_capacity {
                ctx = ctx.with_cache_capacity(capacity);
            }
            if let Some(secs) = cache_ttl_secs {
                ctx = ctx.with_cache_ttl_secs(secs);
            }
            debug!(?ctx, "engine options");

            let engine = Engine::new(ctx);
            let updated = Instance::from_json(&read_source(&instance)?)?;
            let previous = previous
                .map(|path| read_source(&path).and_then(|json| Instance::from_json(&json)))
                .transpose()?;

            let errors = match (only, previous) {
                (Some(name), previous) => {
                    let hook = engine.registry().get(&name).ok_or_else(|| {
                        RuleError::InvalidDocument(format!(
                            "unknown hook `{name}`, expected one of: {}",
                            engine.registry().names().join(", ")
                        ))
                    })?;
                    match previous {
                        Some(prev) => hook.validate_on_update(&prev, &updated),
                        None => hook.validate_on_create(&updated),
                    }
                }
                (None, Some(prev)) => engine.on_update(&prev, &updated),
                (None, None) => engine.on_create(&updated),
            };

            println!("{}", to_json(&errors)?);
            if errors.is_empty() {
                return Ok(ExitCode::SUCCESS);
            }
            eprintln!(
                "invalid fields: {}",
                errors.iter().map(|e| e.field_name.as_str()).unique().join(", ")
            );
            Ok(ExitCode::from(1))
        }
    }
}

fn read_source(path: &Path) -> Result<String, RuleError> {
    let read = if path.as_os_str() == "-" {
        let mut out = String::new();
        std::io::stdin().read_to_string(&mut out).map(|_| out)
    } else {
        std::fs::read_to_string(path)
    };
    read.map_err(|e| RuleError::InvalidDocument(format!("{}: {e}", path.display())))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RuleError> {
    serde_json::to_string_pretty(value).map_err(|e| RuleError::InvalidDocument(e.to_string()))
}
