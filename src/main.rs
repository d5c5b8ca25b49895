use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use xr_extension_mask::cli::{Cli, Command, OutputFormat};
use xr_extension_mask::report::{self, ExtensionReport};
use xr_extension_mask::{context, ShimConfig, ShimContext};

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Directory the runtime is resolved against: the one holding the config
fn config_dir(config: &Path) -> &Path {
    config.parent().unwrap_or_else(|| Path::new(""))
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    config: String,
    runtime: Option<String>,
    masked_extensions: &'a [String],
    issues: Vec<String>,
}

fn run_check(config_path: &Path, strict: bool, format: OutputFormat) -> Result<()> {
    if !config_path.is_file() {
        bail!("Configuration file not found: {}", config_path.display());
    }
    let config = ShimConfig::load(config_path);
    let runtime = config
        .runtime_path(config_dir(config_path))
        .map(|p| p.display().to_string());

    match format {
        OutputFormat::Json => {
            let output = CheckOutput {
                config: config_path.display().to_string(),
                runtime,
                masked_extensions: &config.masked_extensions,
                issues: config
                    .issues
                    .iter()
                    .map(|issue| format!("L{}: {}", issue.line, issue.kind))
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Configuration: {}", config_path.display());
            println!("Runtime: {}", runtime.as_deref().unwrap_or("(none)"));
            if config.masked_extensions.is_empty() {
                println!("Masked extensions: (none)");
            } else {
                println!("Masked extensions:");
                for name in &config.masked_extensions {
                    println!("  {}", name);
                }
            }
            for issue in &config.issues {
                println!("Skipped L{}: {}", issue.line, issue.kind);
            }
        }
    }

    if strict && !config.issues.is_empty() {
        bail!("{} line(s) skipped", config.issues.len());
    }
    Ok(())
}

fn print_report(report: &ExtensionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            if let Some(runtime) = &report.runtime {
                println!("Runtime: {}", runtime);
            }
            println!("Interface version: {}", report.interface_version);
            for entry in &report.extensions {
                let marker = if entry.masked { "masked" } else { "" };
                println!("{:<64} v{:<4} {}", entry.name, entry.version, marker);
            }
            println!(
                "{} advertised, {} masked, {} visible",
                report.extensions.len(),
                report.masked_count(),
                report.visible.len()
            );
        }
    }
    Ok(())
}

fn run_list(config_path: &Path, format: OutputFormat) -> Result<()> {
    let config = ShimConfig::load(config_path);
    let shim = ShimContext::from_config(&config, config_dir(config_path));
    if context::install(shim).is_err() {
        bail!("Shim context already initialized");
    }

    let report = report::probe()
        .with_context(|| format!("Probing runtime configured in {}", config_path.display()))?;
    print_report(&report, format)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Check {
            config,
            strict,
            format,
        } => run_check(&config, strict, format),
        Command::List { config, format } => run_list(&config, format),
    }
}
