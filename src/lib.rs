//! Stitch source fragments into documentation.
//!
//! Templates reference project files with `{{#include <file>}}` or a named
//! region of a file with `{{#include <file>:<anchor>}}`. See [`anchor`] for
//! the marker syntax and [`template`] for rendering.

pub mod anchor;
pub mod audit;
pub mod config;
pub mod error;
pub mod project;
pub mod template;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::IncludeConfig;
use crate::project::ProjectIndex;
use crate::template::Renderer;

#[derive(Parser, Debug)]
#[command(
    name = "docinclude",
    version,
    about = "Stitch source fragments into documentation via file and anchor includes"
)]
pub struct Cli {
    /// Path to include.toml (defaults to ./include.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a template, expanding every include directive
    Render {
        /// Template to render
        template: PathBuf,

        /// Write output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Project root that file references resolve against
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Report duplicate file names and malformed or duplicate anchors
    Check {
        /// Project root to audit
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the anchors defined in a file
    Anchors {
        /// File to inspect
        file: PathBuf,

        /// Output as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<IncludeConfig> {
    match path {
        Some(path) => IncludeConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("reading current directory")?;
            IncludeConfig::discover(&cwd).context("loading include.toml")
        }
    }
}

fn build_index(config: &IncludeConfig, root: Option<PathBuf>) -> Result<ProjectIndex> {
    let root = root.unwrap_or_else(|| config.resolved_root());
    let options = config.scan_options()?;
    ProjectIndex::scan(&root, &options)
        .with_context(|| format!("indexing project at {}", root.display()))
}

/// Parse arguments and dispatch.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            template,
            output,
            root,
        } => {
            let index = build_index(&config, root)?;
            let rendered = Renderer::new(&index)
                .render_file(&template)
                .with_context(|| format!("rendering {}", template.display()))?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(output = %path.display(), "rendered template");
                }
                None => print!("{rendered}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { root, json } => {
            let index = build_index(&config, root)?;
            let report = audit::audit(&index, &config.audit_options()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Anchors { file, json } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let anchors = anchor::parse_anchors(&text)
                .with_context(|| format!("parsing anchors in {}", file.display()))?;
            if json {
                let list: Vec<_> = anchors.iter().collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for a in anchors.iter() {
                    println!("{}\t{}-{}", a.name, a.start_line, a.end_line);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_report(report: &audit::AuditReport) {
    for dup in &report.duplicate_files {
        println!("duplicate file name: {}", dup.name);
        for path in &dup.paths {
            println!("  {}", path.display());
        }
    }
    for problem in &report.anchor_problems {
        println!("{}: {}", problem.path.display(), problem.error);
    }
    if report.is_clean() {
        println!("ok: {} files checked", report.files_scanned);
    }
}
