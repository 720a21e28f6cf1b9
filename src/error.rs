//! Error types shared by the anchor parser, project index and renderer.

use std::path::PathBuf;
use thiserror::Error;

/// Problems found while scanning a single file for anchor markers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("anchor marker on line {line} has no name")]
    MissingName { line: usize },

    #[error("duplicate anchor '{name}' (first opened on line {first_line}, again on line {line})")]
    DuplicateAnchor {
        name: String,
        first_line: usize,
        line: usize,
    },

    #[error("ANCHOR_END '{name}' on line {line} has no matching ANCHOR")]
    UnmatchedEnd { name: String, line: usize },

    #[error("anchor '{name}' opened on line {line} is never closed")]
    Unclosed { name: String, line: usize },
}

/// Errors raised while resolving and rendering include directives.
#[derive(Error, Debug)]
pub enum IncludeError {
    #[error("file '{reference}' does not exist in the project")]
    FileNotFound { reference: String },

    #[error("file name '{reference}' is ambiguous; candidates: {}", format_paths(.candidates))]
    AmbiguousFile {
        reference: String,
        candidates: Vec<PathBuf>,
    },

    #[error("anchor '{anchor}' does not exist in '{}' (available: {})", .file.display(), format_names(.available))]
    AnchorNotFound {
        file: PathBuf,
        anchor: String,
        available: Vec<String>,
    },

    #[error("include directive on line {line} is missing its {missing} argument")]
    MissingArgument { line: usize, missing: &'static str },

    #[error("invalid anchors in '{}': {source}", .file.display())]
    Anchor {
        file: PathBuf,
        #[source]
        source: AnchorError,
    },

    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
