//! Include directives and template rendering.
//!
//! A directive has the form `{{#include <file>}}` or
//! `{{#include <file>:<anchor>}}` and may sit anywhere on a line, but never
//! spans lines. Prefixing it with a backslash (`\{{#include ...}}`) emits
//! the directive literally.

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::anchor::{self, AnchorSet};
use crate::error::{AnchorError, IncludeError};
use crate::project::ProjectIndex;

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\)?\{\{[ \t]*#include\b([^}\n]*)\}\}").expect("valid include directive regex")
});

/// One `{{#include ...}}` occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub file: String,
    pub anchor: Option<String>,
    /// 1-based template line the directive starts on.
    pub line: usize,
    /// Byte range of the directive text in the template.
    pub span: Range<usize>,
}

enum Token {
    Include(Directive),
    /// Escaped directive: the span covers the backslash too.
    Literal(Range<usize>),
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

fn parse_arguments(args: &str, line: usize) -> Result<(String, Option<String>), IncludeError> {
    let args = args.trim();
    let (file, anchor) = match args.split_once(':') {
        Some((file, anchor)) => (file.trim(), Some(anchor.trim())),
        None => (args, None),
    };

    if file.is_empty() {
        return Err(IncludeError::MissingArgument {
            line,
            missing: "file",
        });
    }
    if anchor.is_some_and(str::is_empty) {
        return Err(IncludeError::MissingArgument {
            line,
            missing: "anchor",
        });
    }

    Ok((file.to_string(), anchor.map(str::to_string)))
}

fn tokenize(text: &str) -> Result<Vec<Token>, IncludeError> {
    let mut tokens = Vec::new();
    for caps in DIRECTIVE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if caps.get(1).is_some() {
            tokens.push(Token::Literal(whole.range()));
            continue;
        }

        let line = line_of(text, whole.start());
        let args = caps.get(2).map_or("", |m| m.as_str());
        let (file, anchor) = parse_arguments(args, line)?;
        tokens.push(Token::Include(Directive {
            file,
            anchor,
            line,
            span: whole.range(),
        }));
    }
    Ok(tokens)
}

/// Every live (non-escaped) directive in `text`, in order.
pub fn parse_directives(text: &str) -> Result<Vec<Directive>, IncludeError> {
    Ok(tokenize(text)?
        .into_iter()
        .filter_map(|token| match token {
            Token::Include(d) => Some(d),
            Token::Literal(_) => None,
        })
        .collect())
}

struct SourceFile {
    text: String,
    anchors: Result<AnchorSet, AnchorError>,
}

/// Expands directives against a [`ProjectIndex`].
///
/// Source files are read and parsed once per renderer.
pub struct Renderer<'a> {
    index: &'a ProjectIndex,
    cache: HashMap<PathBuf, SourceFile>,
}

impl<'a> Renderer<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self {
            index,
            cache: HashMap::new(),
        }
    }

    fn load(&mut self, path: &Path) -> Result<&SourceFile, IncludeError> {
        if !self.cache.contains_key(path) {
            let text = std::fs::read_to_string(path).map_err(|source| IncludeError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let anchors = anchor::parse_anchors(&text);
            self.cache
                .insert(path.to_path_buf(), SourceFile { text, anchors });
        }
        Ok(&self.cache[path])
    }

    /// Text a single directive expands to.
    pub fn expand(&mut self, directive: &Directive) -> Result<String, IncludeError> {
        let path = self.index.resolve(&directive.file)?;
        let source = self.load(&path)?;
        let anchors = source
            .anchors
            .as_ref()
            .map_err(|err| IncludeError::Anchor {
                file: path.clone(),
                source: err.clone(),
            })?;

        match &directive.anchor {
            None => Ok(anchor::strip_markers(&source.text)),
            Some(name) => anchors
                .get(name)
                .map(|a| a.content())
                .ok_or_else(|| IncludeError::AnchorNotFound {
                    file: path.clone(),
                    anchor: name.clone(),
                    available: anchors.names(),
                }),
        }
    }

    /// Replace every directive in `template` with the text it refers to.
    pub fn render(&mut self, template: &str) -> Result<String, IncludeError> {
        let tokens = tokenize(template)?;
        let mut out = String::with_capacity(template.len());
        let mut cursor = 0;

        for token in tokens {
            match token {
                Token::Include(directive) => {
                    out.push_str(&template[cursor..directive.span.start]);
                    let expanded = self.expand(&directive)?;
                    tracing::debug!(
                        file = %directive.file,
                        anchor = directive.anchor.as_deref().unwrap_or("-"),
                        line = directive.line,
                        "expanded include"
                    );
                    out.push_str(&expanded);
                    cursor = directive.span.end;
                }
                Token::Literal(span) => {
                    out.push_str(&template[cursor..span.start]);
                    // drop the escaping backslash
                    out.push_str(&template[span.start + 1..span.end]);
                    cursor = span.end;
                }
            }
        }

        out.push_str(&template[cursor..]);
        Ok(out)
    }

    /// Read a template from disk and render it.
    pub fn render_file(&mut self, path: &Path) -> Result<String, IncludeError> {
        let template = std::fs::read_to_string(path).map_err(|source| IncludeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.render(&template)
    }
}
