//! Anchor markers inside source files.
//!
//! An anchor is a named region delimited by two marker lines:
//!
//! ```text
//! // ANCHOR: setup
//! let conn = connect()?;
//! // ANCHOR_END: setup
//! ```
//!
//! Markers are found anywhere on a line, so they work behind any comment
//! leader (`//`, `#`, `--`, `<!-- ... -->`). Anchors may nest or overlap;
//! marker lines themselves never end up in an extracted body.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::AnchorError;

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bANCHOR(_END)?:[ \t]*([A-Za-z0-9_.]+(?:-[A-Za-z0-9_.]+)*)?")
        .expect("valid anchor marker regex")
});

/// A named region of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anchor {
    pub name: String,
    /// 1-based line of the `ANCHOR:` marker.
    pub start_line: usize,
    /// 1-based line of the `ANCHOR_END:` marker.
    pub end_line: usize,
    /// Lines between the markers, with every marker line removed.
    #[serde(skip)]
    pub body: Vec<String>,
}

impl Anchor {
    /// Body lines joined with `\n`, without a trailing newline.
    pub fn content(&self) -> String {
        self.body.join("\n")
    }
}

/// All anchors of one file, in the order they were opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorSet {
    anchors: Vec<Anchor>,
}

impl AnchorSet {
    pub fn get(&self, name: &str) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.anchors.iter().map(|a| a.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

// Names never end in '-', so a closing `-->` written straight after the
// name is not swallowed. A marker with no name at all carries `None`.
enum Marker<'a> {
    Start(Option<&'a str>),
    End(Option<&'a str>),
}

fn markers(line: &str) -> impl Iterator<Item = Marker<'_>> {
    MARKER_RE.captures_iter(line).map(|caps| {
        let name = caps.get(2).map(|m| m.as_str());
        if caps.get(1).is_some() {
            Marker::End(name)
        } else {
            Marker::Start(name)
        }
    })
}

fn is_marker_line(line: &str) -> bool {
    MARKER_RE.is_match(line)
}

/// Parse every anchor in `text`.
///
/// Fails on the first structural problem: a marker without a name, a name
/// opened twice, an end marker without a matching start, or an anchor left
/// open at end of file.
pub fn parse_anchors(text: &str) -> Result<AnchorSet, AnchorError> {
    let mut anchors: Vec<Anchor> = Vec::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    // name -> index into `anchors`
    let mut open: HashMap<String, usize> = HashMap::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if !is_marker_line(line) {
            for &i in open.values() {
                anchors[i].body.push(line.to_string());
            }
            continue;
        }

        for marker in markers(line) {
            match marker {
                Marker::Start(None) | Marker::End(None) => {
                    return Err(AnchorError::MissingName { line: line_no });
                }
                Marker::Start(Some(name)) => {
                    if let Some(&first_line) = first_seen.get(name) {
                        return Err(AnchorError::DuplicateAnchor {
                            name: name.to_string(),
                            first_line,
                            line: line_no,
                        });
                    }
                    first_seen.insert(name.to_string(), line_no);
                    open.insert(name.to_string(), anchors.len());
                    anchors.push(Anchor {
                        name: name.to_string(),
                        start_line: line_no,
                        end_line: 0,
                        body: Vec::new(),
                    });
                }
                Marker::End(Some(name)) => match open.remove(name) {
                    Some(i) => anchors[i].end_line = line_no,
                    None => {
                        return Err(AnchorError::UnmatchedEnd {
                            name: name.to_string(),
                            line: line_no,
                        });
                    }
                },
            }
        }
    }

    if let Some(i) = open.values().copied().min() {
        let anchor = &anchors[i];
        return Err(AnchorError::Unclosed {
            name: anchor.name.clone(),
            line: anchor.start_line,
        });
    }

    Ok(AnchorSet { anchors })
}

/// The whole text with every marker line removed, joined with `\n`.
pub fn strip_markers(text: &str) -> String {
    text.lines()
        .filter(|line| !is_marker_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}
