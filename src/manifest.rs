use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Finding, ParseError, ParseErrors};
use crate::requirement::Entry;

/// One line of a manifest as it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Entry(Entry),
    /// Full-line comment, stored trimmed with its leading `#`.
    Comment(String),
    Blank,
}

impl Line {
    /// Section title carried by a header comment such as `# Formatting`.
    ///
    /// Banner lines made only of `#` have no title.
    pub fn header_title(&self) -> Option<&str> {
        match self {
            Line::Comment(text) => {
                let title = text.trim_matches(|c: char| c == '#' || c.is_whitespace());
                (!title.is_empty()).then_some(title)
            }
            _ => None,
        }
    }
}

/// Entries grouped under the closest preceding header comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    /// `None` for entries that appear before any header.
    pub title: Option<&'a str>,
    pub entries: Vec<&'a Entry>,
}

/// A parsed requirements manifest.
///
/// Holds every well-formed line in source order. Malformed lines are
/// reported through [`ParseOutcome::errors`] and are not part of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    path: Option<PathBuf>,
    lines: Vec<Line>,
}

/// Everything a single parse produced.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub manifest: Manifest,
    pub errors: Vec<ParseError>,
    pub findings: Vec<Finding>,
}

impl ParseOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.findings.is_empty()
    }

    /// Treat any malformed line as fatal.
    pub fn into_result(self) -> Result<Manifest, ParseErrors> {
        if self.errors.is_empty() {
            Ok(self.manifest)
        } else {
            Err(ParseErrors(self.errors))
        }
    }
}

impl Manifest {
    /// Read and parse a manifest file from disk.
    pub fn load(path: &Path) -> Result<ParseOutcome> {
        debug!(path = %path.display(), "loading manifest");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file {:?}", path))?;

        let mut outcome = parse(&contents);
        outcome.manifest.path = Some(path.to_path_buf());
        Ok(outcome)
    }

    /// Source file, when the manifest was loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Iterate over requirement entries in source order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    /// Number of requirement entries.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Group entries by section header. Sections without entries are omitted.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut sections = Vec::new();
        let mut current = Section {
            title: None,
            entries: Vec::new(),
        };

        for line in &self.lines {
            if let Some(title) = line.header_title() {
                let finished = std::mem::replace(
                    &mut current,
                    Section {
                        title: Some(title),
                        entries: Vec::new(),
                    },
                );
                if !finished.entries.is_empty() {
                    sections.push(finished);
                }
            } else if let Line::Entry(entry) = line {
                current.entries.push(entry);
            }
        }

        if !current.entries.is_empty() {
            sections.push(current);
        }
        sections
    }

    /// Render every line, comments and blank lines included.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry(entry) => out.push_str(&render_entry(entry)),
                Line::Comment(text) => out.push_str(text),
                Line::Blank => {}
            }
            out.push('\n');
        }
        out
    }
}

/// Parse manifest text into entries, collecting malformed lines instead of stopping.
pub fn parse(text: &str) -> ParseOutcome {
    // Editors on Windows often prefix UTF-8 files with a byte-order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = Vec::new();
    let mut errors = Vec::new();
    let mut findings = Vec::new();
    // normalized name -> first declaration
    let mut seen: HashMap<String, (usize, Entry)> = HashMap::new();

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let (content, comment) = split_comment(raw);
        let content = content.trim();

        if content.is_empty() {
            lines.push(match comment {
                Some(_) => Line::Comment(raw.trim().to_string()),
                None => Line::Blank,
            });
            continue;
        }

        let mut entry = match content.parse::<Entry>() {
            Ok(entry) => entry,
            Err(reason) => {
                debug!(line = number, %reason, "malformed manifest line");
                errors.push(ParseError::MalformedLine {
                    line: number,
                    text: raw.to_string(),
                    reason,
                });
                continue;
            }
        };
        entry.line = Some(number);
        entry.comment = comment.filter(|c| !c.is_empty());

        let key = entry.normalized_name();
        if let Some((first_line, first)) = seen.get(&key) {
            findings.push(Finding::DuplicateEntry {
                name: entry.name.clone(),
                first_line: *first_line,
                line: number,
                conflicting: !first.same_constraint(&entry),
            });
        } else {
            seen.insert(key, (number, entry.clone()));
        }

        lines.push(Line::Entry(entry));
    }

    let outcome = ParseOutcome {
        manifest: Manifest { path: None, lines },
        errors,
        findings,
    };
    debug!(
        entries = outcome.manifest.len(),
        errors = outcome.errors.len(),
        findings = outcome.findings.len(),
        "parsed manifest"
    );
    outcome
}

/// Render entries one per line. Inverse of [`parse`] for the entry content.
pub fn render<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut out = String::new();
    for entry in entries {
        out.push_str(&render_entry(entry));
        out.push('\n');
    }
    out
}

/// Render a single entry on one physical line.
fn render_entry(entry: &Entry) -> String {
    match &entry.comment {
        Some(comment) => {
            let comment: String = comment
                .chars()
                .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                .collect();
            format!("{entry}  # {comment}")
        }
        None => entry.to_string(),
    }
}

/// Split a raw line at its first unescaped `#`.
///
/// `\#` becomes a literal `#` in the content. The comment text is trimmed.
fn split_comment(raw: &str) -> (String, Option<String>) {
    let mut content = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some((_, '#'))) => {
                content.push('#');
                chars.next();
            }
            '#' => return (content, Some(raw[idx + 1..].trim().to_string())),
            _ => content.push(ch),
        }
    }

    (content, None)
}
