use crate::error::MalformedReason;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Version-constraint comparators accepted in a manifest line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "~=")]
    Compatible,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
}

impl Operator {
    /// Every operator, two-character tokens first so `>` never shadows `>=`.
    pub const ALL: [Operator; 7] = [
        Operator::Equal,
        Operator::Compatible,
        Operator::GreaterEqual,
        Operator::LessEqual,
        Operator::NotEqual,
        Operator::Greater,
        Operator::Less,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::Compatible => "~=",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
        }
    }

    /// Match an operator at the start of `input`, longest token first.
    pub fn match_prefix(input: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| input.starts_with(op.as_str()))
    }

    /// Locate the first operator in `input`, returning its byte offset.
    fn find_in(input: &str) -> Option<(usize, Self)> {
        input
            .char_indices()
            .find_map(|(idx, _)| Self::match_prefix(&input[idx..]).map(|op| (idx, op)))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requirement declaration, e.g. `coverage[toml]==6.4.1`.
///
/// Equality is semantic: `name`, `extras`, `operator` and `version` are
/// compared, while the inline comment and the source line are not.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    pub operator: Operator,
    pub version: String,
    /// Inline comment text, kept for round-trip rendering only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// 1-based line number when the entry came from a manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Entry {
    pub fn new(name: impl Into<String>, operator: Operator, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            operator,
            version: version.into(),
            comment: None,
            line: None,
        }
    }

    pub fn with_extras<I, S>(mut self, extras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extras = extras.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Name used for duplicate detection: lowercase with `-`, `_` and `.` runs folded to `-`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether the entry pins an exact version.
    pub fn is_pinned(&self) -> bool {
        self.operator == Operator::Equal
    }

    /// The version constraint on its own, e.g. `~=2.0.0`.
    pub fn constraint(&self) -> String {
        format!("{}{}", self.operator, self.version)
    }

    /// Whether another entry declares the same constraint (ignoring name spelling).
    pub fn same_constraint(&self, other: &Entry) -> bool {
        self.operator == other.operator && self.version == other.version
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.extras == other.extras
            && self.operator == other.operator
            && self.version == other.version
    }
}

impl Eq for Entry {}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", escape_hash(&self.name))?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", escape_hash(&self.extras.join(",")))?;
        }
        write!(f, "{}{}", self.operator, escape_hash(&self.version))
    }
}

/// Parse a requirement whose comment has already been removed.
impl FromStr for Entry {
    type Err = MalformedReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let content = s.trim();
        let (offset, operator) =
            Operator::find_in(content).ok_or(MalformedReason::MissingOperator)?;

        let head = content[..offset].trim();
        let version = content[offset + operator.as_str().len()..].trim();

        let (name, extras) = split_extras(head)?;
        if name.is_empty() {
            return Err(MalformedReason::EmptyName);
        }
        if !name_pattern().is_match(name) {
            return Err(MalformedReason::InvalidName(name.to_string()));
        }
        validate_version(version)?;

        Ok(Entry {
            name: name.to_string(),
            extras,
            operator,
            version: version.to_string(),
            comment: None,
            line: None,
        })
    }
}

fn split_extras(head: &str) -> Result<(&str, Vec<String>), MalformedReason> {
    let Some(open) = head.find('[') else {
        if head.contains(']') {
            return Err(MalformedReason::UnbalancedExtras);
        }
        return Ok((head, Vec::new()));
    };

    let inner = head[open + 1..]
        .strip_suffix(']')
        .ok_or(MalformedReason::UnbalancedExtras)?;
    if inner.contains('[') || inner.contains(']') {
        return Err(MalformedReason::UnbalancedExtras);
    }

    let mut extras = Vec::new();
    for extra in inner.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if !name_pattern().is_match(extra) {
            return Err(MalformedReason::InvalidExtra(extra.to_string()));
        }
        extras.push(extra.to_string());
    }

    Ok((head[..open].trim(), extras))
}

fn validate_version(version: &str) -> Result<(), MalformedReason> {
    if version.is_empty() {
        return Err(MalformedReason::EmptyVersion);
    }

    // A leftover comparator here means a doubled operator such as `===` or `>==`.
    let bad_start = version.starts_with(['=', '<', '>', '!', '~']);
    if bad_start || version.chars().any(char::is_whitespace) {
        return Err(MalformedReason::InvalidVersion(version.to_string()));
    }

    Ok(())
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$")
            .expect("tool name pattern is a valid regex")
    })
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-_.]+").expect("separator pattern is a valid regex"))
}

pub(crate) fn normalize_name(name: &str) -> String {
    separator_pattern()
        .replace_all(&name.to_ascii_lowercase(), "-")
        .into_owned()
}

pub(crate) fn escape_hash(value: &str) -> String {
    value.replace('#', "\\#")
}
