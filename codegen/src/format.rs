//! Text formatting layer for generated Rust source.
//!
//! Pure functions turning primitive values and text blocks into valid Rust
//! fragments: literals, identifiers, comments and attributes. Nothing in
//! here knows about descriptors.

use std::fmt::Write as _;

use thiserror::Error;

/// Failures producing a source fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A single-line comment was given text spanning several lines.
    #[error("single-line comment text contains a line terminator: {0:?}")]
    MultilineComment(String),
    /// Text that cannot be spelled as a Rust identifier.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    /// Keyword that has no raw-identifier form (`self`, `Self`, `super`, `crate`, `_`).
    #[error("keyword cannot be used as an identifier: {0}")]
    UnescapableKeyword(String),
}

/// Strict and reserved keywords of the 2024 edition that `r#` can escape.
const RAW_ESCAPABLE_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

const UNESCAPABLE_KEYWORDS: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Marker prefixed to keywords used as identifiers.
pub const RAW_IDENTIFIER_MARKER: &str = "r#";

/// Spells `name` as a Rust identifier, escaping keywords as raw identifiers.
///
/// # Examples
///
/// ```
/// use optforge_codegen::format::rust_identifier;
///
/// assert_eq!(rust_identifier("output").unwrap(), "output");
/// assert_eq!(rust_identifier("type").unwrap(), "r#type");
/// assert!(rust_identifier("self").is_err());
/// assert!(rust_identifier("2fast").is_err());
/// ```
pub fn rust_identifier(name: &str) -> Result<String, FormatError> {
    if UNESCAPABLE_KEYWORDS.contains(&name) {
        return Err(FormatError::UnescapableKeyword(name.to_string()));
    }
    if !is_identifier(name) {
        return Err(FormatError::InvalidIdentifier(name.to_string()));
    }
    if RAW_ESCAPABLE_KEYWORDS.contains(&name) {
        return Ok(format!("{RAW_IDENTIFIER_MARKER}{name}"));
    }
    Ok(name.to_string())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Spells `text` as a Rust string literal.
///
/// # Examples
///
/// ```
/// use optforge_codegen::format::string_literal;
///
/// assert_eq!(string_literal("plain"), r#""plain""#);
/// assert_eq!(string_literal("say \"hi\""), r#""say \"hi\"""#);
/// assert_eq!(string_literal("a\nb"), r#""a\nb""#);
/// ```
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        push_escaped(&mut out, c, '"');
    }
    out.push('"');
    out
}

/// Spells `c` as a Rust character literal.
///
/// # Examples
///
/// ```
/// use optforge_codegen::format::char_literal;
///
/// assert_eq!(char_literal('o'), "'o'");
/// assert_eq!(char_literal('\''), r"'\''");
/// ```
pub fn char_literal(c: char) -> String {
    let mut out = String::with_capacity(4);
    out.push('\'');
    push_escaped(&mut out, c, '\'');
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, c: char, quote: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\0' => out.push_str("\\0"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() => {
            let _ = write!(out, "\\u{{{:x}}}", c as u32);
        }
        c => out.push(c),
    }
}

pub fn bool_literal(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Spells an inclusive value-count range, open-ended when `max` is `None`.
///
/// # Examples
///
/// ```
/// use optforge_codegen::format::count_range;
///
/// assert_eq!(count_range(1, Some(1)), "1..=1");
/// assert_eq!(count_range(0, None), "0..");
/// ```
pub fn count_range(min: u32, max: Option<u32>) -> String {
    match max {
        Some(max) => format!("{min}..={max}"),
        None => format!("{min}.."),
    }
}

/// Renders a single `//` comment line.
///
/// # Examples
///
/// ```
/// use optforge_codegen::format::line_comment;
///
/// assert_eq!(line_comment("hello").unwrap(), "// hello");
/// assert_eq!(line_comment("").unwrap(), "//");
/// assert!(line_comment("two\nlines").is_err());
/// ```
pub fn line_comment(text: &str) -> Result<String, FormatError> {
    if text.contains(['\n', '\r']) {
        return Err(FormatError::MultilineComment(text.to_string()));
    }
    let text = text.trim_end();
    if text.is_empty() {
        Ok("//".to_string())
    } else {
        Ok(format!("// {text}"))
    }
}

/// Splits a text block into its logical comment lines.
///
/// Trailing whitespace is trimmed from each line, runs of blank lines
/// collapse into a single blank line, and leading or trailing blank lines
/// are dropped.
///
/// # Examples
///
/// ```
/// use optforge_codegen::format::logical_lines;
///
/// let lines = logical_lines("\nfirst\n\n\n\nsecond  \r\nthird\n\n");
/// assert_eq!(lines, vec!["first", "", "second", "third"]);
/// ```
pub fn logical_lines(block: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = Vec::new();
    for line in block.lines().map(str::trim_end) {
        let previous_blank = lines.last().is_none_or(|last| last.is_empty());
        if line.is_empty() && previous_blank {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines
}

/// Renders a text block as `//` comment lines, one per logical line.
pub fn comment_lines(block: &str) -> Vec<String> {
    prefixed_lines("//", block)
}

/// Renders a text block as `///` doc comment lines, one per logical line.
pub fn doc_comment_lines(block: &str) -> Vec<String> {
    prefixed_lines("///", block)
}

fn prefixed_lines(prefix: &str, block: &str) -> Vec<String> {
    logical_lines(block)
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix} {line}")
            }
        })
        .collect()
}

/// Renders an outer attribute.
///
/// # Examples
///
/// ```
/// use optforge_codegen::format::attribute;
///
/// assert_eq!(attribute("automatically_derived", None), "#[automatically_derived]");
/// assert_eq!(attribute("allow", Some("clippy::all")), "#[allow(clippy::all)]");
/// ```
pub fn attribute(path: &str, args: Option<&str>) -> String {
    match args {
        Some(args) => format!("#[{path}({args})]"),
        None => format!("#[{path}]"),
    }
}

/// Line buffer with indentation tracking.
#[derive(Debug, Default)]
pub struct SourceWriter {
    buf: String,
    depth: usize,
}

impl SourceWriter {
    const INDENT: &'static str = "    ";

    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one line at the current indentation. Empty lines stay empty.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(Self::INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line.as_ref());
        }
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Writes `open`, runs `body` one level deeper, then writes `close`.
    pub fn block<F>(&mut self, open: &str, close: &str, body: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close);
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
