//! The cross-reference grammar as a table of named line patterns.
//!
//! Every scanner in the crate goes through this table: definition scanning,
//! reference scanning and word detection under the caret all share
//! [`IDENTIFIER_CLASS`], so the set of characters that make up an identifier
//! is defined exactly once.
//!
//! Definition patterns are anchored at the start of the line (leading
//! whitespace allowed) and therefore match at most once per line. Reference
//! patterns may match any number of times on one line.

use std::fmt;
use std::ops::Range as ByteRange;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Characters allowed in a cross-reference identifier.
pub const IDENTIFIER_CLASS: &str = r"[A-Za-z0-9\-:+,.@]+";

/// Whether a pattern introduces an identifier or points at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternRole {
    Definition,
    Reference,
}

/// Named entries of the pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    /// `{#my-section}`
    SectionStart,
    /// ```` ```{figure-md} fig-1 ````
    FigureMdBackticks,
    /// `:::{figure-md} fig-1`
    FigureMdColons,
    /// `:name: tbl-results`
    NameDirective,
    /// `` {numref}`my-section` ``
    NumRef,
    /// `[label](my-section`
    LinkTarget,
}

impl PatternKind {
    pub const ALL: [PatternKind; 6] = [
        PatternKind::SectionStart,
        PatternKind::FigureMdBackticks,
        PatternKind::FigureMdColons,
        PatternKind::NameDirective,
        PatternKind::NumRef,
        PatternKind::LinkTarget,
    ];

    pub fn role(self) -> PatternRole {
        match self {
            PatternKind::SectionStart
            | PatternKind::FigureMdBackticks
            | PatternKind::FigureMdColons
            | PatternKind::NameDirective => PatternRole::Definition,
            PatternKind::NumRef | PatternKind::LinkTarget => PatternRole::Reference,
        }
    }

    /// Text preceding the identifier, as a regex fragment.
    fn prefix(self) -> &'static str {
        match self {
            PatternKind::SectionStart => r"^\s*\{#",
            PatternKind::FigureMdBackticks => r"^\s*`{3,}\{figure-md\}\s*",
            PatternKind::FigureMdColons => r"^\s*:{3,}\{figure-md\}\s*",
            PatternKind::NameDirective => r"^\s*:name:\s*",
            PatternKind::NumRef => r"\{numref\}`",
            PatternKind::LinkTarget => r"\]\(",
        }
    }

    /// Short human-readable label used in completion details.
    pub fn describe(self) -> &'static str {
        match self {
            PatternKind::SectionStart => "section",
            PatternKind::FigureMdBackticks | PatternKind::FigureMdColons => "figure",
            PatternKind::NameDirective => "name",
            PatternKind::NumRef => "numref",
            PatternKind::LinkTarget => "link",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A compiled table entry.
#[derive(Debug)]
pub struct LinePattern {
    pub kind: PatternKind,
    regex: Regex,
}

/// One identifier captured on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'a> {
    pub kind: PatternKind,
    pub identifier: &'a str,
    /// Byte offsets of the identifier within the line.
    pub span: ByteRange<usize>,
}

impl LinePattern {
    fn compile(kind: PatternKind) -> Option<Self> {
        let source = format!("{}({IDENTIFIER_CLASS})", kind.prefix());
        let regex = Regex::new(&source).ok()?;
        Some(Self { kind, regex })
    }

    /// Every identifier this pattern captures on `line`, left to right.
    pub fn captures<'a>(&'a self, line: &'a str) -> impl Iterator<Item = PatternMatch<'a>> + 'a {
        self.regex.captures_iter(line).filter_map(move |captures| {
            let identifier = captures.get(1)?;
            Some(PatternMatch {
                kind: self.kind,
                identifier: identifier.as_str(),
                span: identifier.range(),
            })
        })
    }
}

struct PatternTable {
    definitions: Vec<LinePattern>,
    references: Vec<LinePattern>,
    identifier: Option<Regex>,
}

static PATTERNS: OnceLock<PatternTable> = OnceLock::new();

fn table() -> &'static PatternTable {
    PATTERNS.get_or_init(|| {
        let (definitions, references) = PatternKind::ALL
            .into_iter()
            .filter_map(LinePattern::compile)
            .partition(|pattern| pattern.kind.role() == PatternRole::Definition);
        PatternTable {
            definitions,
            references,
            identifier: Regex::new(IDENTIFIER_CLASS).ok(),
        }
    })
}

/// Patterns that introduce identifiers.
pub fn definition_patterns() -> &'static [LinePattern] {
    &table().definitions
}

/// Patterns that point at identifiers.
pub fn reference_patterns() -> &'static [LinePattern] {
    &table().references
}

/// Byte spans of every maximal identifier-class run on `line`.
pub fn identifier_spans(line: &str) -> Vec<ByteRange<usize>> {
    match &table().identifier {
        Some(regex) => regex.find_iter(line).map(|found| found.range()).collect(),
        None => Vec::new(),
    }
}

/// True if `text` is a complete identifier.
pub fn is_identifier(text: &str) -> bool {
    !text.is_empty() && identifier_spans(text) == [0..text.len()]
}

/// Converts a byte offset within `line` into a character column.
pub(crate) fn byte_to_column(line: &str, byte: usize) -> usize {
    line.get(..byte)
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| line.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(
        patterns: &'static [LinePattern],
        line: &'static str,
    ) -> Vec<(PatternKind, &'static str)> {
        patterns
            .iter()
            .flat_map(|pattern| pattern.captures(line))
            .map(|found| (found.kind, found.identifier))
            .collect()
    }

    #[test]
    fn table_compiles_every_kind() {
        assert_eq!(definition_patterns().len(), 4);
        assert_eq!(reference_patterns().len(), 2);
    }

    #[test]
    fn definition_kinds() {
        let defs = definition_patterns();
        assert_eq!(
            matches(defs, "{#my-section}"),
            vec![(PatternKind::SectionStart, "my-section")]
        );
        assert_eq!(
            matches(defs, "```{figure-md} fig-1"),
            vec![(PatternKind::FigureMdBackticks, "fig-1")]
        );
        assert_eq!(
            matches(defs, "````{figure-md}fig-2"),
            vec![(PatternKind::FigureMdBackticks, "fig-2")]
        );
        assert_eq!(
            matches(defs, ":::{figure-md} fig:3"),
            vec![(PatternKind::FigureMdColons, "fig:3")]
        );
        assert_eq!(
            matches(defs, "   :name: tbl-results"),
            vec![(PatternKind::NameDirective, "tbl-results")]
        );
    }

    #[test]
    fn definitions_are_anchored() {
        let defs = definition_patterns();
        assert!(matches(defs, "text {#not-a-section}").is_empty());
        assert!(matches(defs, "see :name: nope").is_empty());
        assert!(matches(defs, "``{figure-md} too-short").is_empty());
        assert!(matches(defs, "{#}").is_empty());
    }

    #[test]
    fn references_capture_every_occurrence() {
        let refs = reference_patterns();
        let found = matches(
            refs,
            "See {numref}`fig-a`, {numref}`fig-b` and [this](sec.1) or [that](x@y+z).",
        );
        assert_eq!(
            found,
            vec![
                (PatternKind::NumRef, "fig-a"),
                (PatternKind::NumRef, "fig-b"),
                (PatternKind::LinkTarget, "sec.1"),
                (PatternKind::LinkTarget, "x@y+z"),
            ]
        );
    }

    #[test]
    fn reference_spans_are_identifier_bytes() {
        let line = "x {numref}`fig-tree` y";
        let found: Vec<_> = reference_patterns()
            .iter()
            .flat_map(|pattern| pattern.captures(line))
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(&line[found[0].span.clone()], "fig-tree");
    }

    #[test]
    fn identifier_helpers() {
        assert!(is_identifier("fig-tree"));
        assert!(is_identifier("a:b+c,d.e@f"));
        assert!(!is_identifier("fig tree"));
        assert!(!is_identifier(""));
        assert_eq!(identifier_spans("a b-c"), vec![0..1, 2..5]);
        assert_eq!(byte_to_column("héllo", 3), 2);
        assert_eq!(byte_to_column("abc", 99), 3);
    }
}
