//! Pattern engine: the compiled extraction rules applied to every scanned line.
//!
//! Each rule is a regular expression with exactly one capture group that yields the
//! key name. The built-in rules cover Teardown's four input query calls over a quoted
//! string argument; callers may replace them with their own expressions.

use super::error::ConfigurationError;
use regex::{Regex, RegexBuilder};

/// Built-in rules: `(name, pattern)` for `InputPressed`, `InputDown`, `InputReleased`
/// and `InputValue`.
pub const DEFAULT_PATTERNS: [(&str, &str); 4] = [
    ("InputPressed", r#"InputPressed\(\s*["']([^"']+)["']\s*\)"#),
    ("InputDown", r#"InputDown\(\s*["']([^"']+)["']\s*\)"#),
    ("InputReleased", r#"InputReleased\(\s*["']([^"']+)["']\s*\)"#),
    ("InputValue", r#"InputValue\(\s*["']([^"']+)["']\s*\)"#),
];

/// A single hit of an extraction rule within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternHit<'a> {
    pub key_name: &'a str,
    pub matched_text: &'a str,
    /// Byte offset of the whole match within the line
    pub start: usize,
    pub end: usize,
}

/// A named, compiled extraction rule.
#[derive(Debug, Clone)]
pub struct ExtractionPattern {
    name: String,
    regex: Regex,
}

impl ExtractionPattern {
    /// Compile one rule, validating that it exposes exactly one capture group.
    ///
    /// `index` is only used to identify the rule in error messages.
    pub fn compile(
        index: usize,
        name: impl Into<String>,
        pattern: &str,
        case_insensitive: bool,
        whole_word: bool,
    ) -> Result<Self, ConfigurationError> {
        let source = if whole_word {
            format!(r"\b(?:{})\b", pattern)
        } else {
            pattern.to_string()
        };

        let regex = RegexBuilder::new(&source)
            .multi_line(true)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| ConfigurationError::InvalidPattern {
                index,
                pattern: pattern.to_string(),
                source,
            })?;

        // captures_len() counts the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != 1 {
            return Err(ConfigurationError::WrongCaptureGroupCount {
                index,
                pattern: pattern.to_string(),
                found: groups,
            });
        }

        Ok(Self {
            name: name.into(),
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// All non-overlapping hits in `line`, left to right.
    ///
    /// A match whose capture group did not participate yields no hit.
    pub fn find_in<'a>(&'a self, line: &'a str) -> impl Iterator<Item = PatternHit<'a>> + 'a {
        self.regex.captures_iter(line).filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?;
            Some(PatternHit {
                key_name: key.as_str(),
                matched_text: whole.as_str(),
                start: whole.start(),
                end: whole.end(),
            })
        })
    }
}

/// The ordered set of rules used by one scan.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<ExtractionPattern>,
}

impl PatternSet {
    /// Compile the built-in rules.
    pub fn defaults(case_insensitive: bool, whole_word: bool) -> Result<Self, ConfigurationError> {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .enumerate()
            .map(|(index, (name, pattern))| {
                ExtractionPattern::compile(index, *name, pattern, case_insensitive, whole_word)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Compile user-supplied rules, or the built-in ones when `custom` is `None` or empty.
    ///
    /// Fails on the first rule that does not compile or lacks a single capture group.
    pub fn compile(
        custom: Option<&[String]>,
        case_insensitive: bool,
        whole_word: bool,
    ) -> Result<Self, ConfigurationError> {
        let custom = match custom {
            Some(patterns) if !patterns.is_empty() => patterns,
            _ => return Self::defaults(case_insensitive, whole_word),
        };

        let patterns = custom
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                ExtractionPattern::compile(
                    index,
                    format!("custom-{}", index + 1),
                    pattern,
                    case_insensitive,
                    whole_word,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Compiled {} custom extraction patterns", patterns.len());
        Ok(Self { patterns })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractionPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
