use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Separator used when several file paths or line numbers are folded into one record.
pub const JOIN_SEPARATOR: &str = "; ";

/// Separator used between the distinct context snippets of a merged record.
pub const CONTEXT_SEPARATOR: &str = " | ";

/// Field names of a [`RawMatch`] in serialization order (CSV header).
pub const RAW_MATCH_FIELDS: [&str; 7] = [
    "file_path",
    "line_number",
    "key_name",
    "context",
    "matched_text",
    "mod_name",
    "mod_enabled",
];

/// Key name → merged records, iterated lexicographically.
pub type Aggregated = BTreeMap<String, Vec<MergedRecord>>;

/// One lexical occurrence of a keybind call in a scanned file.
///
/// `mod_name` and `mod_enabled` are stamped by the extraction engine once the
/// owning mod is known; a freshly scanned file yields an empty `mod_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    pub file_path: String,
    /// 1-based line number within the file
    pub line_number: usize,
    pub key_name: String,
    /// Up to ~100 characters of the line around the match, trimmed
    pub context: String,
    pub matched_text: String,
    pub mod_name: String,
    pub mod_enabled: bool,
}

impl RawMatch {
    /// Stamp the match with the owning mod's display name and status.
    pub fn with_mod(mut self, record: &ModRecord) -> Self {
        self.mod_name = record.display_name.clone();
        self.mod_enabled = record.enabled;
        self
    }
}

/// Line number of a merged record.
///
/// A record that stands for a single occurrence keeps the plain integer; once
/// occurrences are folded together the numbers become a sorted, `"; "`-joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineNumbers {
    Single(usize),
    Joined(String),
}

impl LineNumbers {
    /// Build from a set of line numbers (deduplicated and sorted numerically).
    pub fn joined(mut numbers: Vec<usize>) -> Self {
        numbers.sort_unstable();
        numbers.dedup();
        let parts: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
        LineNumbers::Joined(parts.join(JOIN_SEPARATOR))
    }

    /// All line numbers this value stands for.
    pub fn numbers(&self) -> Vec<usize> {
        match self {
            LineNumbers::Single(n) => vec![*n],
            LineNumbers::Joined(joined) => joined
                .split(JOIN_SEPARATOR.trim())
                .filter_map(|part| part.trim().parse().ok())
                .collect(),
        }
    }
}

/// All raw occurrences of one key inside one mod, folded into a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    /// Single path, or sorted `"; "`-joined union of contributing paths
    pub file_path: String,
    pub line_number: LineNumbers,
    pub key_name: String,
    /// First distinct contexts (at most three) joined with `" | "`
    pub context: String,
    pub matched_text: String,
    pub mod_name: String,
    pub mod_enabled: bool,
    /// Number of raw matches folded into this record
    #[serde(default = "default_occurrences")]
    pub occurrences: usize,
}

fn default_occurrences() -> usize {
    1
}

impl MergedRecord {
    /// The individual file paths this record covers.
    pub fn file_paths(&self) -> Vec<&str> {
        self.file_path
            .split(JOIN_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// The individual context snippets this record covers.
    pub fn contexts(&self) -> Vec<&str> {
        if self.occurrences > 1 {
            self.context.split(CONTEXT_SEPARATOR).collect()
        } else {
            vec![self.context.as_str()]
        }
    }
}

impl From<RawMatch> for MergedRecord {
    fn from(raw: RawMatch) -> Self {
        Self {
            file_path: raw.file_path,
            line_number: LineNumbers::Single(raw.line_number),
            key_name: raw.key_name,
            context: raw.context,
            matched_text: raw.matched_text,
            mod_name: raw.mod_name,
            mod_enabled: raw.mod_enabled,
            occurrences: 1,
        }
    }
}

/// One resolved mod directory. Immutable for the duration of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRecord {
    pub path: Utf8PathBuf,
    pub display_name: String,
    pub enabled: bool,
}

impl ModRecord {
    pub fn summary(&self) -> ModSummary {
        ModSummary {
            name: self.display_name.clone(),
            enabled: self.enabled,
        }
    }
}

/// Serialized form of a [`ModRecord`] inside `mod_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSummary {
    pub name: String,
    pub enabled: bool,
}

/// A key claimed by more than one mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConflict {
    pub key_name: String,
    pub mods: Vec<String>,
}

/// Distinct mod names among a key's records, in first-seen order.
pub fn distinct_mods(records: &[MergedRecord]) -> Vec<&str> {
    let mut mods: Vec<&str> = Vec::new();
    for record in records {
        if !mods.contains(&record.mod_name.as_str()) {
            mods.push(&record.mod_name);
        }
    }
    mods
}

/// Top-level artifact of one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(rename = "results")]
    pub raw_matches: Vec<RawMatch>,
    pub aggregated: Aggregated,
    pub mod_info: IndexMap<String, ModSummary>,
    /// Distinct files that contributed at least one match
    pub total_files_scanned: usize,
    pub total_matches: usize,
}

impl ScanResult {
    /// Number of distinct key names found.
    pub fn unique_keybinds(&self) -> usize {
        self.aggregated.len()
    }

    /// True when the key is claimed by two or more distinct mods.
    pub fn is_conflict(&self, key_name: &str) -> bool {
        self.aggregated
            .get(key_name)
            .is_some_and(|records| distinct_mods(records).len() >= 2)
    }

    /// All conflicting keys in lexicographic order.
    pub fn conflicts(&self) -> Vec<KeyConflict> {
        self.aggregated
            .iter()
            .filter_map(|(key, records)| {
                let mods = distinct_mods(records);
                (mods.len() >= 2).then(|| KeyConflict {
                    key_name: key.clone(),
                    mods: mods.into_iter().map(String::from).collect(),
                })
            })
            .collect()
    }

    /// Number of merged records per key, lexicographic.
    pub fn occurrence_counts(&self) -> Vec<(&str, usize)> {
        self.aggregated
            .iter()
            .map(|(key, records)| (key.as_str(), records.len()))
            .collect()
    }

    /// Human-readable summary of the scan.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Scanned {} files", self.total_files_scanned);
        let _ = writeln!(out, "Found {} keybind matches", self.total_matches);
        let _ = writeln!(out, "Unique keybinds: {}", self.unique_keybinds());

        let conflicts = self.conflicts();
        if !conflicts.is_empty() {
            let _ = writeln!(out, "\nConflicts ({}):", conflicts.len());
            for conflict in &conflicts {
                let _ = writeln!(out, "  {}: {}", conflict.key_name, conflict.mods.join(", "));
            }
        }

        out
    }
}
