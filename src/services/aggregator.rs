//! Aggregator: the two-phase merge from raw matches to the per-key index.
//!
//! 1. **Intra-mod merge**: records sharing `(mod_name, key_name)` are folded into one
//!    [`MergedRecord`]. Paths are deduplicated and sorted, line numbers deduplicated
//!    and sorted numerically, and the first three distinct contexts kept.
//! 2. **Cross-mod grouping**: merged records are grouped by `key_name` into a map
//!    iterated in lexicographic key order.
//!
//! Without the first phase a mod referencing a key on several lines would appear as
//! several owners of that key. A key is in conflict when its entry holds two or more
//! distinct mod names.
//!
//! The merge works on [`MergedRecord`]s and understands already-joined fields, so
//! running it on its own output changes nothing.

use crate::models::{
    Aggregated, CONTEXT_SEPARATOR, JOIN_SEPARATOR, LineNumbers, MergedRecord, RawMatch,
    distinct_mods,
};
use indexmap::IndexMap;

/// Maximum number of distinct context snippets kept on a merged record.
pub const MAX_CONTEXTS: usize = 3;

fn merge_group(mut group: Vec<MergedRecord>) -> MergedRecord {
    if group.len() == 1 {
        return group.remove(0);
    }

    let mut paths: Vec<&str> = group.iter().flat_map(|r| r.file_paths()).collect();
    paths.sort_unstable();
    paths.dedup();

    let lines: Vec<usize> = group.iter().flat_map(|r| r.line_number.numbers()).collect();

    let mut contexts: Vec<&str> = Vec::with_capacity(MAX_CONTEXTS);
    for context in group.iter().flat_map(|r| r.contexts()) {
        if contexts.len() == MAX_CONTEXTS {
            break;
        }
        if !contexts.contains(&context) {
            contexts.push(context);
        }
    }

    let file_path = paths.join(JOIN_SEPARATOR);
    let context = contexts.join(CONTEXT_SEPARATOR);
    let occurrences = group.iter().map(|r| r.occurrences).sum();
    let first = &group[0];

    MergedRecord {
        file_path,
        line_number: LineNumbers::joined(lines),
        key_name: first.key_name.clone(),
        context,
        matched_text: first.matched_text.clone(),
        mod_name: first.mod_name.clone(),
        mod_enabled: first.mod_enabled,
        occurrences,
    }
}

/// Phase one: fold records sharing `(mod_name, key_name)`.
///
/// Groups come out in the order their first record was seen. A group of one is
/// passed through untouched.
pub fn merge_by_mod(records: impl IntoIterator<Item = MergedRecord>) -> Vec<MergedRecord> {
    let mut groups: IndexMap<(String, String), Vec<MergedRecord>> = IndexMap::new();

    for record in records {
        groups
            .entry((record.mod_name.clone(), record.key_name.clone()))
            .or_default()
            .push(record);
    }

    groups.into_values().map(merge_group).collect()
}

/// Phase two: group merged records by key name.
pub fn group_by_key(records: Vec<MergedRecord>) -> Aggregated {
    let mut aggregated = Aggregated::new();
    for record in records {
        aggregated
            .entry(record.key_name.clone())
            .or_default()
            .push(record);
    }
    aggregated
}

/// Run both phases over a scan's raw matches.
pub fn aggregate(raw_matches: &[RawMatch]) -> Aggregated {
    let merged = merge_by_mod(raw_matches.iter().cloned().map(MergedRecord::from));
    let aggregated = group_by_key(merged);

    let conflicts = aggregated
        .values()
        .filter(|records| is_conflict(records))
        .count();
    tracing::debug!(
        "Aggregated {} matches into {} keys ({} in conflict)",
        raw_matches.len(),
        aggregated.len(),
        conflicts
    );

    aggregated
}

/// Re-run both phases over an existing index.
pub fn reaggregate(aggregated: &Aggregated) -> Aggregated {
    group_by_key(merge_by_mod(aggregated.values().flatten().cloned()))
}

/// True when a key's records come from two or more distinct mods.
pub fn is_conflict(records: &[MergedRecord]) -> bool {
    distinct_mods(records).len() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(mod_name: &str, key: &str, file: &str, line: usize, context: &str) -> RawMatch {
        RawMatch {
            file_path: file.to_string(),
            line_number: line,
            key_name: key.to_string(),
            context: context.to_string(),
            matched_text: format!("InputPressed(\"{}\")", key),
            mod_name: mod_name.to_string(),
            mod_enabled: true,
        }
    }

    #[test]
    fn test_single_occurrence_passes_through() {
        let matches = vec![raw("A", "jump", "A/main.lua", 3, "ctx")];
        let aggregated = aggregate(&matches);

        let records = &aggregated["jump"];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line_number, LineNumbers::Single(3));
        assert_eq!(records[0].file_path, "A/main.lua");
        assert_eq!(records[0].occurrences, 1);
    }

    #[test]
    fn test_intra_mod_merge() {
        let matches = vec![
            raw("A", "jump", "A/options.lua", 12, "c1"),
            raw("A", "jump", "A/main.lua", 2, "c2"),
            raw("A", "jump", "A/main.lua", 12, "c1"),
            raw("A", "jump", "A/main.lua", 40, "c3"),
            raw("A", "jump", "A/main.lua", 41, "c4"),
        ];
        let aggregated = aggregate(&matches);
        let record = &aggregated["jump"][0];

        assert_eq!(aggregated["jump"].len(), 1);
        assert_eq!(record.file_path, "A/main.lua; A/options.lua");
        assert_eq!(record.line_number, LineNumbers::Joined("2; 12; 40; 41".to_string()));
        assert_eq!(record.context, "c1 | c2 | c3");
        assert_eq!(record.occurrences, 5);
    }

    #[test]
    fn test_cross_mod_grouping_and_conflicts() {
        let matches = vec![
            raw("B", "fire", "B/main.lua", 1, "x"),
            raw("A", "jump", "A/main.lua", 1, "x"),
            raw("A", "fire", "A/main.lua", 2, "y"),
            raw("A", "fire", "A/main.lua", 5, "z"),
        ];
        let aggregated = aggregate(&matches);

        let keys: Vec<&String> = aggregated.keys().collect();
        assert_eq!(keys, vec!["fire", "jump"]);
        assert_eq!(distinct_mods(&aggregated["fire"]), vec!["B", "A"]);
        assert!(is_conflict(&aggregated["fire"]));
        assert!(!is_conflict(&aggregated["jump"]));
    }

    #[test]
    fn test_same_key_in_one_mod_is_not_a_conflict() {
        let matches = vec![
            raw("A", "k", "A/main.lua", 1, "x"),
            raw("A", "k", "A/options.lua", 9, "y"),
        ];
        assert!(!is_conflict(&aggregate(&matches)["k"]));
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_reaggregate_is_noop() {
        let matches = vec![
            raw("A", "k", "A/main.lua", 10, "x"),
            raw("A", "k", "A/main.lua", 2, "y"),
            raw("B", "k", "B/main.lua", 1, "z"),
        ];
        let once = aggregate(&matches);
        assert_eq!(reaggregate(&once), once);
    }

    fn arb_raw() -> impl Strategy<Value = RawMatch> {
        (
            prop::sample::select(vec!["A", "B", "C"]),
            prop::sample::select(vec!["jump", "fire", "use"]),
            prop::sample::select(vec!["main.lua", "options.lua", "readme.md"]),
            1usize..200,
            prop::sample::select(vec!["ctx one", "ctx two", "ctx three", "ctx four"]),
        )
            .prop_map(|(m, k, f, line, ctx)| raw(m, k, &format!("{}/{}", m, f), line, ctx))
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(matches in prop::collection::vec(arb_raw(), 0..40)) {
            let once = aggregate(&matches);
            prop_assert_eq!(reaggregate(&once), once);
        }

        #[test]
        fn prop_mod_key_pairs_unique(matches in prop::collection::vec(arb_raw(), 0..40)) {
            let aggregated = aggregate(&matches);
            for records in aggregated.values() {
                let mods = distinct_mods(records);
                prop_assert_eq!(mods.len(), records.len());
            }

            let total: usize = aggregated.values().flatten().map(|r| r.occurrences).sum();
            prop_assert_eq!(total, matches.len());
        }
    }
}
