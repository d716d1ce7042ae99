//! Integration tests for mod discovery and status resolution
//!
//! These tests verify:
//! - Container detection stops at two levels
//! - Display names and manifest statuses combine into mod records
//! - File name filtering is case-insensitive

use camino::{Utf8Path, Utf8PathBuf};
use keyscan::NullObserver;
use keyscan::services::mod_resolver::build_mod_record;
use keyscan::services::{resolve_mod_dirs, resolve_statuses, should_scan};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn create_test_root() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

fn touch(path: &Utf8Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_nested_container_is_not_expanded() {
    let (_temp_dir, root) = create_test_root();
    // root/collection/{ModA,ModB}: collection qualifies through a deep walk, so it is
    // taken as a mod itself rather than recursed into.
    touch(&root.join("collection").join("ModA").join("main.lua"), "");
    touch(&root.join("collection").join("ModB").join("main.lua"), "");

    let dirs = resolve_mod_dirs(&[root.clone()], &NullObserver);
    assert_eq!(dirs, vec![root.join("collection")]);

    let dirs = resolve_mod_dirs(&[root.join("collection")], &NullObserver);
    assert_eq!(
        dirs,
        vec![
            root.join("collection").join("ModA"),
            root.join("collection").join("ModB")
        ]
    );
}

#[test]
fn test_container_ignores_non_mod_subdirectories() {
    let (_temp_dir, root) = create_test_root();
    touch(&root.join("ModA").join("info.txt"), "name: A\n");
    touch(&root.join("screenshots").join("shot.png"), "png");
    touch(&root.join("ModB").join("Readme.TXT"), "B mod\n");

    let dirs = resolve_mod_dirs(&[root.clone()], &NullObserver);
    assert_eq!(dirs, vec![root.join("ModA"), root.join("ModB")]);
}

#[test]
fn test_records_from_manifest_and_metadata() {
    let (_temp_dir, root) = create_test_root();
    let mods = root.join("mods");
    touch(&mods.join("2001").join("info.txt"), "name = Workshop Gun\n");
    touch(&mods.join("2001").join("main.lua"), "");
    touch(&mods.join("local_tool").join("README.md"), "## Local Tool\n");

    let manifest = root.join("mods.xml");
    touch(
        &manifest,
        r#"<mods>
    <mod id="steam-2001" active="false"/>
    <mod id="local-local_tool" active="true"/>
    <mod id="builtin" active="true"/>
</mods>"#,
    );

    let statuses = resolve_statuses(Some(manifest.as_path()), &NullObserver);
    assert_eq!(statuses.len(), 2);

    let records: Vec<_> = resolve_mod_dirs(&[mods.clone()], &NullObserver)
        .iter()
        .map(|dir| build_mod_record(dir, &statuses, encoding_rs::UTF_8))
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].display_name, "Workshop Gun");
    assert!(!records[0].enabled);
    assert_eq!(records[1].display_name, "Local Tool");
    assert!(records[1].enabled);
}

proptest! {
    #[test]
    fn prop_should_scan_ignores_case(
        name in prop::sample::select(vec!["main.lua", "options.lua", "info.txt", "readme.md", "readme"]),
        mask in prop::collection::vec(any::<bool>(), 11),
    ) {
        let mixed: String = name
            .chars()
            .zip(mask.iter().cycle())
            .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
            .collect();
        prop_assert!(should_scan(&mixed));
    }

    #[test]
    fn prop_other_scripts_are_rejected(stem in "[a-z]{1,12}") {
        prop_assume!(stem != "main" && stem != "options" && !stem.starts_with("readme"));
        let name = format!("{}.lua", stem);
        prop_assert!(!should_scan(&name));
    }
}
