use super::{release, releases};
use crate::config::{UpdateOptions, VersionsDocument};
use crate::merge::{filter_stable, merge_versions, sort_and_truncate, update_versions, version_key};
use crate::types::VersionEntry;
use serde_yaml::Value;
use std::collections::HashSet;

fn options(keep_active: usize) -> UpdateOptions {
    UpdateOptions {
        keep_active,
        ..UpdateOptions::default()
    }
}

fn versions(entries: &[VersionEntry]) -> Vec<&str> {
    entries.iter().map(VersionEntry::version).collect()
}

fn entries_from_yaml(yaml: &str) -> Vec<VersionEntry> {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn test_filter_stable_drops_drafts_and_prereleases() {
    let mut draft = release("v1.60.0");
    draft.draft = true;
    let mut pre = release("v1.60.0-pre1");
    pre.prerelease = true;
    let input = vec![draft, release("v1.59.0"), pre, release("v1.58.1")];

    let stable = filter_stable(input);

    let tags: Vec<_> = stable.iter().map(|r| r.version()).collect();
    assert_eq!(tags, vec!["v1.59.0", "v1.58.1"]);
}

#[test]
fn test_version_key_parsing() {
    assert_eq!(version_key("v1.2.3"), vec![1, 2, 3]);
    assert_eq!(version_key("1.2"), vec![1, 2, 0]);
    assert_eq!(version_key("v2"), vec![2, 0, 0]);
    assert_eq!(version_key("v1.2.3.4"), vec![1, 2, 3, 4]);
    assert_eq!(version_key("bogus"), vec![0, 0, 0]);
    assert_eq!(version_key("v1.60.0-pre1"), vec![0, 0, 0]);
    assert_eq!(version_key("v1..2"), vec![0, 0, 0]);
}

#[test]
fn test_version_key_accepts_signed_components() {
    assert_eq!(version_key("v1.-1.0"), vec![1, -1, 0]);
    assert_eq!(version_key("v1.+2.0"), vec![1, 2, 0]);

    let mut entries: Vec<_> = ["v1.-1.0", "v1.0.0", "v0.9.0"]
        .iter()
        .map(|v| VersionEntry::new(v, false))
        .collect();
    sort_and_truncate(&mut entries, 20);

    assert_eq!(versions(&entries), vec!["v1.0.0", "v1.-1.0", "v0.9.0"]);
}

#[test]
fn test_sort_orders_numerically_and_sinks_malformed() {
    let mut entries: Vec<_> = ["v1.10.0", "v1.2.0", "v2.0.0", "bogus"]
        .iter()
        .map(|v| VersionEntry::new(v, false))
        .collect();

    let dropped = sort_and_truncate(&mut entries, 20);

    assert!(dropped.is_empty());
    assert_eq!(versions(&entries), vec!["v2.0.0", "v1.10.0", "v1.2.0", "bogus"]);
}

#[test]
fn test_sort_keeps_merge_order_for_equal_keys() {
    let mut entries: Vec<_> = ["junk-a", "v1.0.0", "junk-b", "v1.0"]
        .iter()
        .map(|v| VersionEntry::new(v, false))
        .collect();

    sort_and_truncate(&mut entries, 20);

    assert_eq!(versions(&entries), vec!["v1.0.0", "v1.0", "junk-a", "junk-b"]);
}

#[test]
fn test_truncate_drops_lowest_ranked() {
    let mut entries: Vec<_> = (0..25)
        .map(|minor| VersionEntry::new(&format!("v1.{minor}.0"), false))
        .collect();

    let dropped = sort_and_truncate(&mut entries, 20);

    assert_eq!(entries.len(), 20);
    assert_eq!(entries[0].version(), "v1.24.0");
    assert_eq!(entries[19].version(), "v1.5.0");
    assert_eq!(
        versions(&dropped),
        vec!["v1.4.0", "v1.3.0", "v1.2.0", "v1.1.0", "v1.0.0"]
    );
}

#[test]
fn test_new_releases_activation_window() {
    let fetched = releases(&["v1.55.0", "v1.54.0", "v1.53.0", "v1.52.0"]);

    let merged = merge_versions(Vec::new(), &fetched, &options(2));

    let active: Vec<_> = merged
        .iter()
        .filter(|e| e.is_active())
        .map(VersionEntry::version)
        .collect();
    assert_eq!(active, vec!["v1.55.0", "v1.54.0"]);
    assert_eq!(merged.len(), 4);
    assert_eq!(merged[0].tag(), Some("v1.55.0"));
}

#[test]
fn test_activation_window_larger_than_fetch() {
    let fetched = releases(&["v1.55.0", "v1.54.0"]);

    let merged = merge_versions(Vec::new(), &fetched, &options(5));

    assert!(merged.iter().all(VersionEntry::is_active));
}

#[test]
fn test_mark_new_active_disabled() {
    let fetched = releases(&["v1.55.0", "v1.54.0"]);
    let opts = UpdateOptions {
        mark_new_active: false,
        ..UpdateOptions::default()
    };

    let merged = merge_versions(Vec::new(), &fetched, &opts);

    assert!(merged.iter().all(|e| !e.is_active()));
}

#[test]
fn test_existing_entries_are_preserved() {
    let existing = entries_from_yaml(
        r#"
- version: v1.50.0
  tag: v1.50.0
  active: false
  note: pinned by platform team
- version: v1.49.0
  active: true
  tag: v1.49.0
"#,
    );
    let fetched = releases(&["v1.50.0", "v1.49.0"]);

    let merged = merge_versions(existing.clone(), &fetched, &options(5));

    assert_eq!(merged, existing);
    assert_eq!(
        merged[0].get("note"),
        Some(&Value::from("pinned by platform team"))
    );
    assert!(!merged[0].is_active());
}

#[test]
fn test_stale_entries_are_deactivated_not_removed() {
    let existing = entries_from_yaml(
        r#"
- version: v1.40.0
  tag: v1.40.0
  active: true
  owner: infra
"#,
    );
    let fetched = releases(&["v1.51.0"]);

    let merged = merge_versions(existing, &fetched, &options(5));

    assert_eq!(versions(&merged), vec!["v1.51.0", "v1.40.0"]);
    assert!(!merged[1].is_active());
    assert_eq!(merged[1].get("owner"), Some(&Value::from("infra")));
}

#[test]
fn test_empty_fetch_deactivates_everything() {
    let existing = entries_from_yaml(
        r#"
- {version: v1.50.0, tag: v1.50.0, active: true}
- {version: v1.49.0, tag: v1.49.0, active: true}
"#,
    );

    let merged = merge_versions(existing, &[], &options(5));

    assert_eq!(versions(&merged), vec!["v1.50.0", "v1.49.0"]);
    assert!(merged.iter().all(|e| !e.is_active()));
}

#[test]
fn test_no_duplicate_versions() {
    let existing = entries_from_yaml(
        r#"
- {version: v1.50.0, tag: v1.50.0, active: true}
- {version: v1.48.0, tag: v1.48.0, active: true}
- {version: v1.50.0, tag: v1.50.0, active: false, note: second}
"#,
    );
    let fetched = releases(&["v1.51.0", "v1.50.0", "v1.51.0", "v1.49.0"]);

    let merged = merge_versions(existing, &fetched, &options(5));

    let unique: HashSet<_> = merged.iter().map(VersionEntry::version).collect();
    assert_eq!(unique.len(), merged.len());
    assert_eq!(versions(&merged), vec!["v1.51.0", "v1.50.0", "v1.49.0", "v1.48.0"]);
    // the later duplicate in the file wins
    assert_eq!(merged[1].get("note"), Some(&Value::from("second")));
}

#[test]
fn test_update_scenario() {
    let mut document = VersionsDocument::from_yaml(
        r#"
versions:
- version: v1.50.0
  tag: v1.50.0
  active: true
"#,
    )
    .unwrap();
    let fetched = releases(&["v1.51.0", "v1.50.0", "v1.49.0"]);

    let summary = update_versions(&mut document, &fetched, &options(2)).unwrap();

    let result = document.versions().unwrap();
    let flags: Vec<_> = result.iter().map(|e| (e.version(), e.is_active())).collect();
    assert_eq!(
        flags,
        vec![("v1.51.0", true), ("v1.50.0", true), ("v1.49.0", false)]
    );
    assert_eq!(summary.added, vec!["v1.51.0", "v1.49.0"]);
    assert!(summary.deactivated.is_empty());
    assert!(summary.evicted.is_empty());
}

#[test]
fn test_update_is_idempotent() {
    let mut document = VersionsDocument::from_yaml(
        r#"
channel: stable
versions:
- {version: v1.40.0, tag: v1.40.0, active: true, owner: infra}
- {version: v1.50.0, tag: v1.50.0, active: false}
"#,
    )
    .unwrap();
    let fetched = releases(&["v1.52.0", "v1.51.0", "v1.50.0"]);

    update_versions(&mut document, &fetched, &options(1)).unwrap();
    let first = document.clone();
    let summary = update_versions(&mut document, &fetched, &options(1)).unwrap();

    assert_eq!(document, first);
    assert!(summary.is_empty());
}

#[test]
fn test_update_reports_deactivated_and_evicted() {
    let mut document = VersionsDocument::from_yaml(
        r#"
versions:
- {version: v1.40.0, tag: v1.40.0, active: true}
- {version: v1.30.0, tag: v1.30.0, active: true}
"#,
    )
    .unwrap();
    let fetched = releases(&["v1.52.0", "v1.51.0"]);
    let opts = UpdateOptions {
        keep_active: 5,
        mark_new_active: true,
        max_versions: 3,
    };

    let summary = update_versions(&mut document, &fetched, &opts).unwrap();

    assert_eq!(summary.added, vec!["v1.52.0", "v1.51.0"]);
    assert_eq!(summary.deactivated, vec!["v1.40.0"]);
    assert_eq!(summary.evicted, vec!["v1.30.0"]);
    assert_eq!(document.versions().unwrap().len(), 3);
}
