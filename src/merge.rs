use std::cmp::Reverse;
use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::{UpdateOptions, VersionsDocument};
use crate::error::DocumentError;
use crate::types::{Release, VersionEntry};

/// What an update changed, for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    /// Versions that had no entry before.
    pub added: Vec<String>,
    /// Versions that were active before and are not any more.
    pub deactivated: Vec<String>,
    /// Versions dropped because they fell past the retention limit.
    pub evicted: Vec<String>,
}

impl UpdateSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deactivated.is_empty() && self.evicted.is_empty()
    }
}

pub fn filter_stable(releases: Vec<Release>) -> Vec<Release> {
    releases.into_iter().filter(Release::is_stable).collect()
}

/// Merges freshly fetched releases (newest first) into the existing entries.
///
/// Existing entries for fetched versions are kept as they are. New versions get
/// a fresh entry, active only when within the first `keep_active` fetched
/// positions. Existing entries that were not fetched are kept but deactivated.
pub fn merge_versions(
    existing: Vec<VersionEntry>,
    fetched: &[Release],
    options: &UpdateOptions,
) -> Vec<VersionEntry> {
    let mut known: IndexMap<String, VersionEntry> = existing
        .into_iter()
        .map(|entry| (entry.version().to_string(), entry))
        .collect();
    let mut merged = Vec::with_capacity(known.len() + fetched.len());
    let mut placed = HashSet::new();

    for (position, release) in fetched.iter().enumerate() {
        let version = release.version();
        if !placed.insert(version) {
            debug!(version, "skipping repeated release");
            continue;
        }
        match known.shift_remove(version) {
            Some(entry) => merged.push(entry),
            None => {
                let active = options.mark_new_active && position < options.keep_active;
                debug!(version, active, "adding new version");
                merged.push(VersionEntry::new(&release.tag_name, active));
            }
        }
    }

    merged.extend(known.into_values().map(|mut entry| {
        entry.set_active(false);
        entry
    }));
    merged
}

/// Sort key for a version string: integer components of `v1.2.3`, padded to
/// three. Signed components are allowed. Anything non-numeric sorts as `0.0.0`.
pub fn version_key(version: &str) -> Vec<i64> {
    let parts: Result<Vec<i64>, _> = version
        .trim_start_matches('v')
        .split('.')
        .map(str::parse::<i64>)
        .collect();
    match parts {
        Ok(mut parts) => {
            if parts.len() < 3 {
                parts.resize(3, 0);
            }
            parts
        }
        Err(_) => vec![0, 0, 0],
    }
}

/// Sorts newest first and drops everything past `max_versions`.
/// Returns the dropped entries.
pub fn sort_and_truncate(
    entries: &mut Vec<VersionEntry>,
    max_versions: usize,
) -> Vec<VersionEntry> {
    entries.sort_by_key(|entry| Reverse(version_key(entry.version())));
    if entries.len() > max_versions {
        entries.split_off(max_versions)
    } else {
        Vec::new()
    }
}

/// Applies fetched releases to the document's `versions` list.
pub fn update_versions(
    document: &mut VersionsDocument,
    fetched: &[Release],
    options: &UpdateOptions,
) -> Result<UpdateSummary, DocumentError> {
    let existing = document.versions()?;
    let previously: IndexMap<String, bool> = existing
        .iter()
        .map(|entry| (entry.version().to_string(), entry.is_active()))
        .collect();

    let mut merged = merge_versions(existing, fetched, options);
    let evicted = sort_and_truncate(&mut merged, options.max_versions);

    let mut summary = UpdateSummary {
        evicted: evicted.iter().map(|e| e.version().to_string()).collect(),
        ..UpdateSummary::default()
    };
    for entry in &merged {
        match previously.get(entry.version()) {
            None => summary.added.push(entry.version().to_string()),
            Some(true) if !entry.is_active() => {
                summary.deactivated.push(entry.version().to_string())
            }
            Some(_) => {}
        }
    }

    info!(
        added = summary.added.len(),
        deactivated = summary.deactivated.len(),
        evicted = summary.evicted.len(),
        "merged releases"
    );
    document.set_versions(merged)?;
    Ok(summary)
}
