use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_humanize::HumanTime;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::config::{UpdateOptions, VersionsDocument};
use crate::github::ReleaseSource;
use crate::merge::{filter_stable, update_versions, UpdateSummary};
use crate::types::Release;

const RELEASES_SHOWN: usize = 10;

/// Settings for one run of the updater.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config_path: PathBuf,
    pub limit: u8,
    pub dry_run: bool,
    pub options: UpdateOptions,
}

/// Result of a run that got as far as merging.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub document: VersionsDocument,
    pub summary: UpdateSummary,
    /// False for dry runs.
    pub written: bool,
}

pub struct VersionUpdater<S> {
    source: S,
    settings: RunSettings,
}

impl<S: ReleaseSource> VersionUpdater<S> {
    pub fn new(source: S, settings: RunSettings) -> Self {
        Self { source, settings }
    }

    /// Fetches, merges and persists. Returns `None` when there was nothing
    /// stable to merge and the file was left alone.
    pub async fn run(&self) -> Result<Option<UpdateOutcome>> {
        println!("Fetching gRPC releases...");
        let releases = self.fetch_stable().await?;
        println!("Found {} stable releases", releases.len());

        // An empty listing would deactivate every tracked version.
        if releases.is_empty() {
            warn!("no stable releases fetched, leaving configuration untouched");
            println!("No releases found");
            return Ok(None);
        }

        println!("\nLatest releases:");
        for (i, release) in releases.iter().take(RELEASES_SHOWN).enumerate() {
            println!("  {:2}. {} ({})", i + 1, release.version(), published(release));
        }

        let path = &self.settings.config_path;
        let mut document = VersionsDocument::from_file(path)?;
        let summary = update_versions(&mut document, &releases, &self.settings.options)?;
        print_summary(&summary);

        if self.settings.dry_run {
            println!("\nDry run - changes that would be made:");
            println!("{}", document.to_yaml()?);
            return Ok(Some(UpdateOutcome {
                document,
                summary,
                written: false,
            }));
        }

        document
            .save(path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        println!("\nUpdated {}", path.display());

        let active: Vec<_> = document
            .versions()?
            .into_iter()
            .filter(|entry| entry.is_active())
            .collect();
        println!("Active versions ({}):", active.len());
        for entry in &active {
            println!("  - {}", entry.version());
        }

        Ok(Some(UpdateOutcome {
            document,
            summary,
            written: true,
        }))
    }

    async fn fetch_stable(&self) -> Result<Vec<Release>> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        spinner.set_message("querying GitHub releases");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let fetched = self.source.fetch_releases(self.settings.limit).await;
        spinner.finish_and_clear();

        Ok(filter_stable(fetched?))
    }
}

fn published(release: &Release) -> String {
    match release.published_at {
        Some(at) => {
            let age = at.signed_duration_since(Utc::now());
            format!("{}, {}", at.format("%Y-%m-%d"), HumanTime::from(age))
        }
        None => "unpublished".to_string(),
    }
}

fn print_summary(summary: &UpdateSummary) {
    if summary.is_empty() {
        println!("\nNo version changes");
        return;
    }
    println!();
    for version in &summary.added {
        println!("  + {version}");
    }
    for version in &summary.deactivated {
        println!("  ~ {version} (deactivated)");
    }
    for version in &summary.evicted {
        println!("  - {version} (dropped)");
    }
}
