use crate::types::Release;
use chrono::{TimeZone, Utc};

mod merge;

pub(crate) fn release(tag: &str) -> Release {
    Release {
        name: format!("Release {tag}"),
        tag_name: tag.to_string(),
        published_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        draft: false,
        prerelease: false,
    }
}

pub(crate) fn releases(tags: &[&str]) -> Vec<Release> {
    tags.iter().map(|tag| release(tag)).collect()
}
