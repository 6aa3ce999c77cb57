use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::mapping::Index;
use serde_yaml::{Mapping, Value};

use crate::error::DocumentError;

/// One release as listed by the GitHub releases API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Release {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    pub tag_name: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

impl Release {
    /// The version string a release is tracked under.
    pub fn version(&self) -> &str {
        &self.tag_name
    }

    pub fn is_stable(&self) -> bool {
        !self.draft && !self.prerelease
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

const VERSION_KEY: &str = "version";
const TAG_KEY: &str = "tag";
const ACTIVE_KEY: &str = "active";

/// A tracked version in the configuration file.
///
/// Entries are open records: besides `version`, `tag` and `active`, operators
/// may add arbitrary fields. All fields are kept in their original order so an
/// entry that passes through an update is written back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Mapping", into = "Mapping")]
pub struct VersionEntry {
    version: String,
    fields: Mapping,
}

impl VersionEntry {
    /// Creates the entry for a newly discovered release.
    pub fn new(tag: &str, active: bool) -> Self {
        let mut fields = Mapping::new();
        fields.insert(Value::from(VERSION_KEY), Value::from(tag));
        fields.insert(Value::from(TAG_KEY), Value::from(tag));
        fields.insert(Value::from(ACTIVE_KEY), Value::from(active));
        Self {
            version: tag.to_string(),
            fields,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tag(&self) -> Option<&str> {
        self.fields.get(TAG_KEY).and_then(Value::as_str)
    }

    /// A missing or non-boolean `active` field counts as inactive.
    pub fn is_active(&self) -> bool {
        self.fields
            .get(ACTIVE_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_active(&mut self, active: bool) {
        self.fields.insert(Value::from(ACTIVE_KEY), Value::from(active));
    }

    /// Looks up any field, including operator-added ones with non-string keys.
    pub fn get<I: Index>(&self, key: I) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl TryFrom<Mapping> for VersionEntry {
    type Error = DocumentError;

    fn try_from(fields: Mapping) -> Result<Self, Self::Error> {
        let version = match fields.get(VERSION_KEY) {
            Some(Value::String(version)) => version.clone(),
            Some(other) => {
                return Err(DocumentError::InvalidEntry(format!(
                    "`version` must be a string, found {other:?}"
                )))
            }
            None => {
                return Err(DocumentError::InvalidEntry(
                    "entry is missing the `version` field".to_string(),
                ))
            }
        };
        Ok(Self { version, fields })
    }
}

impl From<VersionEntry> for Mapping {
    fn from(entry: VersionEntry) -> Self {
        entry.fields
    }
}
