//! Version records: one shared base plus a variant per release channel

use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::Platform;
use crate::version::number::VersionNumber;
use crate::version::timestamp;
use crate::version::types::Channel;

/// Fields every release record carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,

    /// When the release became available upstream
    #[serde(
        default,
        alias = "updated_at",
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,

    /// When this tool last recorded the release
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parsed_at: Option<DateTime<Utc>>,
}

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            published_at: None,
            parsed_at: None,
        }
    }

    pub fn number(&self) -> VersionNumber {
        VersionNumber::parse(&self.version)
    }
}

/// Behaviour shared by every channel-specific record.
///
/// Records are immutable values: the `with_*` methods return a new record
/// instead of mutating in place.
pub trait VersionRecord:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Identity of a record within its repository
    type Key: Clone + Debug + Display + Eq + Hash + Send + Sync;

    const CHANNEL: Channel;

    fn base(&self) -> &Version;

    fn with_base(self, base: Version) -> Self;

    fn key(&self) -> Self::Key;

    /// Channel-specific fields for detailed listings
    fn details(&self) -> Vec<(&'static str, String)>;

    fn display_name(&self) -> String {
        format!("v{}", self.version())
    }

    fn version(&self) -> &str {
        &self.base().version
    }

    fn number(&self) -> VersionNumber {
        self.base().number()
    }

    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.base().published_at
    }

    fn parsed_at(&self) -> Option<DateTime<Utc>> {
        self.base().parsed_at
    }

    fn with_published_at(self, published_at: DateTime<Utc>) -> Self {
        let base = Version {
            published_at: Some(timestamp::truncate(published_at)),
            ..self.base().clone()
        };
        self.with_base(base)
    }

    fn with_parsed_at(self, parsed_at: DateTime<Utc>) -> Self {
        let base = Version {
            parsed_at: Some(timestamp::truncate(parsed_at)),
            ..self.base().clone()
        };
        self.with_base(base)
    }
}

// =============================================================================
// Gemfile (container image tags)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemfileVersion {
    #[serde(flatten)]
    pub base: Version,

    #[serde(default)]
    pub gemfile_exists: bool,

    /// Archived Gemfile, relative to the channel data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemfile_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemfile_lock_path: Option<String>,
}

impl GemfileVersion {
    pub const GEMFILE: &str = "Gemfile";
    pub const LOCKFILE: &str = "Gemfile.lock.archived";

    pub fn new(version: impl Into<String>) -> Self {
        Self {
            base: Version::new(version),
            gemfile_exists: false,
            gemfile_path: None,
            gemfile_lock_path: None,
        }
    }

    /// Directory holding the archive, relative to the channel data directory
    pub fn archive_dir(&self) -> String {
        format!("v{}", self.base.version)
    }

    /// Record the archive as written, with paths in the standard layout
    pub fn with_archive(self, has_lockfile: bool) -> Self {
        let dir = self.archive_dir();
        Self {
            gemfile_exists: true,
            gemfile_path: Some(format!("{dir}/{}", Self::GEMFILE)),
            gemfile_lock_path: has_lockfile.then(|| format!("{dir}/{}", Self::LOCKFILE)),
            ..self
        }
    }

    /// Whether the archived Gemfile is present under `channel_dir`
    pub fn exists_locally(&self, channel_dir: &Path) -> bool {
        self.gemfile_exists
            && self
                .gemfile_path
                .as_ref()
                .is_some_and(|path| channel_dir.join(path).is_file())
    }
}

impl VersionRecord for GemfileVersion {
    type Key = String;
    const CHANNEL: Channel = Channel::Gemfile;

    fn base(&self) -> &Version {
        &self.base
    }

    fn with_base(self, base: Version) -> Self {
        Self { base, ..self }
    }

    fn key(&self) -> String {
        self.base.version.clone()
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut details = vec![("Gemfile archived", self.gemfile_exists.to_string())];
        if let Some(path) = &self.gemfile_path {
            details.push(("Gemfile", path.clone()));
        }
        if let Some(path) = &self.gemfile_lock_path {
            details.push(("Lockfile", path.clone()));
        }
        details
    }
}

// =============================================================================
// Snap (revision x architecture x channel)
// =============================================================================

fn default_arch() -> String {
    "amd64".to_string()
}

fn default_snap_channel() -> String {
    "stable".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapVersion {
    #[serde(flatten)]
    pub base: Version,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,

    #[serde(default = "default_arch")]
    pub arch: String,

    #[serde(default = "default_snap_channel")]
    pub channel: String,
}

/// Composite identity of a snap record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapKey {
    pub version: String,
    pub revision: Option<u64>,
    pub arch: String,
    pub channel: String,
}

impl Display for SnapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.revision {
            Some(revision) => write!(
                f,
                "{} (revision {}, {}, {})",
                self.version, revision, self.arch, self.channel
            ),
            None => write!(f, "{} ({}, {})", self.version, self.arch, self.channel),
        }
    }
}

impl SnapVersion {
    pub fn new(
        version: impl Into<String>,
        revision: Option<u64>,
        arch: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            base: Version::new(version),
            revision,
            arch: arch.into(),
            channel: channel.into(),
        }
    }
}

impl VersionRecord for SnapVersion {
    type Key = SnapKey;
    const CHANNEL: Channel = Channel::Snap;

    fn base(&self) -> &Version {
        &self.base
    }

    fn with_base(self, base: Version) -> Self {
        Self { base, ..self }
    }

    fn key(&self) -> SnapKey {
        SnapKey {
            version: self.base.version.clone(),
            revision: self.revision,
            arch: self.arch.clone(),
            channel: self.channel.clone(),
        }
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "Revision",
                self.revision
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            ("Architecture", self.arch.clone()),
            ("Channel", self.channel.clone()),
        ]
    }

    fn display_name(&self) -> String {
        match self.revision {
            Some(revision) => format!("{}-{}", self.base.version, revision),
            None => format!("v{}", self.base.version),
        }
    }
}

// =============================================================================
// Homebrew (tap tags)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomebrewVersion {
    #[serde(flatten)]
    pub base: Version,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl HomebrewVersion {
    pub fn new(version: impl Into<String>, commit_sha: Option<String>) -> Self {
        let base = Version::new(version);
        Self {
            tag_name: Some(format!("v{}", base.version)),
            base,
            commit_sha,
        }
    }

    pub fn tag_name(&self) -> String {
        self.tag_name
            .clone()
            .unwrap_or_else(|| format!("v{}", self.base.version))
    }
}

impl VersionRecord for HomebrewVersion {
    type Key = String;
    const CHANNEL: Channel = Channel::Homebrew;

    fn base(&self) -> &Version {
        &self.base
    }

    fn with_base(self, base: Version) -> Self {
        Self { base, ..self }
    }

    fn key(&self) -> String {
        self.base.version.clone()
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut details = vec![("Tag", self.tag_name())];
        if let Some(sha) = &self.commit_sha {
            details.push(("Commit", sha.clone()));
        }
        details
    }
}

// =============================================================================
// Chocolatey (package feed)
// =============================================================================

fn default_package_name() -> String {
    crate::config::PRODUCT_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChocolateyVersion {
    #[serde(flatten)]
    pub base: Version,

    #[serde(default = "default_package_name")]
    pub package_name: String,

    #[serde(default)]
    pub is_pre_release: bool,
}

impl ChocolateyVersion {
    pub fn new(version: impl Into<String>, is_pre_release: bool) -> Self {
        Self {
            base: Version::new(version),
            package_name: default_package_name(),
            is_pre_release,
        }
    }
}

impl VersionRecord for ChocolateyVersion {
    type Key = String;
    const CHANNEL: Channel = Channel::Chocolatey;

    fn base(&self) -> &Version {
        &self.base
    }

    fn with_base(self, base: Version) -> Self {
        Self { base, ..self }
    }

    fn key(&self) -> String {
        self.base.version.clone()
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Package", self.package_name.clone()),
            ("Pre-release", self.is_pre_release.to_string()),
        ]
    }
}

// =============================================================================
// Binary (packed releases)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryVersion {
    #[serde(flatten)]
    pub base: Version,

    /// Free-form release metadata (`tag_name`, `html_url`, `assets`)
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// A downloadable file attached to a binary release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl BinaryVersion {
    pub fn new(version: impl Into<String>, metadata: BTreeMap<String, Value>) -> Self {
        Self {
            base: Version::new(version),
            metadata,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.metadata.get("tag_name").and_then(Value::as_str)
    }

    pub fn html_url(&self) -> Option<&str> {
        self.metadata.get("html_url").and_then(Value::as_str)
    }

    pub fn assets(&self) -> Vec<ReleaseAsset> {
        self.metadata
            .get("assets")
            .and_then(|assets| serde_json::from_value(assets.clone()).ok())
            .unwrap_or_default()
    }

    /// Asset name the packed executable is published under for `platform`
    pub fn asset_name(platform: Platform) -> Option<String> {
        platform
            .asset_suffix()
            .map(|suffix| format!("{}-{suffix}", crate::config::PRODUCT_NAME))
    }

    pub fn asset_for(&self, platform: Platform) -> Option<ReleaseAsset> {
        let name = Self::asset_name(platform)?;
        self.assets()
            .into_iter()
            .find(|asset| asset.name == name || asset.name == format!("{name}.exe"))
    }

    pub fn has_asset_for(&self, platform: Platform) -> bool {
        self.asset_for(platform).is_some()
    }
}

impl VersionRecord for BinaryVersion {
    type Key = String;
    const CHANNEL: Channel = Channel::Binary;

    fn base(&self) -> &Version {
        &self.base
    }

    fn with_base(self, base: Version) -> Self {
        Self { base, ..self }
    }

    fn key(&self) -> String {
        self.base.version.clone()
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut details = Vec::new();
        if let Some(tag) = self.tag_name() {
            details.push(("Tag", tag.to_string()));
        }
        if let Some(url) = self.html_url() {
            details.push(("Release", url.to_string()));
        }
        let assets = self.assets();
        if !assets.is_empty() {
            let names: Vec<_> = assets.into_iter().map(|a| a.name).collect();
            details.push(("Assets", names.join(", ")));
        }
        details
    }

    fn display_name(&self) -> String {
        self.base.version.clone()
    }
}
