use crate::error::{self, Result};
use serde::Deserialize;
use snafu::ResultExt;
use std::fs;
use std::path::Path;

/// Suite-wide configuration read once from `suiteProperties.json` at suite
/// start and passed explicitly into every scenario. A missing or malformed
/// file is fatal for the whole suite, since every case depends on it.
///
/// Keys are `SCREAMING_SNAKE_CASE` in the file, e.g.:
///
/// ```json
/// {
///     "SYSTEM_DOMAIN": "acceptance.test",
///     "CLUSTER_IP": "10.0.0.10",
///     "IMAGE_TAG": "0.24.0",
///     "CHARTS_VER": "0.24.0",
///     "CHARTS_VER_PREV": "0.23.0"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SuiteProperties {
    /// The public domain the gateway is exposed under.
    pub system_domain: String,

    /// The cluster IP used to compose public DNS names.
    #[serde(default)]
    pub cluster_ip: String,

    /// The gateway image tag (without the leading `v`).
    pub image_tag: String,

    /// The chart version under test.
    #[serde(default)]
    pub charts_ver: String,

    /// The previous published chart version, for upgrade scenarios.
    #[serde(default)]
    pub charts_ver_prev: String,

    /// Overrides the generated release name when non-empty.
    #[serde(default)]
    pub release: String,

    /// Overrides the generated namespace when non-empty.
    #[serde(default)]
    pub namespace: String,

    /// The chart reference passed to the lifecycle tool.
    #[serde(default = "default_charts_root")]
    pub charts_root: String,

    /// The gateway image repository, without a tag.
    #[serde(default = "default_image_name")]
    pub image_name: String,

    /// Extra whitespace-separated arguments appended to installs/upgrades at
    /// the version under test.
    #[serde(default)]
    pub charts_extra_args: String,

    /// Extra whitespace-separated arguments appended to installs at the
    /// previous version.
    #[serde(default)]
    pub charts_prev_extra_args: String,

    /// The revision annotation expected after one upgrade. Revision numbering
    /// is the lifecycle tool's bookkeeping, so the expected value is supplied
    /// here rather than computed.
    #[serde(default = "default_revision_on_upgrade")]
    pub expected_revision_on_upgrade: String,
}

fn default_charts_root() -> String {
    String::from("charts/osgw")
}

fn default_image_name() -> String {
    String::from("registry.opensuse.org/osgw/osgw")
}

fn default_revision_on_upgrade() -> String {
    String::from("2")
}

impl SuiteProperties {
    /// Reads the properties file. Call once at suite start; failures here
    /// abort the suite.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).context(error::PropertiesReadSnafu { path })?;
        serde_json::from_str(&contents).context(error::PropertiesParseSnafu { path })
    }

    /// The release name to use: the configured override, or `fallback` when
    /// the override is empty (the file convention for "not set").
    pub fn release_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        non_empty_or(&self.release, fallback)
    }

    /// The namespace to use, with the same empty-means-unset convention.
    pub fn namespace_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        non_empty_or(&self.namespace, fallback)
    }

    pub fn extra_args(&self) -> Vec<String> {
        split_args(&self.charts_extra_args)
    }

    pub fn prev_extra_args(&self) -> Vec<String> {
        split_args(&self.charts_prev_extra_args)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(String::from).collect()
}
