/*!

Generated manifest documents for the COSI workflow.

Class and claim objects are built as typed structs, serialized to YAML into a
named temp file, and handed to the query tool's `apply`. The temp file is
removed on every exit path, so parallel suite runs cannot litter the working
directory.

!*/

use crate::error::{self, Result};
use serde::Serialize;
use snafu::ResultExt;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

pub const COSI_API_VERSION: &str = "objectstorage.k8s.io/v1alpha1";

/// The driver name a release registers with the object-storage interface.
pub fn driver_name(release: &str, namespace: &str) -> String {
    format!("{}.{}.objectstorage.k8s.io", release, namespace)
}

/// Suffixes `prefix` with the current nanosecond timestamp. Callers use this
/// to keep concurrently running suites in distinct namespaces and releases;
/// the harness itself performs no coordination.
pub fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{}-{}", prefix, nanos)
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

/// The policy governing buckets provisioned through a class.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketClass {
    pub kind: String,
    pub api_version: String,
    pub metadata: Metadata,
    pub driver_name: String,
    pub deletion_policy: String,
}

impl BucketClass {
    pub fn new(name: &str, driver_name: &str, deletion_policy: &str) -> Self {
        Self {
            kind: "BucketClass".to_string(),
            api_version: COSI_API_VERSION.to_string(),
            metadata: Metadata {
                namespace: None,
                name: name.to_string(),
            },
            driver_name: driver_name.to_string(),
            deletion_policy: deletion_policy.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAccessClass {
    pub kind: String,
    pub api_version: String,
    pub metadata: Metadata,
    pub driver_name: String,
    pub authentication_type: String,
}

impl BucketAccessClass {
    pub fn new(name: &str, driver_name: &str, authentication_type: &str) -> Self {
        Self {
            kind: "BucketAccessClass".to_string(),
            api_version: COSI_API_VERSION.to_string(),
            metadata: Metadata {
                namespace: None,
                name: name.to_string(),
            },
            driver_name: driver_name.to_string(),
            authentication_type: authentication_type.to_string(),
        }
    }
}

/// A request for object storage against a class.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketClaim {
    pub kind: String,
    pub api_version: String,
    pub metadata: Metadata,
    pub spec: BucketClaimSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketClaimSpec {
    pub bucket_class_name: String,
    pub protocols: Vec<String>,
}

impl BucketClaim {
    pub fn new(namespace: &str, name: &str, bucket_class_name: &str) -> Self {
        Self {
            kind: "BucketClaim".to_string(),
            api_version: COSI_API_VERSION.to_string(),
            metadata: Metadata {
                namespace: Some(namespace.to_string()),
                name: name.to_string(),
            },
            spec: BucketClaimSpec {
                bucket_class_name: bucket_class_name.to_string(),
                protocols: vec!["s3".to_string()],
            },
        }
    }
}

/// A manifest document serialized to a temp file. The file is deleted when
/// this goes out of scope, success or failure.
#[derive(Debug)]
pub struct ManifestFile {
    file: NamedTempFile,
}

impl ManifestFile {
    pub fn write<T: Serialize>(document: &T) -> Result<Self> {
        let yaml = serde_yaml::to_string(document).context(error::ManifestSerializeSnafu)?;
        let mut file = tempfile::Builder::new()
            .prefix("manifest-")
            .suffix(".yaml")
            .tempfile()
            .context(error::ManifestWriteSnafu)?;
        file.write_all(yaml.as_bytes())
            .context(error::ManifestWriteSnafu)?;
        file.flush().context(error::ManifestWriteSnafu)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod test_manifest {
    use super::*;
    use std::fs;

    #[test]
    fn bucket_class_round_trips_through_yaml() {
        let class = BucketClass::new(
            "bucket-class-delete",
            &driver_name("gw", "gw-ns"),
            "Delete",
        );
        let yaml = serde_yaml::to_string(&class).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["kind"], serde_yaml::Value::from("BucketClass"));
        assert_eq!(parsed["apiVersion"], serde_yaml::Value::from(COSI_API_VERSION));
        assert_eq!(parsed["deletionPolicy"], serde_yaml::Value::from("Delete"));
        assert_eq!(
            parsed["driverName"],
            serde_yaml::Value::from("gw.gw-ns.objectstorage.k8s.io")
        );
        assert_eq!(
            parsed["metadata"]["name"],
            serde_yaml::Value::from("bucket-class-delete")
        );
    }

    #[test]
    fn bucket_claim_carries_namespace_and_s3_protocol() {
        let claim = BucketClaim::new("gw-ns", "bucket-claim-0", "bucket-class-delete");
        let yaml = serde_yaml::to_string(&claim).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["metadata"]["namespace"], serde_yaml::Value::from("gw-ns"));
        assert_eq!(
            parsed["spec"]["bucketClassName"],
            serde_yaml::Value::from("bucket-class-delete")
        );
        assert_eq!(parsed["spec"]["protocols"][0], serde_yaml::Value::from("s3"));
    }

    #[test]
    fn class_without_namespace_omits_the_key() {
        let class = BucketAccessClass::new("bac-key", "driver", "KEY");
        let yaml = serde_yaml::to_string(&class).unwrap();
        assert!(!yaml.contains("namespace"));
        assert!(yaml.contains("authenticationType: KEY"));
    }

    #[test]
    fn manifest_file_exists_until_dropped() {
        let class = BucketClass::new("bc", "driver", "Retain");
        let path = {
            let manifest = ManifestFile::write(&class).unwrap();
            let path = manifest.path().to_path_buf();
            let contents = fs::read_to_string(&path).unwrap();
            assert!(contents.contains("deletionPolicy: Retain"));
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn unique_names_differ() {
        assert_ne!(unique_name("gw-cosi"), unique_name("gw-cosi"));
    }
}
