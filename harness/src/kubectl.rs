/*!

Structured queries against the cluster-query tool.

[`query`] asks for a resource as JSON and deserializes it into an
[`ObservedResource`]; a missing resource is recognized from the tool's
diagnostic and surfaces as [`Error::NotFound`](crate::error::Error::NotFound)
rather than a generic command failure. [`apply`] and [`delete_resource`] drive
the generated-manifest workflow.

!*/

use crate::error::{self, AssertionError, Result};
use crate::expect::{self, ExpectationSet, Lookup};
use crate::proc::Tools;
use log::debug;
use serde_json::Value;
use snafu::ResultExt;
use std::ffi::OsString;
use std::path::Path;

/// An opaque hierarchical document returned by querying the deployment
/// target. Consumed for field-path assertions, not retained.
#[derive(Debug, Clone)]
pub struct ObservedResource(Value);

impl ObservedResource {
    pub fn json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    /// Resolves a field path, tagging the outcome instead of panicking on
    /// unexpected document shapes.
    pub fn path(&self, path: &str) -> Lookup<'_> {
        expect::lookup(&self.0, path)
    }

    pub fn string_at(&self, path: &str) -> Option<&str> {
        match self.path(path) {
            Lookup::Found(value) => value.as_str(),
            _ => None,
        }
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        match self.path(path) {
            Lookup::Found(value) => value.as_bool(),
            _ => None,
        }
    }

    pub fn u64_at(&self, path: &str) -> Option<u64> {
        match self.path(path) {
            Lookup::Found(value) => value.as_u64(),
            _ => None,
        }
    }

    /// Evaluates the expectations in order; the first divergence fails with
    /// path, expected, and actual.
    pub fn check(&self, expectations: &ExpectationSet) -> std::result::Result<(), AssertionError> {
        expect::expect(&self.0, expectations)
    }
}

impl From<Value> for ObservedResource {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Fetches `kind`/`name` as JSON. Cluster-scoped kinds pass `None` for the
/// namespace.
pub fn query(
    tools: &Tools,
    kind: &str,
    namespace: Option<&str>,
    name: &str,
) -> Result<ObservedResource> {
    let mut args = vec!["get".to_string(), kind.to_string()];
    if let Some(namespace) = namespace {
        args.push("-n".to_string());
        args.push(namespace.to_string());
    }
    args.push(name.to_string());
    args.push("-o".to_string());
    args.push("json".to_string());

    let output = match tools.kubectl(&args) {
        Ok(output) => output,
        Err(error::Error::CommandFailed { stderr, .. }) if is_not_found(&stderr) => {
            debug!("{} '{}' not found", kind, name);
            return error::NotFoundSnafu { kind, name }.fail();
        }
        Err(e) => return Err(e),
    };

    let value: Value = serde_json::from_str(&output.stdout).context(error::ParseFailureSnafu {
        what: format!("kubectl get {}", kind),
    })?;
    Ok(ObservedResource(value))
}

/// Applies a generated manifest file.
pub fn apply(tools: &Tools, manifest: &Path) -> Result<()> {
    let args: Vec<OsString> = vec![
        OsString::from("apply"),
        OsString::from("-f"),
        manifest.as_os_str().to_owned(),
    ];
    tools.kubectl(args)?;
    Ok(())
}

/// Deletes a resource created from a generated manifest.
pub fn delete_resource(
    tools: &Tools,
    kind: &str,
    namespace: Option<&str>,
    name: &str,
) -> Result<()> {
    let mut args = vec!["delete".to_string(), kind.to_string()];
    if let Some(namespace) = namespace {
        args.push("-n".to_string());
        args.push(namespace.to_string());
    }
    args.push(name.to_string());
    tools.kubectl(&args)?;
    Ok(())
}

/// `kubectl get` reports a missing resource as a normal command failure with
/// `Error from server (NotFound): <kind> "<name>" not found` on stderr. Some
/// proxied setups drop the reason code, so the trailing `not found` is
/// matched as well.
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)") || stderr.contains("not found")
}
