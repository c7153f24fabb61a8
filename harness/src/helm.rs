/*!

Release lifecycle operations against the deployment-lifecycle tool.

A [`DeploymentRequest`] describes one named release of a chart; [`install`],
[`install_then_upgrade`] and [`uninstall`] run the corresponding verbs and
block until the tool reports readiness (`--wait`). [`Release`] wraps a request
in a state guard enforcing the valid lifecycle order:

```text
Uninstalled -> Installing -> Installed -> (Upgrading -> Installed)* ->
Uninstalling -> Uninstalled
```

Every install that succeeds must be matched by a teardown before the process
exits; the guard checks transition order but cleanup remains the caller's
responsibility.

!*/

use crate::error::{self, Result};
use crate::proc::Tools;
use log::{error, info};
use snafu::ensure;
use std::fmt;

/// One named, versioned instantiation of a chart in a namespace. Immutable
/// once built; discarded after teardown.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    release: String,
    namespace: String,
    chart: String,
    version: Option<String>,
    overrides: Vec<(String, String)>,
    extra_args: Vec<String>,
}

impl DeploymentRequest {
    pub fn new(release: &str, namespace: &str, chart: &str) -> Self {
        Self {
            release: release.to_string(),
            namespace: namespace.to_string(),
            chart: chart.to_string(),
            version: None,
            overrides: Vec::new(),
            extra_args: Vec::new(),
        }
    }

    /// Pins the chart version (`--version`).
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Appends one `--set key=value` override. Order is preserved.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.overrides.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends raw arguments after all generated ones, e.g. the suite's
    /// `CHARTS_EXTRA_ARGS`.
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn chart(&self) -> &str {
        &self.chart
    }
}

/// Installs the release, creating its namespace, and blocks until the tool
/// reports readiness or fails.
pub fn install(tools: &Tools, request: &DeploymentRequest) -> Result<()> {
    info!(
        "Installing release '{}' into namespace '{}'",
        request.release, request.namespace
    );
    tools.helm(install_args(request))?;
    Ok(())
}

/// Upgrades an already-installed release in place.
pub fn upgrade(tools: &Tools, request: &DeploymentRequest) -> Result<()> {
    info!(
        "Upgrading release '{}' in namespace '{}'",
        request.release, request.namespace
    );
    tools.helm(upgrade_args(request))?;
    Ok(())
}

/// Two-phase upgrade scenario: install at `prior_version`, then upgrade the
/// same release to `target_version`. Each transition increments the tool's
/// revision counter by one; the expected revision is the caller's to assert,
/// never computed here.
pub fn install_then_upgrade(
    tools: &Tools,
    request: &DeploymentRequest,
    prior_version: &str,
    target_version: &str,
) -> Result<()> {
    install(tools, &request.clone().version(prior_version))?;
    upgrade(tools, &request.clone().version(target_version))
}

/// Best-effort teardown. The error is logged as well as returned, so callers
/// that are already failing can report the teardown problem without letting
/// it mask the original failure.
pub fn uninstall(tools: &Tools, request: &DeploymentRequest) -> Result<()> {
    info!(
        "Uninstalling release '{}' from namespace '{}'",
        request.release, request.namespace
    );
    let result = tools.helm([
        "uninstall",
        "-n",
        &request.namespace,
        &request.release,
        "--wait",
    ]);
    if let Err(e) = &result {
        error!("Teardown of release '{}' failed: {}", request.release, e);
    }
    result.map(|_| ())
}

fn install_args(request: &DeploymentRequest) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        "--create-namespace".to_string(),
        "-n".to_string(),
        request.namespace.clone(),
        request.release.clone(),
        request.chart.clone(),
    ];
    push_common_args(&mut args, request);
    args
}

fn upgrade_args(request: &DeploymentRequest) -> Vec<String> {
    let mut args = vec![
        "upgrade".to_string(),
        request.release.clone(),
        "-n".to_string(),
        request.namespace.clone(),
        request.chart.clone(),
    ];
    push_common_args(&mut args, request);
    args
}

fn push_common_args(args: &mut Vec<String>, request: &DeploymentRequest) {
    if let Some(version) = &request.version {
        args.push("--version".to_string());
        args.push(version.clone());
    }
    args.push("--wait".to_string());
    for (key, value) in &request.overrides {
        args.push("--set".to_string());
        args.push(format!("{}={}", key, value));
    }
    args.extend(request.extra_args.iter().cloned());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    Installed,
    Upgrading,
    Uninstalling,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            LifecycleState::Uninstalled => "uninstalled",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Upgrading => "upgrading",
            LifecycleState::Uninstalling => "uninstalling",
        };
        write!(f, "{}", state)
    }
}

/// A request plus its lifecycle state. Operations off the valid edges fail
/// with [`crate::error::Error::Lifecycle`] before any process is spawned.
#[derive(Debug)]
pub struct Release {
    request: DeploymentRequest,
    state: LifecycleState,
}

impl Release {
    pub fn new(request: DeploymentRequest) -> Self {
        Self {
            request,
            state: LifecycleState::Uninstalled,
        }
    }

    pub fn request(&self) -> &DeploymentRequest {
        &self.request
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn install(&mut self, tools: &Tools) -> Result<()> {
        self.enter("install", LifecycleState::Uninstalled, LifecycleState::Installing)?;
        match install(tools, &self.request) {
            Ok(()) => {
                self.state = LifecycleState::Installed;
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Uninstalled;
                Err(e)
            }
        }
    }

    pub fn upgrade(&mut self, tools: &Tools, target_version: &str) -> Result<()> {
        self.enter("upgrade", LifecycleState::Installed, LifecycleState::Upgrading)?;
        let request = self.request.clone().version(target_version);
        let result = upgrade(tools, &request);
        // A failed upgrade leaves the prior revision installed.
        self.state = LifecycleState::Installed;
        if result.is_ok() {
            self.request = request;
        }
        result
    }

    pub fn uninstall(&mut self, tools: &Tools) -> Result<()> {
        self.enter(
            "uninstall",
            LifecycleState::Installed,
            LifecycleState::Uninstalling,
        )?;
        let result = uninstall(tools, &self.request);
        self.state = LifecycleState::Uninstalled;
        result
    }

    fn enter(&mut self, action: &str, expected: LifecycleState, next: LifecycleState) -> Result<()> {
        ensure!(
            self.state == expected,
            error::LifecycleSnafu {
                action,
                state: self.state.to_string(),
            }
        );
        self.state = next;
        Ok(())
    }
}
