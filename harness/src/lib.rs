/*!

`chart-harness` drives the install/upgrade/uninstall lifecycle of a chart-based
deployment through external CLIs (`helm` for lifecycle, `kubectl` for queries)
and verifies the resulting cluster state. It is a library consumed by an
acceptance-test runner, not a standalone executable.

The pieces:

- [`proc::Tools`] locates the external binaries and runs them with captured
  output and an optional hard deadline.
- [`helm`] builds [`helm::DeploymentRequest`]s and walks the release
  lifecycle; [`helm::Release`] guards the valid transition order.
- [`kubectl`] fetches resources as JSON ([`kubectl::ObservedResource`]) and
  applies/deletes generated manifests.
- [`poll`] blocks until an eventually-consistent condition holds.
- [`expect`] evaluates ordered field-path expectations against observed
  documents.
- [`properties`] loads the suite-wide configuration file.
- [`manifest`] generates COSI class/claim documents into scoped temp files.

Operations are sequential and synchronous; callers running cases in parallel
must keep namespaces and release names distinct (see
[`manifest::unique_name`]).

!*/

pub mod error;
pub mod expect;
pub mod helm;
pub mod kubectl;
pub mod manifest;
pub mod poll;
pub mod proc;
pub mod properties;

pub use error::{AssertionError, Error, Result};
pub use expect::{ExpectationSet, Lookup};
pub use helm::{DeploymentRequest, LifecycleState, Release};
pub use kubectl::ObservedResource;
pub use manifest::{unique_name, ManifestFile};
pub use poll::poll_until;
pub use proc::Tools;
pub use properties::SuiteProperties;
