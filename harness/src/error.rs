use snafu::Snafu;
use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to create '{}' process: {}", what, source))]
    Process {
        what: String,
        source: std::io::Error,
    },

    #[snafu(display(
        "'{}' failed with exit status '{}'\n\n{}\n\n{}",
        what,
        exit,
        stdout,
        stderr
    ))]
    CommandFailed {
        what: String,
        exit: i32,
        stdout: String,
        stderr: String,
    },

    #[snafu(display("Failed to parse output of '{}' as JSON: {}", what, source))]
    ParseFailure {
        what: String,
        source: serde_json::Error,
    },

    #[snafu(display("{} '{}' was not found", kind, name))]
    NotFound { kind: String, name: String },

    #[snafu(display("Timed-out after {:?} waiting for {}", timeout, what))]
    Timeout { what: String, timeout: Duration },

    #[snafu(display("Cannot {} a release that is {}", action, state))]
    Lifecycle { action: String, state: String },

    #[snafu(display("Failed to read suite properties from '{}': {}", path.display(), source))]
    PropertiesRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse suite properties from '{}': {}", path.display(), source))]
    PropertiesParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Failed to serialize manifest document: {}", source))]
    ManifestSerialize { source: serde_yaml::Error },

    #[snafu(display("Failed to write manifest file: {}", source))]
    ManifestWrite { source: std::io::Error },
}

/// An observed value diverging from an expectation. This is a test outcome
/// rather than a harness fault, so it is kept apart from [`Error`].
#[derive(Debug, Snafu)]
#[snafu(display(
    "Expectation failed at '{}': expected {}, actual {}",
    path,
    expected,
    actual
))]
#[snafu(visibility(pub))]
pub struct AssertionError {
    pub path: String,
    pub expected: String,
    pub actual: String,
}
