#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the changelog crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Every failure is fatal for a changelog run: nothing is retried and no
//! partial document is written. The CLI reports the message and exits with
//! the status returned by [`Error::exit_code`].

use std::path::{Path, PathBuf};

/// Unified error type returned by the pipeline and the CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Transport or API failure while talking to the tracker.
    #[error("request for {context} failed: {source}")]
    Network {
        /// Description of the request that failed.
        context: String,
        /// Underlying client error.
        source:  octocrab::Error
    },
    /// The tracker answered with a payload that could not be decoded.
    #[error("malformed response for {context}: {source}")]
    Parse {
        /// Description of the request whose payload was rejected.
        context: String,
        /// Underlying decoding error.
        source:  serde_json::Error
    },
    /// Wraps I/O errors raised while writing the changelog document.
    #[error("failed to write changelog at {path:?}: {source}")]
    Filesystem {
        /// Location of the file or directory being written.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Wraps I/O errors that occur while reading configuration files.
    #[error("failed to read configuration from {path:?}: {source}")]
    ConfigIo {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when the configuration violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Classifies a client failure for the request described by `context`.
    ///
    /// Decoding failures surfaced by octocrab become [`Error::Parse`]; every
    /// other failure is reported as [`Error::Network`].
    pub fn from_client<C>(context: C, source: octocrab::Error) -> Self
    where
        C: Into<String>
    {
        let context = context.into();
        match source {
            octocrab::Error::Serde {
                source, ..
            } => Self::Parse {
                context,
                source
            },
            octocrab::Error::Json {
                source, ..
            } => Self::Parse {
                context,
                source: source.into_inner()
            },
            other => Self::Network {
                context,
                source: other
            }
        }
    }

    /// Wraps a decoding failure for the request described by `context`.
    pub fn parse<C>(context: C, source: serde_json::Error) -> Self
    where
        C: Into<String>
    {
        Self::Parse {
            context: context.into(),
            source
        }
    }

    /// Process exit status reported by the CLI for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } => 2,
            Self::Parse { .. } => 3,
            Self::Filesystem { .. } => 4,
            Self::ConfigIo { .. } | Self::ConfigParse { .. } | Self::Validation { .. } => 5
        }
    }

    /// Formats the error for diagnostics without the variant name.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            source
        }
    }
}

/// Creates an [`Error::ConfigIo`] variant capturing the failing path and
/// source.
pub fn config_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ConfigIo {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::Filesystem`] variant capturing the failing path and
/// source.
pub fn filesystem_error(path: &Path, source: std::io::Error) -> Error {
    Error::Filesystem {
        path: path.to_path_buf(),
        source
    }
}
