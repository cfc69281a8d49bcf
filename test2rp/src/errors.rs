// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use rp_agent::errors::ReportError;
use rp_client::ClientError;
use std::error::Error;
use thiserror::Error;
use tracing::error;

/// Documented exit codes for `test2rp` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ReportExitCode {}

impl ReportExitCode {
    /// The report was sent and no errors occurred.
    pub const OK: i32 = 0;

    /// The report was sent, but one or more entities never saw a terminal
    /// action and were reported as failed. Suppressed by `--force`.
    pub const BROKEN_RECORDS: i32 = 1;

    /// A user issue happened while setting up an invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// A remote reporting call failed mid-run.
    pub const REPORT_FAILED: i32 = 100;

    /// The input report was malformed or empty.
    pub const INVALID_REPORT: i32 = 102;
}

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// A failure with a well-known exit code and a user-facing rendering.
#[derive(Debug, Error)]
pub enum ExpectedError {
    #[error("failed to read report file")]
    ReportRead {
        path: Utf8PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("invalid report")]
    InvalidReport {
        #[source]
        error: ReportError,
    },
    #[error("remote reporting call failed")]
    ReportFailed {
        #[source]
        error: ClientError,
    },
}

impl From<ReportError> for ExpectedError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::Client(error) => Self::ReportFailed { error },
            other => Self::InvalidReport { error: other },
        }
    }
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ReportRead { .. } => ReportExitCode::SETUP_ERROR,
            Self::InvalidReport { .. } => ReportExitCode::INVALID_REPORT,
            Self::ReportFailed { .. } => ReportExitCode::REPORT_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ReportRead { path, error } => {
                error!("failed to read report file `{}`", path.style(styles.bold));
                Some(error as &dyn Error)
            }
            Self::InvalidReport { error } => {
                error!("{error}");
                error.source()
            }
            Self::ReportFailed { error } => {
                error!("failed to send report: {error}");
                error.source()
            }
        };

        while let Some(error) = next_error {
            error!(target: "test2rp::no_heading", "\nCaused by:\n  {}", error);
            next_error = error.source();
        }
    }
}
