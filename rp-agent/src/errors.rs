// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the reporting pipeline.

use rp_client::ClientError;
use std::num::ParseIntError;
use thiserror::Error;

/// An error reading or decoding the event stream.
///
/// Both variants are fatal: a report with an unreadable or malformed line is
/// rejected as a whole, no partial report is sent.
#[derive(Debug, Error)]
pub enum EventReadError {
    /// Reading from the underlying stream failed.
    #[error("error reading test report at line {line}")]
    Io {
        /// 1-based line number where the read failed.
        line: u64,
        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// A line was not a valid test event.
    #[error("invalid test event at line {line}")]
    Parse {
        /// 1-based line number of the offending record.
        line: u64,
        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error aggregating events into entities.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A case-identifier match in test output did not parse as an integer.
    ///
    /// Malformed test output is not recoverable automatically.
    #[error("case id {text:?} in test output is not a valid integer")]
    CaseIdParse {
        /// The matched digits, verbatim.
        text: String,
        /// The underlying parse error.
        #[source]
        error: ParseIntError,
    },
}

/// Any error produced by a full reporting run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report contained no events at all.
    #[error("report contains no test events")]
    EmptyReport,

    /// The event stream could not be read or decoded.
    #[error(transparent)]
    Read(#[from] EventReadError),

    /// Events could not be aggregated into entities.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A remote reporting call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}
