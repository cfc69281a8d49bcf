// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error returned while talking to ReportPortal.
///
/// None of these are retried: the reporting protocol is a single serial
/// launch, and a failed call leaves the remote hierarchy as-is.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or its response body could not be read.
    #[error("request to {url} failed")]
    Transport {
        /// The URL the request was sent to.
        url: String,
        /// The underlying transport error.
        #[source]
        error: Box<ureq::Error>,
    },

    /// The server answered with a non-success status code.
    #[error("{url} returned HTTP {status}: {body}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The URL the request was sent to.
        url: String,
        /// The response body, verbatim, for diagnostics.
        body: String,
    },

    /// A success response could not be decoded into the expected shape.
    #[error("invalid response from {url}")]
    Decode {
        /// The URL the request was sent to.
        url: String,
        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },

    /// An item-level call was issued before any launch was started.
    #[error("no active launch: call start_launch first")]
    NoActiveLaunch,
}
