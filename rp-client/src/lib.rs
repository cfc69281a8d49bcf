// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous client for the ReportPortal v1 REST API.
//!
//! This crate covers exactly the calls the reporting pipeline needs: opening
//! and finishing launches and test items, appending logs, and linking
//! bug-tracker issues. All calls are blocking and issued one at a time; any
//! transport or API error is surfaced to the caller, which is expected to
//! abort the run.

#![warn(missing_docs)]

mod client;
mod errors;
mod models;

pub use client::*;
pub use errors::*;
pub use models::*;
