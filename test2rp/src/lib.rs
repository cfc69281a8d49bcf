// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! test2rp takes a `go test -json` report and mirrors it into ReportPortal
//! as a launch with the module → test → subtest hierarchy reconstructed
//! from test names.
//!
//! This crate is the CLI surface; the pipeline itself lives in `rp-agent`.

mod dispatch;
mod errors;
mod output;

pub use dispatch::Test2RpApp;
pub use errors::{ExpectedError, ReportExitCode};
pub use output::OutputContext;
