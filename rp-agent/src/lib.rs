// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core pipeline turning `go test -json` reports into ReportPortal launches.
//!
//! The pipeline runs in one pass over a fully materialized event set:
//!
//! 1. [`events`] decodes the newline-delimited JSON stream.
//! 2. [`aggregate`] groups events by entity and folds each bucket into a
//!    [`TestEntity`](aggregate::TestEntity), deriving the module → test →
//!    subtest hierarchy from the structured entity path.
//! 3. [`reporter`] opens each distinct hierarchy node against the remote
//!    service exactly once, parents before children, then finishes every
//!    node and links bug-tracker issues for non-passing ones.
//!
//! [`agent::RpAgent`] glues the stages together and owns all run state;
//! nothing survives between runs.

#![warn(missing_docs)]

pub mod agent;
pub mod aggregate;
pub mod errors;
pub mod events;
pub mod reporter;

#[cfg(test)]
mod test_helpers;
