// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of `go test -json` event streams.

use crate::errors::EventReadError;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::io::BufRead;

/// One record emitted by `test2json`.
///
/// Field names accept both the `test2json` casing (`Time`, `Action`, ...)
/// and all-lowercase, matching Go's case-insensitive unmarshalling.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TestEvent {
    /// When the event was emitted.
    #[serde(alias = "Time")]
    pub time: DateTime<FixedOffset>,
    /// What happened.
    #[serde(alias = "Action")]
    pub action: Action,
    /// Import path of the package under test.
    #[serde(default, alias = "Package")]
    pub package: String,
    /// Hierarchical test name, `/`-separated; empty for package-level events.
    #[serde(default, alias = "Test")]
    pub test: String,
    /// Elapsed seconds, present on terminal actions.
    #[serde(default, alias = "Elapsed")]
    pub elapsed: Option<f64>,
    /// One line of test output, present on `output` actions.
    #[serde(default, alias = "Output")]
    pub output: String,
}

/// The full `test2json` action vocabulary.
///
/// Any other action string is a decode error.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The test binary started running.
    Start,
    /// A test began.
    Run,
    /// A test was paused.
    Pause,
    /// A paused test continued.
    Cont,
    /// A test passed.
    Pass,
    /// A benchmark ran.
    Bench,
    /// A test failed.
    Fail,
    /// A line of output was printed.
    Output,
    /// A test was skipped.
    Skip,
}

impl Action {
    /// Whether this action marks a final pass/fail/skip outcome.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Pass | Self::Fail | Self::Skip)
    }
}

/// Iterator over events in a newline-delimited JSON stream.
///
/// Yields events in input order, tracking 1-based line numbers for
/// diagnostics. Whitespace-only lines are skipped. The stream is consumed
/// once; after the first error the iterator should not be advanced further.
#[derive(Debug)]
pub struct EventReader<R> {
    reader: R,
    line: u64,
    buf: String,
}

impl<R: BufRead> EventReader<R> {
    /// Creates a reader over the given stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<TestEvent, EventReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            self.line += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(error) => {
                    return Some(Err(EventReadError::Io {
                        line: self.line,
                        error,
                    }));
                }
            }
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(line).map_err(|error| EventReadError::Parse {
                line: self.line,
                error,
            }));
        }
    }
}

/// Reads every event in the stream, stopping at the first error.
pub fn read_events(reader: impl BufRead) -> Result<Vec<TestEvent>, EventReadError> {
    EventReader::new(reader).collect()
}
