// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies for the ReportPortal v1 API.
//!
//! These types serialize directly to the wire format (camelCase fields,
//! RFC 3339 timestamps). Launch tags are serialized as ReportPortal
//! attributes; an empty tag list omits the field entirely rather than
//! sending an empty array.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeSeq};

/// Defect type for an unclassified failure awaiting triage.
pub const TO_INVESTIGATE: &str = "ti001";
/// Defect type for a confirmed product bug.
pub const PRODUCT_BUG: &str = "pb001";
/// Defect type for a bug in the test automation itself.
pub const AUTOMATION_BUG: &str = "ab001";
/// Defect type for a failure explicitly marked as not an issue.
pub const NOT_ISSUE: &str = "nd001";
/// Defect type for an environment or infrastructure problem.
pub const SYSTEM_ISSUE: &str = "si001";

/// Launch visibility mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LaunchMode {
    /// A normal launch, visible in the project.
    #[default]
    Default,
    /// A debug launch, visible only on the debug tab.
    Debug,
}

/// The kind of a test item in the remote hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemKind {
    /// A top-level item (one per module).
    Test,
    /// A nested item, opened under a parent.
    Step,
}

/// The final status reported for an item or launch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    /// The item passed.
    Passed,
    /// The item failed.
    Failed,
    /// The item was skipped.
    Skipped,
}

/// Severity of a log entry attached to an item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Error-level output.
    Error,
    /// Warning-level output.
    Warn,
    /// Informational output.
    Info,
    /// Debug output.
    Debug,
    /// Trace output.
    Trace,
}

/// Body of a "start launch" call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchStart {
    /// Launch name.
    pub name: String,
    /// Launch description.
    pub description: String,
    /// Start of the launch; the earliest event time in the report.
    pub start_time: DateTime<FixedOffset>,
    /// Tags marking the launch, sent as attributes.
    #[serde(
        rename = "attributes",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "tags_as_attributes"
    )]
    pub tags: Vec<String>,
    /// Launch visibility mode.
    pub mode: LaunchMode,
}

/// Identifiers returned when a launch is started.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StartedLaunch {
    /// The launch UUID, referenced by every later call.
    pub id: String,
    /// The launch-scoped sequence number.
    #[serde(default)]
    pub number: i64,
}

/// Identifiers returned when a launch is finished.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FinishedLaunch {
    /// Browser URL of the finished launch.
    #[serde(default)]
    pub link: String,
}

/// Body of a "start test item" call, minus the launch UUID the client adds.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStart {
    /// Display name of the item.
    pub name: String,
    /// Item kind.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Start of the item.
    pub start_time: DateTime<FixedOffset>,
    /// Item description.
    pub description: String,
    /// Tags on the item, sent as attributes.
    #[serde(
        rename = "attributes",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "tags_as_attributes"
    )]
    pub tags: Vec<String>,
    /// Parameters of a parameterized test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ItemParameter>>,
}

/// One parameter of a parameterized test item.
#[derive(Clone, Debug, Serialize)]
pub struct ItemParameter {
    /// Parameter name.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

/// Identifiers returned when an item is started.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedItem {
    /// The item UUID.
    pub id: String,
    /// Uniqueness token computed by the server.
    #[serde(default)]
    pub unique_id: String,
}

/// Body of a "finish test item" call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFinish {
    /// Final status of the item.
    pub status: ItemStatus,
    /// End of the item.
    pub end_time: DateTime<FixedOffset>,
    /// Defect information attached to a non-passing item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<IssuePayload>,
}

/// Defect information attached to a finished item.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePayload {
    /// Defect type locator, one of the `*_BUG`/`*_ISSUE` constants.
    pub issue_type: String,
    /// Free-text comment shown next to the defect.
    pub comment: String,
    /// References into the external bug tracker.
    pub external_system_issues: Vec<ExternalIssue>,
}

/// A reference to a ticket in an external bug-tracker system.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIssue {
    /// Name of the bug-tracker integration configured in ReportPortal.
    pub bts_project: String,
    /// Root URL of the bug tracker.
    pub bts_url: String,
    /// Ticket identifier, e.g. `PROJ-123`.
    pub ticket_id: String,
    /// Full URL of the ticket.
    pub url: String,
}

fn tags_as_attributes<S: Serializer>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Attribute<'a> {
        value: &'a str,
    }

    let mut seq = serializer.serialize_seq(Some(tags.len()))?;
    for tag in tags {
        seq.serialize_element(&Attribute { value: tag })?;
    }
    seq.end()
}
