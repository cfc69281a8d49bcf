// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical reporting of aggregated entities to the remote service.
//!
//! The [`HierarchyReporter`] walks entities in start-time order and opens
//! each distinct breadcrumb exactly once, parents before children; a module
//! or intermediate step shared by many leaf tests is opened and logged a
//! single time. Finishing closes every opened node in open order, attaches
//! and links bug-tracker issues for non-passing nodes, then finishes the
//! launch.

use crate::{
    agent::BtsSettings,
    aggregate::{EntityStatus, IssueRef, TestEntity, path::EntityPath},
};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use rp_client::{
    ClientError, ExternalIssue, FinishedLaunch, IssuePayload, ItemFinish, ItemKind, ItemStart,
    ItemStatus, LaunchStart, LogLevel, PRODUCT_BUG, RpClient, StartedItem, StartedLaunch,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The remote reporting capability the pipeline drives.
///
/// Implemented by [`RpClient`]; tests substitute a recording fake. All calls
/// are synchronous and fail the whole run on error.
pub trait ReportClient {
    /// Opens the top-level launch.
    fn start_launch(&mut self, launch: &LaunchStart) -> Result<StartedLaunch, ClientError>;

    /// Opens a test item, nested under `parent` when given.
    fn start_item(
        &mut self,
        parent: Option<&str>,
        item: &ItemStart,
    ) -> Result<StartedItem, ClientError>;

    /// Attaches a log entry to an open item.
    fn append_log(
        &mut self,
        item_id: &str,
        message: &str,
        level: LogLevel,
    ) -> Result<(), ClientError>;

    /// Closes an item with its final status and optional defect payload.
    fn finish_item(&mut self, item_id: &str, finish: &ItemFinish) -> Result<(), ClientError>;

    /// Closes the launch.
    fn finish_launch(
        &mut self,
        status: ItemStatus,
        end_time: DateTime<FixedOffset>,
    ) -> Result<FinishedLaunch, ClientError>;

    /// Resolves an item UUID to the numeric id used by the issue-link API.
    fn resolve_item_id(&mut self, item_uuid: &str) -> Result<i64, ClientError>;

    /// Links an external bug-tracker ticket to a finished item.
    fn link_issue(&mut self, lookup_id: i64, ticket: &str, url: &str) -> Result<(), ClientError>;
}

impl ReportClient for RpClient {
    fn start_launch(&mut self, launch: &LaunchStart) -> Result<StartedLaunch, ClientError> {
        RpClient::start_launch(self, launch)
    }

    fn start_item(
        &mut self,
        parent: Option<&str>,
        item: &ItemStart,
    ) -> Result<StartedItem, ClientError> {
        RpClient::start_item(self, parent, item)
    }

    fn append_log(
        &mut self,
        item_id: &str,
        message: &str,
        level: LogLevel,
    ) -> Result<(), ClientError> {
        RpClient::append_log(self, item_id, message, level)
    }

    fn finish_item(&mut self, item_id: &str, finish: &ItemFinish) -> Result<(), ClientError> {
        RpClient::finish_item(self, item_id, finish)
    }

    fn finish_launch(
        &mut self,
        status: ItemStatus,
        end_time: DateTime<FixedOffset>,
    ) -> Result<FinishedLaunch, ClientError> {
        RpClient::finish_launch(self, status, end_time)
    }

    fn resolve_item_id(&mut self, item_uuid: &str) -> Result<i64, ClientError> {
        RpClient::resolve_item_id(self, item_uuid)
    }

    fn link_issue(&mut self, lookup_id: i64, ticket: &str, url: &str) -> Result<(), ClientError> {
        RpClient::link_issue(self, lookup_id, ticket, url)
    }
}

/// A hierarchy node already opened against the remote service.
///
/// Created when a breadcrumb is first opened; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct ItemHandle {
    /// Remote item UUID.
    pub item_id: String,
    /// Launch-scoped sequence number of the owning launch.
    pub launch_number: i64,
    /// Uniqueness token returned by the remote service.
    pub unique_id: String,
    /// Issue mined from the node's output, if any.
    pub issue: Option<IssueRef>,
    /// When the node finished.
    pub end_time: DateTime<FixedOffset>,
    /// Raw status; `None` when no terminal action was observed.
    pub status: Option<EntityStatus>,
}

/// Summary handed back once the launch is finished.
#[derive(Clone, Debug)]
pub struct ReportOutcome {
    /// The finished launch, including its browser link.
    pub launch: FinishedLaunch,
    /// Number of items opened; equals the number of distinct breadcrumbs.
    pub items_opened: usize,
    /// Nodes that never saw a terminal action and were reported FAILED.
    pub broken_records: usize,
}

/// Maps an entity status to the remote status vocabulary.
///
/// An absent status maps to [`ItemStatus::Failed`]: an ambiguous test
/// outcome must never be reported as a silent pass.
pub fn remote_status(status: Option<EntityStatus>) -> ItemStatus {
    match status {
        Some(EntityStatus::Pass) => ItemStatus::Passed,
        Some(EntityStatus::Fail) => ItemStatus::Failed,
        Some(EntityStatus::Skip) => ItemStatus::Skipped,
        None => ItemStatus::Failed,
    }
}

/// Opens hierarchy nodes top-down, memoized by breadcrumb path, and owns
/// every [`ItemHandle`] until the finish phase consumes them.
pub struct HierarchyReporter<'a, C> {
    client: &'a mut C,
    launch: StartedLaunch,
    bts: &'a BtsSettings,
    earliest: DateTime<FixedOffset>,
    open_items: IndexMap<EntityPath, ItemHandle>,
}

impl<'a, C: ReportClient> HierarchyReporter<'a, C> {
    /// Creates a reporter for an already-opened launch.
    ///
    /// `earliest` is the earliest event time in the whole report; module
    /// nodes have no independent start event, so it stands in for their
    /// start time.
    pub fn new(
        client: &'a mut C,
        launch: StartedLaunch,
        bts: &'a BtsSettings,
        earliest: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            client,
            launch,
            bts,
            earliest,
            open_items: IndexMap::new(),
        }
    }

    /// Opens every breadcrumb of `entity` not yet open, shallow to deep.
    ///
    /// `by_path` resolves a breadcrumb to its own entity when one exists;
    /// breadcrumbs that own no events inherit metadata from the entity
    /// being walked.
    pub fn open_entity(
        &mut self,
        entity: &TestEntity,
        by_path: &HashMap<&EntityPath, &TestEntity>,
    ) -> Result<(), ClientError> {
        for crumb in entity.path.breadcrumbs() {
            if self.open_items.contains_key(&crumb) {
                continue;
            }
            let source = by_path.get(&crumb).copied().unwrap_or(entity);

            let start_time = if crumb.is_module() {
                self.earliest
            } else {
                source.start_time
            };
            let (kind, parent_id) = match crumb.parent() {
                None => (ItemKind::Test, None),
                Some(parent) => {
                    let handle = self
                        .open_items
                        .get(&parent)
                        .expect("parents are opened before children");
                    (ItemKind::Step, Some(handle.item_id.clone()))
                }
            };
            let name = match &source.case {
                Some(case) => format!("{} {}", case.id, case.description),
                None => crumb.to_string(),
            };

            let started = self.client.start_item(
                parent_id.as_deref(),
                &ItemStart {
                    name: name.clone(),
                    kind,
                    start_time,
                    description: name,
                    tags: Vec::new(),
                    parameters: None,
                },
            )?;
            debug!("opened {crumb} as {}", started.id);

            self.client
                .append_log(&started.id, &source.output, LogLevel::Info)?;

            self.open_items.insert(
                crumb,
                ItemHandle {
                    item_id: started.id,
                    launch_number: self.launch.number,
                    unique_id: started.unique_id,
                    issue: source.issue.clone(),
                    end_time: source.end_time,
                    status: source.status,
                },
            );
        }
        Ok(())
    }

    /// Closes every opened node in open order, links issues for non-passing
    /// nodes, then finishes the launch with `latest` as its end time.
    ///
    /// The launch status sent here is a placeholder; the remote service
    /// recomputes the true aggregate status server-side.
    pub fn finish(self, latest: DateTime<FixedOffset>) -> Result<ReportOutcome, ClientError> {
        let Self {
            client,
            bts,
            open_items,
            ..
        } = self;

        let mut broken_records = 0;
        for (path, handle) in &open_items {
            if handle.status.is_none() {
                warn!("no terminal action for {path}, reporting FAILED");
                broken_records += 1;
            }
            let status = remote_status(handle.status);
            let issue = linkable_issue(handle).map(|issue| IssuePayload {
                issue_type: PRODUCT_BUG.to_owned(),
                comment: issue.url.clone(),
                external_system_issues: vec![ExternalIssue {
                    bts_project: bts.project.clone(),
                    bts_url: bts.url.clone(),
                    ticket_id: issue.ticket.clone(),
                    url: issue.url.clone(),
                }],
            });
            client.finish_item(
                &handle.item_id,
                &ItemFinish {
                    status,
                    end_time: handle.end_time,
                    issue,
                },
            )?;
        }

        // Finish-time attachment alone does not reliably create a queryable
        // link; an explicit link call per issue is required.
        for handle in open_items.values() {
            let Some(issue) = linkable_issue(handle) else {
                continue;
            };
            let lookup_id = client.resolve_item_id(&handle.item_id)?;
            client.link_issue(lookup_id, &issue.ticket, &issue.url)?;
        }

        let launch = client.finish_launch(ItemStatus::Failed, latest)?;
        Ok(ReportOutcome {
            launch,
            items_opened: open_items.len(),
            broken_records,
        })
    }
}

fn linkable_issue(handle: &ItemHandle) -> Option<&IssueRef> {
    match handle.status {
        Some(EntityStatus::Pass) => None,
        _ => handle.issue.as_ref(),
    }
}
