// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The end-to-end reporting pipeline.

use crate::{
    aggregate::{OutputScanner, TestEntity, build_entities, path::EntityPath},
    errors::ReportError,
    events::read_events,
    reporter::{HierarchyReporter, ReportClient},
};
use rp_client::{LaunchMode, LaunchStart};
use std::{collections::HashMap, io::BufRead};
use tracing::info;

/// The bug-tracker integration issues are linked through.
#[derive(Clone, Debug)]
pub struct BtsSettings {
    /// Name of the integration as configured in the reporting service.
    pub project: String,
    /// Root URL of the bug tracker; issue links in test output are
    /// recognized under `<url>/browse/`.
    pub url: String,
}

/// Options for one reporting run.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Launch name.
    pub run_name: String,
    /// Launch description.
    pub run_description: String,
    /// Tags marking the launch; empty means no tags.
    pub tags: Vec<String>,
}

/// Summary of a completed reporting run.
#[derive(Clone, Debug)]
pub struct ReportStats {
    /// Number of aggregated entities.
    pub entities: usize,
    /// Number of remote items opened; equals the number of distinct
    /// breadcrumbs across all entities.
    pub items_opened: usize,
    /// Nodes that never saw a terminal action and were reported FAILED.
    pub broken_records: usize,
    /// Browser URL of the finished launch.
    pub launch_link: String,
}

/// Drives the full pipeline: decode, group, aggregate, report, finish.
///
/// All run state lives in locals of [`report`](Self::report); nothing
/// survives between runs.
#[derive(Debug)]
pub struct RpAgent<C> {
    client: C,
    bts: BtsSettings,
}

impl<C: ReportClient> RpAgent<C> {
    /// Creates an agent reporting through `client`.
    pub fn new(client: C, bts: BtsSettings) -> Self {
        Self { client, bts }
    }

    /// Reads a `go test -json` report from `input` and mirrors it to the
    /// remote service as one launch.
    ///
    /// Fatal errors abort mid-run; a partially-opened remote hierarchy is
    /// left as-is.
    pub fn report(
        &mut self,
        input: impl BufRead,
        options: &RunOptions,
    ) -> Result<ReportStats, ReportError> {
        let events = read_events(input)?;
        if events.is_empty() {
            return Err(ReportError::EmptyReport);
        }
        // The stream is not assumed sorted; take true bounds.
        let earliest = events.iter().map(|e| e.time).min().expect("events is non-empty");
        let latest = events.iter().map(|e| e.time).max().expect("events is non-empty");

        let scanner = OutputScanner::new(&self.bts.url);
        let entities = build_entities(&events, &scanner)?;
        info!(
            "sending report: {} events, {} entities",
            events.len(),
            entities.len()
        );

        let launch = self.client.start_launch(&LaunchStart {
            name: options.run_name.clone(),
            description: options.run_description.clone(),
            start_time: earliest,
            tags: options.tags.clone(),
            mode: LaunchMode::Default,
        })?;

        let by_path: HashMap<&EntityPath, &TestEntity> =
            entities.iter().map(|entity| (&entity.path, entity)).collect();
        let mut reporter = HierarchyReporter::new(&mut self.client, launch, &self.bts, earliest);
        for entity in &entities {
            reporter.open_entity(entity, &by_path)?;
        }
        let outcome = reporter.finish(latest)?;
        info!("report launch url: {}", outcome.launch.link);

        Ok(ReportStats {
            entities: entities.len(),
            items_opened: outcome.items_opened,
            broken_records: outcome.broken_records,
            launch_link: outcome.launch.link,
        })
    }
}

/// Splits a comma-separated tag string; an empty string yields no tags.
pub fn parse_tags(tags: &str) -> Vec<String> {
    if tags.is_empty() {
        Vec::new()
    } else {
        tags.split(',').map(str::to_owned).collect()
    }
}
