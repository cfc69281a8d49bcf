// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for unit tests: event constructors and a recording fake
//! of the remote reporting client.

use crate::{
    events::{Action, TestEvent},
    reporter::ReportClient,
};
use chrono::{DateTime, FixedOffset};
use rp_client::{
    ClientError, FinishedLaunch, ItemFinish, ItemKind, ItemStart, ItemStatus, LaunchStart,
    LogLevel, StartedItem, StartedLaunch,
};

pub(crate) fn time(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).expect("valid RFC 3339 timestamp")
}

pub(crate) fn event(at: &str, action: Action, package: &str, test: &str) -> TestEvent {
    TestEvent {
        time: time(at),
        action,
        package: package.to_owned(),
        test: test.to_owned(),
        elapsed: None,
        output: String::new(),
    }
}

pub(crate) fn output_event(at: &str, package: &str, test: &str, output: &str) -> TestEvent {
    TestEvent {
        output: output.to_owned(),
        ..event(at, Action::Output, package, test)
    }
}

pub(crate) fn terminal_event(
    at: &str,
    action: Action,
    package: &str,
    test: &str,
    elapsed: Option<f64>,
) -> TestEvent {
    TestEvent {
        elapsed,
        ..event(at, action, package, test)
    }
}

/// One remote call observed by [`FakeClient`], in invocation order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    StartLaunch {
        name: String,
        start_time: DateTime<FixedOffset>,
        tags: Vec<String>,
    },
    StartItem {
        parent: Option<String>,
        name: String,
        kind: ItemKind,
        start_time: DateTime<FixedOffset>,
    },
    AppendLog {
        item_id: String,
        message: String,
        level: LogLevel,
    },
    FinishItem {
        item_id: String,
        status: ItemStatus,
        has_issue: bool,
    },
    FinishLaunch {
        status: ItemStatus,
        end_time: DateTime<FixedOffset>,
    },
    ResolveItemId {
        item_uuid: String,
    },
    LinkIssue {
        lookup_id: i64,
        ticket: String,
        url: String,
    },
}

/// A [`ReportClient`] that records every call and fabricates identifiers.
///
/// Item UUIDs are `item-1`, `item-2`, ... in open order; lookup ids are the
/// item number plus 1000.
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    pub(crate) calls: Vec<Call>,
    next_item: i64,
}

impl FakeClient {
    pub(crate) fn opened_items(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::StartItem { .. }))
            .collect()
    }
}

impl ReportClient for FakeClient {
    fn start_launch(&mut self, launch: &LaunchStart) -> Result<StartedLaunch, ClientError> {
        self.calls.push(Call::StartLaunch {
            name: launch.name.clone(),
            start_time: launch.start_time,
            tags: launch.tags.clone(),
        });
        Ok(StartedLaunch {
            id: "launch-uuid".to_owned(),
            number: 7,
        })
    }

    fn start_item(
        &mut self,
        parent: Option<&str>,
        item: &ItemStart,
    ) -> Result<StartedItem, ClientError> {
        self.next_item += 1;
        self.calls.push(Call::StartItem {
            parent: parent.map(str::to_owned),
            name: item.name.clone(),
            kind: item.kind,
            start_time: item.start_time,
        });
        Ok(StartedItem {
            id: format!("item-{}", self.next_item),
            unique_id: format!("uniq-{}", self.next_item),
        })
    }

    fn append_log(
        &mut self,
        item_id: &str,
        message: &str,
        level: LogLevel,
    ) -> Result<(), ClientError> {
        self.calls.push(Call::AppendLog {
            item_id: item_id.to_owned(),
            message: message.to_owned(),
            level,
        });
        Ok(())
    }

    fn finish_item(&mut self, item_id: &str, finish: &ItemFinish) -> Result<(), ClientError> {
        self.calls.push(Call::FinishItem {
            item_id: item_id.to_owned(),
            status: finish.status,
            has_issue: finish.issue.is_some(),
        });
        Ok(())
    }

    fn finish_launch(
        &mut self,
        status: ItemStatus,
        end_time: DateTime<FixedOffset>,
    ) -> Result<FinishedLaunch, ClientError> {
        self.calls.push(Call::FinishLaunch { status, end_time });
        Ok(FinishedLaunch {
            link: "https://rp.example.com/ui/#proj/launches/all/7".to_owned(),
        })
    }

    fn resolve_item_id(&mut self, item_uuid: &str) -> Result<i64, ClientError> {
        self.calls.push(Call::ResolveItemId {
            item_uuid: item_uuid.to_owned(),
        });
        let number = item_uuid
            .strip_prefix("item-")
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or_default();
        Ok(number + 1000)
    }

    fn link_issue(&mut self, lookup_id: i64, ticket: &str, url: &str) -> Result<(), ClientError> {
        self.calls.push(Call::LinkIssue {
            lookup_id,
            ticket: ticket.to_owned(),
            url: url.to_owned(),
        });
        Ok(())
    }
}
