// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grouping events into per-entity buckets and folding each bucket into an
//! aggregate [`TestEntity`].

pub mod path;

use crate::{
    errors::AggregateError,
    events::{Action, TestEvent},
};
use chrono::{DateTime, Duration, FixedOffset};
use indexmap::IndexMap;
use path::EntityPath;
use regex::Regex;
use std::sync::LazyLock;

// TestRail convention: "C<case id> <description>" on an output line.
static CASE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"C(\d{1,8})\s(.*)").expect("case id regex is valid"));

/// A TestRail-style case reference mined from test output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCaseRef {
    /// Numeric case identifier.
    pub id: u32,
    /// Description text following the identifier.
    pub description: String,
}

/// A bug-tracker issue reference mined from test output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueRef {
    /// Ticket identifier, e.g. `PROJ-123`.
    pub ticket: String,
    /// Full URL of the ticket.
    pub url: String,
}

/// Final outcome of an entity, from the last terminal action observed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityStatus {
    /// The entity passed.
    Pass,
    /// The entity failed.
    Fail,
    /// The entity was skipped.
    Skip,
}

impl EntityStatus {
    fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::Pass => Some(Self::Pass),
            Action::Fail => Some(Self::Fail),
            Action::Skip => Some(Self::Skip),
            _ => None,
        }
    }
}

/// One test, subtest, or package as a single reportable unit.
///
/// Built once from a bucket of events sharing the same [`EntityPath`];
/// read-only afterwards. Hierarchy information is derived from `path` on
/// demand rather than stored as pointers.
#[derive(Clone, Debug)]
pub struct TestEntity {
    /// Structured identity of this entity.
    pub path: EntityPath,
    /// Import path of the owning package.
    pub package: String,
    /// Hierarchical test name; empty for package entities.
    pub test_name: String,
    /// Outcome, or `None` when no terminal action was ever observed.
    pub status: Option<EntityStatus>,
    /// Timestamp of the bucket's first event.
    pub start_time: DateTime<FixedOffset>,
    /// Start plus elapsed when reported, else the last event's timestamp.
    pub end_time: DateTime<FixedOffset>,
    /// Reported elapsed duration, if any.
    pub elapsed: Option<Duration>,
    /// Case reference mined from output; first match wins.
    pub case: Option<TestCaseRef>,
    /// Issue reference mined from output; first match wins.
    pub issue: Option<IssueRef>,
    /// All output lines, concatenated in order.
    pub output: String,
}

impl TestEntity {
    /// The immediate parent path, or `None` for package entities.
    pub fn parent(&self) -> Option<EntityPath> {
        self.path.parent()
    }
}

/// Scans output lines for embedded case and issue references.
#[derive(Debug)]
pub struct OutputScanner {
    issue_regex: Regex,
}

impl OutputScanner {
    /// Creates a scanner recognizing issue links under the given bug-tracker
    /// root URL, e.g. `https://tracker.example.com/` plus `browse/PROJ-123`.
    pub fn new(bts_url: &str) -> Self {
        let root = regex::escape(bts_url.trim_end_matches('/'));
        let pattern = format!(r"{root}/browse/([A-Z]+-\d+)");
        Self {
            issue_regex: Regex::new(&pattern).expect("escaped URL is a valid regex"),
        }
    }

    fn case(&self, text: &str) -> Result<Option<TestCaseRef>, AggregateError> {
        let Some(captures) = CASE_ID_REGEX.captures(text) else {
            return Ok(None);
        };
        let digits = &captures[1];
        let id = digits
            .parse()
            .map_err(|error| AggregateError::CaseIdParse {
                text: digits.to_owned(),
                error,
            })?;
        Ok(Some(TestCaseRef {
            id,
            description: captures[2].to_owned(),
        }))
    }

    fn issue(&self, text: &str) -> Option<IssueRef> {
        self.issue_regex.captures(text).map(|captures| IssueRef {
            url: captures[0].to_owned(),
            ticket: captures[1].to_owned(),
        })
    }
}

/// Partitions events into per-entity buckets in one linear pass.
///
/// Keys appear in discovery order; each bucket preserves the original
/// relative order of its events. No event is dropped or duplicated.
pub fn group_events(events: &[TestEvent]) -> IndexMap<EntityPath, Vec<&TestEvent>> {
    let mut buckets: IndexMap<EntityPath, Vec<&TestEvent>> = IndexMap::new();
    for event in events {
        buckets
            .entry(EntityPath::new(&event.package, &event.test))
            .or_default()
            .push(event);
    }
    buckets
}

/// Folds every bucket into an entity, returning entities sorted by start
/// time (stable, so discovery order breaks ties).
pub fn build_entities(
    events: &[TestEvent],
    scanner: &OutputScanner,
) -> Result<Vec<TestEntity>, AggregateError> {
    let mut entities = Vec::new();
    for (path, bucket) in group_events(events) {
        entities.push(build_entity(path, &bucket, scanner)?);
    }
    entities.sort_by_key(|entity| entity.start_time);
    Ok(entities)
}

fn build_entity(
    path: EntityPath,
    bucket: &[&TestEvent],
    scanner: &OutputScanner,
) -> Result<TestEntity, AggregateError> {
    let first = bucket.first().expect("buckets are never empty");
    let last = bucket.last().expect("buckets are never empty");
    let mut entity = TestEntity {
        package: first.package.clone(),
        test_name: first.test.clone(),
        path,
        status: None,
        start_time: first.time,
        end_time: last.time,
        elapsed: None,
        case: None,
        issue: None,
        output: String::new(),
    };

    for event in bucket {
        // Last terminal action wins.
        if let Some(status) = EntityStatus::from_action(event.action) {
            entity.status = Some(status);
        }
        if let Some(seconds) = event.elapsed
            && seconds != 0.0
        {
            let elapsed = Duration::milliseconds((seconds * 1000.0).round() as i64);
            entity.end_time = entity.start_time + elapsed;
            entity.elapsed = Some(elapsed);
        }
        if event.action == Action::Output {
            // Every match is parsed (a bad case id is fatal even on a
            // later line), but only the first is recorded.
            if let Some(case) = scanner.case(&event.output)?
                && entity.case.is_none()
            {
                entity.case = Some(case);
            }
            if entity.issue.is_none() {
                entity.issue = scanner.issue(&event.output);
            }
            entity.output.push_str(&event.output);
        }
    }

    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{event, output_event, terminal_event};
    use pretty_assertions::assert_eq;

    fn scanner() -> OutputScanner {
        OutputScanner::new("https://tracker.example.com/")
    }

    #[test]
    fn grouping_preserves_order_and_drops_nothing() {
        let events = vec![
            event("2020-07-10T13:00:00Z", Action::Run, "pkg/a", "TestFoo"),
            event("2020-07-10T13:00:01Z", Action::Run, "pkg/a", "TestBar"),
            output_event("2020-07-10T13:00:02Z", "pkg/a", "TestFoo", "one\n"),
            output_event("2020-07-10T13:00:03Z", "pkg/a", "TestFoo", "two\n"),
            terminal_event("2020-07-10T13:00:04Z", Action::Pass, "pkg/a", "TestBar", None),
        ];
        let buckets = group_events(&events);

        assert_eq!(buckets.len(), 2);
        let total: usize = buckets.values().map(Vec::len).sum();
        assert_eq!(total, events.len());

        let keys: Vec<_> = buckets.keys().cloned().collect();
        assert_eq!(keys[0], EntityPath::new("pkg/a", "TestFoo"));
        assert_eq!(keys[1], EntityPath::new("pkg/a", "TestBar"));

        let foo = &buckets[&EntityPath::new("pkg/a", "TestFoo")];
        assert_eq!(foo.len(), 3);
        assert_eq!(foo[1].output, "one\n");
        assert_eq!(foo[2].output, "two\n");
    }

    #[test]
    fn last_terminal_action_wins() {
        let events = vec![
            terminal_event("2020-07-10T13:00:00Z", Action::Fail, "pkg/a", "TestFoo", None),
            terminal_event("2020-07-10T13:00:01Z", Action::Pass, "pkg/a", "TestFoo", None),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        assert_eq!(entities[0].status, Some(EntityStatus::Pass));
    }

    #[test]
    fn no_terminal_action_leaves_status_empty() {
        let events = vec![event("2020-07-10T13:00:00Z", Action::Run, "pkg/a", "TestFoo")];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        assert_eq!(entities[0].status, None);
    }

    #[test]
    fn elapsed_overrides_end_time() {
        let events = vec![
            event("2020-07-10T13:00:00Z", Action::Run, "pkg/a", "TestFoo"),
            terminal_event(
                "2020-07-10T13:00:09Z",
                Action::Pass,
                "pkg/a",
                "TestFoo",
                Some(2.5),
            ),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        let entity = &entities[0];
        assert_eq!(entity.elapsed, Some(Duration::milliseconds(2500)));
        assert_eq!(entity.end_time, entity.start_time + Duration::milliseconds(2500));
    }

    #[test]
    fn without_elapsed_end_time_is_last_event() {
        let events = vec![
            event("2020-07-10T13:00:00Z", Action::Run, "pkg/a", "TestFoo"),
            output_event("2020-07-10T13:00:07Z", "pkg/a", "TestFoo", "x\n"),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        let entity = &entities[0];
        assert_eq!(entity.elapsed, None);
        assert_eq!(
            entity.end_time,
            DateTime::parse_from_rfc3339("2020-07-10T13:00:07Z").expect("valid time")
        );
    }

    #[test]
    fn first_case_id_wins() {
        let events = vec![
            output_event("2020-07-10T13:00:00Z", "pkg/a", "TestFoo", "C100 first\n"),
            output_event("2020-07-10T13:00:01Z", "pkg/a", "TestFoo", "C200 second\n"),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        assert_eq!(
            entities[0].case,
            Some(TestCaseRef {
                id: 100,
                description: "first".to_owned(),
            })
        );
    }

    #[test]
    fn skip_with_case_id() {
        let events = vec![
            output_event(
                "2020-07-10T13:00:00Z",
                "pkg/a",
                "TestFoo",
                "C42 Some description",
            ),
            terminal_event("2020-07-10T13:00:01Z", Action::Skip, "pkg/a", "TestFoo", None),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        let entity = &entities[0];
        assert_eq!(entity.status, Some(EntityStatus::Skip));
        assert_eq!(
            entity.case,
            Some(TestCaseRef {
                id: 42,
                description: "Some description".to_owned(),
            })
        );
    }

    #[test]
    fn issue_extraction_first_match_wins() {
        let events = vec![
            output_event(
                "2020-07-10T13:00:00Z",
                "pkg/a",
                "TestFoo",
                "see https://tracker.example.com/browse/PROJ-1 for details\n",
            ),
            output_event(
                "2020-07-10T13:00:01Z",
                "pkg/a",
                "TestFoo",
                "also https://tracker.example.com/browse/PROJ-2\n",
            ),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        assert_eq!(
            entities[0].issue,
            Some(IssueRef {
                ticket: "PROJ-1".to_owned(),
                url: "https://tracker.example.com/browse/PROJ-1".to_owned(),
            })
        );
    }

    #[test]
    fn foreign_tracker_urls_are_ignored() {
        let events = vec![output_event(
            "2020-07-10T13:00:00Z",
            "pkg/a",
            "TestFoo",
            "https://other.example.com/browse/PROJ-1\n",
        )];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        assert_eq!(entities[0].issue, None);
    }

    #[test]
    fn matched_lines_still_accumulate_in_output() {
        let events = vec![
            output_event("2020-07-10T13:00:00Z", "pkg/a", "TestFoo", "C7 desc\n"),
            output_event("2020-07-10T13:00:01Z", "pkg/a", "TestFoo", "plain line\n"),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        assert_eq!(entities[0].output, "C7 desc\nplain line\n");
    }

    #[test]
    fn entities_are_sorted_by_start_time() {
        let events = vec![
            event("2020-07-10T13:00:05Z", Action::Run, "pkg/a", "TestLate"),
            event("2020-07-10T13:00:01Z", Action::Run, "pkg/a", "TestEarly"),
        ];
        let entities = build_entities(&events, &scanner()).expect("aggregation succeeds");
        assert_eq!(entities[0].path, EntityPath::new("pkg/a", "TestEarly"));
        assert_eq!(entities[1].path, EntityPath::new("pkg/a", "TestLate"));
    }
}
