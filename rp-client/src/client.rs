// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ClientError, FinishedLaunch, ItemFinish, ItemStart, ItemStatus, LaunchStart, LogLevel,
    StartedItem, StartedLaunch,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use ureq::Agent;

/// A blocking ReportPortal client scoped to one project.
///
/// The client remembers the launch opened through it, so item-level calls
/// don't need to carry the launch UUID. Exactly one launch is active at a
/// time; starting a new one replaces the previous.
pub struct RpClient {
    agent: Agent,
    base_url: String,
    project: String,
    token: String,
    bts_project: String,
    bts_url: String,
    dump_transport: bool,
    launch: Option<StartedLaunch>,
}

enum Verb {
    Post,
    Put,
}

impl Verb {
    fn as_str(&self) -> &'static str {
        match self {
            Verb::Post => "POST",
            Verb::Put => "PUT",
        }
    }
}

impl RpClient {
    /// Creates a client for the given ReportPortal instance and project.
    ///
    /// `bts_project` and `bts_url` identify the bug-tracker integration used
    /// by [`link_issue`](Self::link_issue). With `dump_transport` set,
    /// request and response bodies are logged at debug level.
    pub fn new(
        base_url: &str,
        project: &str,
        token: &str,
        bts_project: &str,
        bts_url: &str,
        dump_transport: bool,
    ) -> Self {
        // Non-2xx responses must come back as responses, not errors, so
        // their bodies can be preserved for diagnostics.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_owned(),
            project: project.to_owned(),
            token: token.to_owned(),
            bts_project: bts_project.to_owned(),
            bts_url: bts_url.to_owned(),
            dump_transport,
            launch: None,
        }
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The project this client reports into.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The UUID of the active launch, if one has been started.
    pub fn launch_id(&self) -> Option<&str> {
        self.launch.as_ref().map(|launch| launch.id.as_str())
    }

    /// Starts a launch and remembers it for subsequent item calls.
    pub fn start_launch(&mut self, launch: &LaunchStart) -> Result<StartedLaunch, ClientError> {
        let started: StartedLaunch = self.send_json(Verb::Post, "launch", launch)?;
        self.launch = Some(started.clone());
        Ok(started)
    }

    /// Finishes the active launch.
    ///
    /// ReportPortal recomputes the aggregate status server-side, so the
    /// status passed here is a placeholder.
    pub fn finish_launch(
        &mut self,
        status: ItemStatus,
        end_time: DateTime<FixedOffset>,
    ) -> Result<FinishedLaunch, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct FinishLaunchRequest {
            status: ItemStatus,
            end_time: DateTime<FixedOffset>,
        }

        let uuid = self.active_launch()?.id.clone();
        self.send_json(
            Verb::Put,
            &format!("launch/{uuid}/finish"),
            &FinishLaunchRequest { status, end_time },
        )
    }

    /// Starts a test item, nested under `parent` when given.
    pub fn start_item(
        &mut self,
        parent: Option<&str>,
        item: &ItemStart,
    ) -> Result<StartedItem, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct StartItemRequest<'a> {
            #[serde(flatten)]
            item: &'a ItemStart,
            launch_uuid: &'a str,
        }

        let launch_uuid = self.active_launch()?.id.clone();
        let path = match parent {
            Some(parent) => format!("item/{parent}"),
            None => "item".to_owned(),
        };
        self.send_json(
            Verb::Post,
            &path,
            &StartItemRequest {
                item,
                launch_uuid: &launch_uuid,
            },
        )
    }

    /// Finishes a test item.
    pub fn finish_item(&mut self, item_id: &str, finish: &ItemFinish) -> Result<(), ClientError> {
        let _: serde_json::Value = self.send_json(Verb::Put, &format!("item/{item_id}"), finish)?;
        Ok(())
    }

    /// Appends a log entry to an open item.
    pub fn append_log(
        &mut self,
        item_id: &str,
        message: &str,
        level: LogLevel,
    ) -> Result<(), ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct LogRequest<'a> {
            launch_uuid: &'a str,
            item_uuid: &'a str,
            time: DateTime<FixedOffset>,
            message: &'a str,
            level: LogLevel,
        }

        let launch_uuid = self.active_launch()?.id.clone();
        let _: serde_json::Value = self.send_json(
            Verb::Post,
            "log",
            &LogRequest {
                launch_uuid: &launch_uuid,
                item_uuid: item_id,
                time: Utc::now().fixed_offset(),
                message,
                level,
            },
        )?;
        Ok(())
    }

    /// Resolves an item UUID to the numeric id used by the issue-link API.
    pub fn resolve_item_id(&mut self, item_uuid: &str) -> Result<i64, ClientError> {
        #[derive(serde::Deserialize)]
        struct ItemInfo {
            id: i64,
        }

        let info: ItemInfo = self.get_json(&format!("item/uuid/{item_uuid}"))?;
        Ok(info.id)
    }

    /// Links an external bug-tracker ticket to a finished item.
    ///
    /// This is a required second step after finish-time issue attachment:
    /// the attachment alone does not reliably create a queryable link.
    pub fn link_issue(
        &mut self,
        lookup_id: i64,
        ticket: &str,
        url: &str,
    ) -> Result<(), ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct LinkIssueRequest<'a> {
            issues: Vec<crate::ExternalIssue>,
            test_item_ids: &'a [i64],
        }

        let request = LinkIssueRequest {
            issues: vec![crate::ExternalIssue {
                bts_project: self.bts_project.clone(),
                bts_url: self.bts_url.clone(),
                ticket_id: ticket.to_owned(),
                url: url.to_owned(),
            }],
            test_item_ids: &[lookup_id],
        };
        let _: serde_json::Value = self.send_json(Verb::Put, "item/issue/link", &request)?;
        Ok(())
    }

    fn active_launch(&self) -> Result<&StartedLaunch, ClientError> {
        self.launch.as_ref().ok_or(ClientError::NoActiveLaunch)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}/{}", self.base_url, self.project, path)
    }

    fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        verb: Verb,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.api_url(path);
        if self.dump_transport {
            debug!(
                "{} {url} body: {}",
                verb.as_str(),
                serde_json::to_string(body).unwrap_or_else(|_| "<unserializable>".to_owned()),
            );
        }
        let builder = match verb {
            Verb::Post => self.agent.post(url.as_str()),
            Verb::Put => self.agent.put(url.as_str()),
        };
        let response = builder
            .header("Authorization", &format!("Bearer {}", self.token))
            .send_json(body)
            .map_err(|error| ClientError::Transport {
                url: url.clone(),
                error: Box::new(error),
            })?;
        self.read_json(url, response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.api_url(path);
        if self.dump_transport {
            debug!("GET {url}");
        }
        let response = self
            .agent
            .get(url.as_str())
            .header("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|error| ClientError::Transport {
                url: url.clone(),
                error: Box::new(error),
            })?;
        self.read_json(url, response)
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        url: String,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|error| ClientError::Transport {
                url: url.clone(),
                error: Box::new(error),
            })?;
        if self.dump_transport {
            debug!("{status} {url} body: {body}");
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                url,
                body,
            });
        }
        serde_json::from_str(&body).map_err(|error| ClientError::Decode { url, error })
    }
}
