// Copyright (c) The test2rp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, ReportExitCode},
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser};
use rp_agent::agent::{BtsSettings, RpAgent, RunOptions, parse_tags};
use rp_client::RpClient;
use std::io::BufReader;
use tracing::warn;

/// Mirror `go test -json` reports into ReportPortal.
///
/// Reads a machine-readable test report, reconstructs the module → test →
/// subtest hierarchy from test names, and replays it as a ReportPortal
/// launch. Bug-tracker links found in test output are attached to failing
/// and skipped items.
#[derive(Debug, Parser)]
#[command(name = "test2rp", version, styles = clap_styles::style())]
pub struct Test2RpApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(flatten)]
    report_opts: ReportOpts,
}

impl Test2RpApp {
    /// Initializes the output context: sets up logging and color support.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code on success.
    pub fn exec(self) -> Result<i32, ExpectedError> {
        self.report_opts.exec()
    }
}

#[derive(Debug, Args)]
struct ReportOpts {
    /// Path to the JSON report file produced by `go test -json`
    #[arg(value_name = "REPORT_PATH")]
    report_path: Utf8PathBuf,

    /// Name of the launch to create
    #[arg(long, value_name = "NAME")]
    run_name: String,

    /// Description of the launch [default: the run name]
    #[arg(long, value_name = "DESC")]
    run_desc: Option<String>,

    /// ReportPortal base URL
    #[arg(long, value_name = "URL")]
    rp_url: String,

    /// ReportPortal project to report into
    #[arg(long, value_name = "PROJECT")]
    rp_project: String,

    /// ReportPortal API token
    #[arg(long, value_name = "TOKEN", env = "RP_TOKEN", hide_env_values = true)]
    rp_token: String,

    /// Bug-tracker project (the name of the integration in ReportPortal)
    #[arg(long, value_name = "PROJECT", default_value = "SAIV")]
    bts_project: String,

    /// Bug-tracker root URL
    #[arg(
        long,
        value_name = "URL",
        default_value = "https://insolar.atlassian.net/"
    )]
    bts_url: String,

    /// Comma-separated tags for the launch
    #[arg(long, value_name = "TAGS", default_value = "")]
    tags: String,

    /// Exit with code 0 even if the report contains broken records
    #[arg(long)]
    force: bool,

    /// Log HTTP requests and responses with bodies
    #[arg(long)]
    dump_transport: bool,
}

impl ReportOpts {
    fn exec(self) -> Result<i32, ExpectedError> {
        let file = fs_err::File::open(&self.report_path).map_err(|error| {
            ExpectedError::ReportRead {
                path: self.report_path.clone(),
                error,
            }
        })?;

        let client = RpClient::new(
            &self.rp_url,
            &self.rp_project,
            &self.rp_token,
            &self.bts_project,
            &self.bts_url,
            self.dump_transport,
        );
        let mut agent = RpAgent::new(
            client,
            BtsSettings {
                project: self.bts_project.clone(),
                url: self.bts_url.clone(),
            },
        );
        let options = RunOptions {
            run_name: self.run_name.clone(),
            run_description: self
                .run_desc
                .clone()
                .unwrap_or_else(|| self.run_name.clone()),
            tags: parse_tags(&self.tags),
        };

        let stats = agent.report(BufReader::new(file), &options)?;

        if stats.broken_records > 0 {
            warn!(
                "{} record(s) had no terminal action and were reported as failed",
                stats.broken_records
            );
            if !self.force {
                return Ok(ReportExitCode::BROKEN_RECORDS);
            }
        }
        Ok(ReportExitCode::OK)
    }
}
