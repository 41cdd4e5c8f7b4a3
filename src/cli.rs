// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI argument definitions and the synchronous commands.

use anyhow::Context;
use chrono::SecondsFormat;
use clap::{Args, Parser, Subcommand};
use flake::http::{self, HttpConfig};
use flake::{FlakeId, Generator, IdSource};
use std::{io::Write, sync::Arc};

/// Top-level CLI parser for `flake`.
#[derive(Debug, Parser)]
#[command(
    name = "flake",
    version,
    about = "Generate 128-bit sortable IDs inspired by Twitter Snowflake"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate one or more Flake IDs for a worker.
    Generate(GenerateArgs),
    /// Parse a Flake ID and display its components.
    Parse(ParseArgs),
    /// Start the Flake ID HTTP server.
    Http(HttpArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Worker ID, decimal or 0x-prefixed hex, at most 48 bits.
    ///
    /// Environment variable: `FLAKE_WORKER_ID`
    #[arg(short = 'r', long = "worker", env = "FLAKE_WORKER_ID", default_value_t = 1, value_parser = parse_worker_id)]
    pub worker_id: u64,

    /// Number of IDs to generate.
    #[arg(short, long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// An encoded Flake ID, e.g. `000001906B975C00-000000123456-0000`.
    pub id: String,
}

#[derive(Debug, Args)]
pub struct HttpArgs {
    /// Worker ID, decimal or 0x-prefixed hex, at most 48 bits.
    ///
    /// Environment variable: `FLAKE_WORKER_ID`
    #[arg(short = 'r', long = "worker", env = "FLAKE_WORKER_ID", default_value_t = 1, value_parser = parse_worker_id)]
    pub worker_id: u64,

    /// Port for the HTTP server.
    ///
    /// Environment variable: `FLAKE_PORT`
    #[arg(short, long, env = "FLAKE_PORT", default_value_t = 8080)]
    pub port: u16,
}

fn parse_worker_id(value: &str) -> Result<u64, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|err| format!("`{value}` is not a valid worker id: {err}"))
}

/// Runs one parsed command, writing its output to `out`.
///
/// Generator configuration errors surface here, before anything is written or
/// any socket is bound.
pub async fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match cli.command {
        Command::Generate(args) => {
            let generator = Generator::new(args.worker_id)?;
            generate(&generator, args.count, out)
        }
        Command::Parse(args) => parse(&args.id, out),
        Command::Http(args) => {
            let generator = Generator::new(args.worker_id)?;
            tracing::info!(worker_id = generator.worker_id(), "starting HTTP server");
            http::serve(HttpConfig::with_port(args.port), Arc::new(generator)).await?;
            Ok(())
        }
    }
}

/// Writes `count` IDs from `source`, one per line.
pub fn generate(source: &dyn IdSource, count: usize, out: &mut impl Write) -> anyhow::Result<()> {
    for _ in 0..count {
        let id = source.generate();
        writeln!(out, "id={:?} timestamp={:?}", id.to_string(), render_timestamp(&id))?;
    }
    Ok(())
}

/// Decodes `encoded` and writes its fields.
pub fn parse(encoded: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let id: FlakeId = encoded
        .parse()
        .with_context(|| format!("error parsing Flake ID `{encoded}`"))?;
    writeln!(out, "Parsed ID:")?;
    writeln!(out, "Timestamp: {}", render_timestamp(&id))?;
    writeln!(out, "WorkerID: {}", id.worker_id)?;
    writeln!(out, "Sequence: {}", id.sequence)?;
    Ok(())
}

/// RFC 3339 with milliseconds, or the raw millisecond count when out of range.
fn render_timestamp(id: &FlakeId) -> String {
    match id.datetime() {
        Some(datetime) => datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => id.timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flake::ConfigError;

    #[test]
    fn parses_generate_subcommand() {
        let cli = Cli::parse_from(["flake", "generate", "-r", "0x123456", "-c", "3"]);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.worker_id, 0x123456);
                assert_eq!(args.count, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_parse_subcommand() {
        let cli = Cli::parse_from(["flake", "parse", "000001906B975C00-000000123456-0000"]);
        assert!(
            matches!(cli.command, Command::Parse(args) if args.id == "000001906B975C00-000000123456-0000")
        );
    }

    #[test]
    fn parse_requires_exactly_one_id() {
        assert!(Cli::try_parse_from(["flake", "parse"]).is_err());
        assert!(Cli::try_parse_from(["flake", "parse", "a", "b"]).is_err());
    }

    #[test]
    fn parses_http_subcommand() {
        let cli = Cli::parse_from(["flake", "http", "--worker", "7", "--port", "9090"]);
        match cli.command {
            Command::Http(args) => {
                assert_eq!(args.worker_id, 7);
                assert_eq!(args.port, 9090);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_worker_id() {
        assert!(Cli::try_parse_from(["flake", "generate", "-r", "0xZZ"]).is_err());
        assert!(Cli::try_parse_from(["flake", "generate", "-r", "-1"]).is_err());
    }

    #[test]
    fn generate_writes_one_line_per_id() -> anyhow::Result<()> {
        let fixed = || Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let generator = Generator::builder()
            .worker_id(0x123456)
            .time_source(fixed)
            .finalize()?;

        let mut out = Vec::new();
        generate(&generator, 2, &mut out)?;

        let text = String::from_utf8(out)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                r#"id="000001906B975C00-000000123456-0000" timestamp="2024-07-01T00:00:00.000Z""#,
                r#"id="000001906B975C00-000000123456-0001" timestamp="2024-07-01T00:00:00.000Z""#,
            ]
        );
        Ok(())
    }

    #[test]
    fn parse_writes_fields() -> anyhow::Result<()> {
        let mut out = Vec::new();
        parse("000001906B975C00-000000123456-0001", &mut out)?;

        let text = String::from_utf8(out)?;
        assert_eq!(
            text,
            "Parsed ID:\nTimestamp: 2024-07-01T00:00:00.000Z\nWorkerID: 1193046\nSequence: 1\n"
        );
        Ok(())
    }

    #[test]
    fn parse_reports_bad_input() {
        let mut out = Vec::new();
        let err = parse("not-an-id", &mut out).unwrap_err();
        assert!(err.to_string().contains("not-an-id"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn run_generate_writes_count_lines() -> anyhow::Result<()> {
        let cli = Cli::parse_from(["flake", "generate", "-r", "42", "-c", "3"]);
        let mut out = Vec::new();
        run(cli, &mut out).await?;

        let text = String::from_utf8(out)?;
        assert_eq!(text.lines().count(), 3);
        for line in text.lines() {
            let encoded = line
                .strip_prefix("id=\"")
                .and_then(|rest| rest.split('"').next())
                .unwrap();
            assert_eq!(encoded.parse::<FlakeId>()?.worker_id, 42);
        }
        Ok(())
    }

    #[tokio::test]
    async fn run_rejects_out_of_range_worker() {
        for command in ["generate", "http"] {
            let cli = Cli::parse_from(["flake", command, "--worker", "0x1000000000000"]);
            let mut out = Vec::new();
            let err = run(cli, &mut out).await.unwrap_err();

            assert_eq!(
                err.downcast_ref::<ConfigError>(),
                Some(&ConfigError::WorkerIdOutOfRange(1 << 48)),
                "command {command}"
            );
            assert!(err.to_string().contains("greater than the max allowed value"));
            assert!(out.is_empty());
        }
    }

    #[tokio::test]
    async fn run_parse_reports_bad_input() {
        let cli = Cli::parse_from(["flake", "parse", "000001906B975C00-00000012345G-0000"]);
        let mut out = Vec::new();
        let err = run(cli, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("error parsing Flake ID"));
    }

    #[test]
    fn huge_timestamp_renders_raw_millis() {
        let id = FlakeId::new(u64::MAX, 1, 0);
        assert_eq!(render_timestamp(&id), u64::MAX.to_string());

        let epoch = FlakeId::new(0, 1, 0);
        assert_eq!(render_timestamp(&epoch), "1970-01-01T00:00:00.000Z");
    }
}
