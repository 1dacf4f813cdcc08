//! Command-line surface of `memos-dash`.
//!
//! `tui` (the default) launches the dashboard; the remaining subcommands run
//! one backend call against the stored namespace/session and print the result,
//! either as text or, with `--json`, as the raw response.

use crate::client::Backend;
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::info;
use memos_rs_config::{DashboardConfig, DashboardView};
use memos_rs_core::audit::DEFAULT_AUDIT_LIMIT;
use memos_rs_core::{
    AuditFilter, AuditRow, AuditScope, RetrievalContext, SessionState, StatsBoard, Workbench,
    parse_memory_card,
};
use memos_rs_protocol::QueryRequest;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;

/// Command-line options for the dashboard.
#[derive(Debug, Parser)]
#[command(name = "memos-dash", version, about = "Terminal dashboard for the MemOS memory backend")]
pub struct Cli {
    /// Optional path to a memos.json5 config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Backend base URL, overriding config and environment
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,
    /// Switch to this namespace before running (starts a new session)
    #[arg(long)]
    pub namespace: Option<String>,
    /// Use the in-process demo backend
    #[arg(long, global = true)]
    pub mock: bool,
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Launch the terminal dashboard
    Tui {
        /// Tab to open on start
        #[arg(long)]
        view: Option<DashboardView>,
    },
    /// Print backend stats
    Stats(OutputArgs),
    /// Seed demo memories into the stored session
    Seed {
        /// Drop the session's existing turns first
        #[arg(long)]
        reset: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Reset the stored session on the backend
    Reset {
        /// Report what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
        /// Also delete the session's audit events
        #[arg(long)]
        clear_audit: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run one retrieval query
    Query {
        text: String,
        #[arg(long)]
        top_k: Option<u32>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print audit events
    Audit {
        /// session, namespace or all
        #[arg(long, default_value_t = AuditScope::Session)]
        scope: AuditScope,
        #[arg(long)]
        limit: Option<u32>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show or rotate the stored namespace/session
    Session {
        /// Switch namespace (rotates the session id)
        #[arg(long)]
        namespace: Option<String>,
        /// Start a new session in the current namespace
        #[arg(long)]
        new: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct OutputArgs {
    /// Print the raw JSON response
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Subcommand to run; `tui` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Tui { view: None })
    }

    /// Fold flag overrides into the loaded config and re-validate it.
    pub fn apply_overrides(&self, config: &mut DashboardConfig) -> Result<()> {
        if let Some(base_url) = &self.api_base_url {
            config.api.base_url = base_url.trim().to_string();
        }
        if self.mock {
            config.ui.mock = true;
        }
        if let Some(Command::Tui { view: Some(view) }) = &self.command {
            config.ui.default_view = *view;
        }
        config
            .validate()
            .context("invalid configuration after command-line overrides")
    }
}

/// Switch the stored namespace when `namespace` names a different one.
pub fn apply_namespace(session: &mut SessionState, namespace: Option<&str>) -> Result<()> {
    let Some(namespace) = namespace.map(str::trim) else {
        return Ok(());
    };
    if namespace == session.namespace() {
        return Ok(());
    }
    if !session
        .set_namespace(namespace)
        .context("failed to persist namespace")?
    {
        bail!("namespace must not be empty");
    }
    Ok(())
}

/// Run a headless subcommand, writing its report to `out`.
pub async fn execute<W: Write>(
    command: Command,
    backend: &Backend,
    session: SessionState,
    config: &DashboardConfig,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Tui { .. } => bail!("the tui command is interactive and cannot run headless"),
        Command::Stats(output) => stats(backend, output, out).await,
        Command::Seed { reset, output } => {
            let mut workbench = Workbench::new(backend.api.clone(), session, config.query.top_k);
            let params = workbench.seed_params(reset);
            info!(
                "seeding demo data (namespace={}, session_id={}, reset={})",
                workbench.namespace(),
                workbench.session_id(),
                reset
            );
            let result = backend.api.dev_seed(&params).await;
            let Some(response) = workbench.apply_seed(result) else {
                bail!("seed failed: {}", workbench.api_error().unwrap_or("unknown error"));
            };
            if output.json {
                return print_json(out, &response);
            }
            writeln!(out, "{}", workbench.status().unwrap_or_default())?;
            for id in &response.memory_ids {
                writeln!(out, "  {id}")?;
            }
            Ok(())
        }
        Command::Reset {
            dry_run,
            clear_audit,
            output,
        } => {
            let mut workbench = Workbench::new(backend.api.clone(), session, config.query.top_k);
            let request = workbench.reset_request(dry_run, clear_audit);
            let result = backend.api.reset_session(&request).await;
            let Some(response) = workbench.apply_reset(&request, result) else {
                bail!("reset failed: {}", workbench.api_error().unwrap_or("unknown error"));
            };
            if output.json {
                return print_json(out, &response);
            }
            writeln!(
                out,
                "{}/{} at {}",
                response.namespace, response.session_id, response.reset_at
            )?;
            writeln!(out, "{}", workbench.status().unwrap_or_default())?;
            Ok(())
        }
        Command::Query {
            text,
            top_k,
            output,
        } => {
            let text = text.trim();
            if text.is_empty() {
                bail!("query text must not be empty");
            }
            let request = QueryRequest {
                namespace: session.namespace().to_string(),
                session_id: session.session_id().to_string(),
                query: text.to_string(),
                top_k: Some(top_k.unwrap_or(config.query.top_k)),
            };
            let response = backend
                .api
                .query(&request)
                .await
                .context("query failed")?;
            if output.json {
                return print_json(out, &response);
            }
            write_retrieval(out, &RetrievalContext::from_query(response))
        }
        Command::Audit {
            scope,
            limit,
            output,
        } => {
            let filter = AuditFilter::new(scope, limit.unwrap_or(DEFAULT_AUDIT_LIMIT));
            let params = filter.params(session.namespace(), session.session_id());
            let response = backend
                .api
                .ops_audit(&params)
                .await
                .context("failed to load audit events")?;
            if output.json {
                return print_json(out, &response);
            }
            writeln!(
                out,
                "{} | limit={}",
                filter.header(session.namespace(), session.session_id()),
                filter.limit()
            )?;
            if response.events.is_empty() {
                writeln!(out, "no audit events")?;
            }
            for row in response.events.iter().map(AuditRow::from_event) {
                writeln!(
                    out,
                    "{}  {:<14} {}/{}  {}",
                    row.timestamp, row.event_type, row.namespace, row.session_id, row.details
                )?;
            }
            Ok(())
        }
        Command::Session {
            namespace,
            new,
            output,
        } => {
            let mut session = session;
            apply_namespace(&mut session, namespace.as_deref())?;
            if new {
                session
                    .new_session()
                    .context("failed to persist session id")?;
            }
            if output.json {
                return print_json(
                    out,
                    &json!({
                        "namespace": session.namespace(),
                        "session_id": session.session_id(),
                    }),
                );
            }
            writeln!(out, "namespace  {}", session.namespace())?;
            writeln!(out, "session    {}", session.session_id())?;
            Ok(())
        }
    }
}

async fn stats<W: Write>(backend: &Backend, output: OutputArgs, out: &mut W) -> Result<()> {
    let response = backend
        .api
        .ops_stats()
        .await
        .context("failed to fetch stats")?;
    if output.json {
        return print_json(out, &response);
    }
    let mut board = StatsBoard::default();
    board.apply(Ok(response));
    for card in board.cards() {
        match card.unit {
            Some(unit) => writeln!(out, "{:<18} {} {unit}", card.label, card.value)?,
            None => writeln!(out, "{:<18} {}", card.label, card.value)?,
        }
    }
    Ok(())
}

fn write_retrieval<W: Write>(out: &mut W, context: &RetrievalContext) -> Result<()> {
    writeln!(out, "response   {}", context.id)?;
    writeln!(
        out,
        "tier       {} (similarity {})",
        context.source_tier,
        context.similarity_label()
    )?;
    writeln!(
        out,
        "tokens     {} -> {} (saved {}%)",
        context.token_usage_original,
        context.token_usage_condensed,
        context.saved_percent()
    )?;
    if let Some(pack_id) = &context.context_pack_id {
        writeln!(out, "pack       {pack_id}")?;
    }
    writeln!(out)?;
    writeln!(out, "chunks:")?;
    for chunk in &context.raw_chunks {
        writeln!(
            out,
            "  {:.3} {:<3} {}",
            chunk.score,
            chunk.tier.short(),
            chunk.text
        )?;
    }
    writeln!(out)?;
    writeln!(out, "summary:")?;
    match parse_memory_card(&context.condensed_text) {
        Some(card) => {
            for bucket in card.buckets() {
                for item in bucket.items {
                    writeln!(out, "  [{}] {item}", bucket.label)?;
                }
            }
        }
        None => writeln!(out, "  {}", context.condensed_text)?,
    }
    Ok(())
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize response")?;
    writeln!(out, "{text}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memos_rs_core::{MemoryStore, MockMemosApi};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn backend() -> Backend {
        Backend::from_mock(Arc::new(MockMemosApi::seeded(1, Duration::ZERO)))
    }

    fn session(store: &Arc<MemoryStore>) -> SessionState {
        SessionState::load(store.clone(), "Project_X").expect("load session")
    }

    async fn run(backend: &Backend, session: SessionState, args: &[&str]) -> String {
        let mut argv = vec!["memos-dash"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("parse");
        let mut out = Vec::new();
        execute(
            cli.command(),
            backend,
            session,
            &DashboardConfig::default(),
            &mut out,
        )
        .await
        .expect("execute");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn no_subcommand_launches_the_dashboard() {
        let cli = Cli::try_parse_from(["memos-dash", "--mock"]).expect("parse");
        assert!(cli.mock);
        assert!(matches!(cli.command(), Command::Tui { view: None }));
    }

    #[test]
    fn parses_audit_flags() {
        let cli = Cli::try_parse_from([
            "memos-dash",
            "audit",
            "--scope",
            "ns",
            "--limit",
            "5",
            "--json",
        ])
        .expect("parse");
        match cli.command() {
            Command::Audit {
                scope,
                limit,
                output,
            } => {
                assert_eq!(scope, AuditScope::Namespace);
                assert_eq!(limit, Some(5));
                assert!(output.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_view() {
        assert!(Cli::try_parse_from(["memos-dash", "tui", "--view", "nope"]).is_err());
        let cli = Cli::try_parse_from(["memos-dash", "tui", "--view", "rag"]).expect("parse");
        let mut config = DashboardConfig::default();
        cli.apply_overrides(&mut config).expect("overrides");
        assert_eq!(config.ui.default_view, DashboardView::RagDebugger);
    }

    #[test]
    fn base_url_override_is_validated() {
        let cli =
            Cli::try_parse_from(["memos-dash", "--api-base-url", "ftp://x", "stats"]).expect("parse");
        let mut config = DashboardConfig::default();
        assert!(cli.apply_overrides(&mut config).is_err());
    }

    #[test]
    fn same_namespace_keeps_the_session() {
        let store = Arc::new(MemoryStore::new());
        let mut state = session(&store);
        let before = state.session_id().to_string();
        apply_namespace(&mut state, Some(" Project_X ")).expect("same");
        assert_eq!(state.session_id(), before);
        apply_namespace(&mut state, Some("Team_B")).expect("switch");
        assert_ne!(state.session_id(), before);
        assert!(apply_namespace(&mut state, Some("  ")).is_err());
    }

    #[tokio::test]
    async fn stats_prints_cards() {
        let store = Arc::new(MemoryStore::new());
        let out = run(&backend(), session(&store), &["stats"]).await;
        assert!(out.contains("Total Memories"));
        assert!(out.contains("14,052"));
        assert!(out.contains("82.0%"));
    }

    #[tokio::test]
    async fn seed_then_audit_lists_the_seed_event() {
        let backend = backend();
        let store = Arc::new(MemoryStore::new());
        let out = run(&backend, session(&store), &["seed"]).await;
        assert!(out.starts_with("Seeded 5 memories into Project_X/"));

        let out = run(&backend, session(&store), &["audit"]).await;
        assert!(out.starts_with("scope=session | ns=Project_X"));
        assert!(out.contains("dev_seed"));
    }

    #[tokio::test]
    async fn reset_dry_run_reports_counts() {
        let backend = backend();
        let store = Arc::new(MemoryStore::new());
        run(&backend, session(&store), &["seed"]).await;
        let out = run(&backend, session(&store), &["reset", "--dry-run"]).await;
        assert!(out.contains("Dry run: would delete"));
        assert!(out.contains("memories=5"));
    }

    #[tokio::test]
    async fn query_json_is_the_raw_response() {
        let store = Arc::new(MemoryStore::new());
        let out = run(
            &backend(),
            session(&store),
            &["query", "what's the deadline?", "--top-k", "3", "--json"],
        )
        .await;
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["raw_chunks"].as_array().map(Vec::len), Some(3));
        assert!(value["id"].as_str().is_some_and(|id| id.starts_with("ret-")));
    }

    #[tokio::test]
    async fn query_text_lists_chunks_and_summary() {
        let store = Arc::new(MemoryStore::new());
        let out = run(&backend(), session(&store), &["query", "deadline"]).await;
        assert!(out.contains("tokens     145 -> 28 (saved 81%)"));
        assert!(out.contains("chunks:"));
        assert!(out.contains("summary:"));
    }

    #[tokio::test]
    async fn session_new_rotates_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let before = session(&store).session_id().to_string();
        let out = run(&Backend::from_mock(Arc::new(MockMemosApi::new())), session(&store), &[
            "session", "--new", "--json",
        ])
        .await;
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        let after = value["session_id"].as_str().expect("session id").to_string();
        assert_ne!(after, before);
        assert_eq!(session(&store).session_id(), after);
    }

    #[tokio::test]
    async fn tui_cannot_run_headless() {
        let store = Arc::new(MemoryStore::new());
        let mut out = Vec::new();
        let err = execute(
            Command::Tui { view: None },
            &backend(),
            session(&store),
            &DashboardConfig::default(),
            &mut out,
        )
        .await
        .expect_err("tui is interactive");
        assert!(err.to_string().contains("interactive"));
    }
}
