//! Library entry point for the MemOS dashboard.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against a connected [`Backend`], plus the headless [`cli`] commands.

mod app;
pub mod cli;
mod client;
mod event;
mod ui;

pub use client::{Backend, open_session};

use app::App;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use log::{debug, info, warn};
use memos_rs_client::MemosApi;
use memos_rs_config::{DashboardConfig, DashboardView};
use memos_rs_core::mock::{MOCK_MEMORY_COUNT, generate_mock_memories};
use memos_rs_core::{
    AuditScope, CondensationPoller, PollOutcome, PollTicket, SessionState, Workbench,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Supported slash commands in the TUI input box.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlashCommand {
    Namespace(String),
    NewSession,
    Reset { dry_run: bool, clear_audit: bool },
    Seed { reset: bool },
    /// `None` cycles to the next scope.
    Scope(Option<AuditScope>),
    Limit { target: LimitTarget, value: String },
    Rerank,
    View(DashboardView),
    Filter(VaultFilter),
    Refresh,
    Quit,
}

/// Panel a `/limit` applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LimitTarget {
    Audit,
    Condensations,
    ContextPacks,
}

/// Pipeline vault filter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VaultFilter {
    Namespace,
    Session,
    All,
}

/// Settings the dashboard reads from the effective config.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Tab shown on start.
    pub view: DashboardView,
    /// `top_k` for debugger sends.
    pub top_k: u32,
    /// `top_k` for radar queries.
    pub radar_top_k: u32,
    pub stats_interval: Duration,
    pub pipeline_interval: Duration,
    pub condensation_backoff: Vec<Duration>,
}

impl TuiConfig {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            view: config.ui.default_view,
            top_k: config.query.top_k,
            radar_top_k: config.query.radar_top_k,
            stats_interval: config.polling.stats_interval(),
            pipeline_interval: config.polling.pipeline_interval(),
            condensation_backoff: config.polling.condensation_backoff(),
        }
    }
}

/// Background work owned by the event loop.
struct Runtime {
    backend: Backend,
    tx: mpsc::Sender<AppEvent>,
    poller: CondensationPoller,
    pollers: Vec<JoinHandle<()>>,
    condensation: Option<JoinHandle<()>>,
}

impl Runtime {
    fn api(&self) -> Arc<dyn MemosApi> {
        self.backend.api.clone()
    }

    fn abort_condensation(&mut self) {
        if let Some(handle) = self.condensation.take() {
            debug!("aborting condensation poll");
            handle.abort();
        }
    }

    fn shutdown(&mut self) {
        self.abort_condensation();
        for handle in self.pollers.drain(..) {
            handle.abort();
        }
    }
}

/// Launch the dashboard against a connected backend.
///
/// The caller is responsible for initializing logging before calling `run`;
/// logs should go to a file, stderr output corrupts the alternate screen.
///
/// # Errors
/// Returns an error if terminal setup or the event loop fails.
pub async fn run(
    backend: Backend,
    session: SessionState,
    config: TuiConfig,
) -> anyhow::Result<()> {
    info!(
        "starting dashboard (backend={}, namespace={}, session_id={}, view={})",
        backend.label,
        session.namespace(),
        session.session_id(),
        config.view
    );
    let workbench = Workbench::new(backend.api.clone(), session, config.top_k);
    let mut app = App::new(
        workbench,
        config.view,
        backend.label.clone(),
        config.radar_top_k,
    );
    refresh_memories(&mut app, &backend);

    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());

    let mut rt = Runtime {
        pollers: vec![
            spawn_stats_poller(backend.api.clone(), tx.clone(), config.stats_interval),
            spawn_pipeline_poller(backend.api.clone(), tx.clone(), config.pipeline_interval),
        ],
        backend,
        tx,
        poller: CondensationPoller::new(config.condensation_backoff),
        condensation: None,
    };
    on_view_entered(&mut app, &rt);

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, &mut app, &mut rt, &mut rx).await;
    rt.shutdown();
    restore_terminal(&mut terminal)?;
    info!("dashboard exited");
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    rt: &mut Runtime,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;
        let Some(event) = rx.recv().await else {
            break;
        };
        if handle_app_event(app, rt, event)? {
            break;
        }
    }
    Ok(())
}

/// Handle a single application event. Returns `Ok(true)` to exit.
fn handle_app_event(app: &mut App, rt: &mut Runtime, event: AppEvent) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => return handle_input(app, rt, key),
        AppEvent::Tick => app.radar.tick(),
        AppEvent::Scroll(delta) => {
            if delta < 0 {
                app.scroll_up(delta.unsigned_abs());
            } else {
                app.scroll_down(delta.unsigned_abs());
            }
        }
        AppEvent::Stats(result) => app.stats.apply(result),
        AppEvent::Pipeline(result) => {
            if let Err(err) = &result {
                debug!("pipeline poll failed (error={})", err);
            }
            app.pipeline.apply(result);
            if app.view == DashboardView::Cortex {
                refresh_memories(app, &rt.backend);
            }
        }
        AppEvent::SendFinished { pending, result } => {
            if let Some(ticket) = app.workbench.finish_send(&pending, result) {
                spawn_condensation_poll(rt, ticket);
            }
            app.enable_auto_scroll();
        }
        AppEvent::Condensation { ticket, outcome } => {
            if rt.condensation.as_ref().is_some_and(JoinHandle::is_finished) {
                rt.condensation = None;
            }
            match outcome {
                PollOutcome::Found { row, attempts } => {
                    if app.workbench.apply_condensation(&ticket, &row) {
                        app.push_status(format!("condensation applied (attempts={attempts})"));
                    }
                }
                PollOutcome::Exhausted { attempts } => {
                    debug!(
                        "condensation poll exhausted (response_id={}, attempts={})",
                        ticket.response_id, attempts
                    );
                    app.workbench.mark_condensation_pending(&ticket);
                }
            }
        }
        AppEvent::Radar { session_id, result } => {
            if app.is_current_session(&session_id) {
                app.radar.finish_query(result);
            } else {
                app.radar.loading = false;
            }
        }
        AppEvent::Audit { session_id, result } => {
            if app.is_current_session(&session_id) {
                app.audit.finish_load(result);
            } else {
                app.audit.loading = false;
            }
        }
        AppEvent::Condensations { session_id, result } => {
            if app.is_current_session(&session_id) {
                app.condensations.finish_load(result);
            } else {
                app.condensations.loading = false;
            }
        }
        AppEvent::ContextPacks {
            session_id,
            packs,
            procedural,
        } => {
            if app.is_current_session(&session_id) {
                app.context_packs.finish_load(packs, procedural);
            } else {
                app.context_packs.loading = false;
            }
        }
        AppEvent::Reset { request, result } => {
            let cleared = !request.dry_run && result.is_ok();
            if app.workbench.apply_reset(&request, result).is_some() {
                if cleared {
                    rt.abort_condensation();
                }
                if let Some(status) = app.workbench.status().map(str::to_string) {
                    app.push_status(status);
                }
                reload_view(app, rt);
            }
        }
        AppEvent::Seed(result) => {
            if app.workbench.apply_seed(result).is_some() {
                if let Some(status) = app.workbench.status().map(str::to_string) {
                    app.push_status(status);
                }
                reload_view(app, rt);
            }
        }
        AppEvent::ActionError(message) => {
            warn!("action failed (error={})", message);
            app.workbench.set_error(message);
        }
    }
    Ok(false)
}

/// Handle a single key press. Returns `Ok(true)` to exit.
fn handle_input(app: &mut App, rt: &mut Runtime, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            new_session(app, rt);
        }
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            toggle_rerank(app);
        }
        KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            reload_view(app, rt);
        }
        KeyCode::Esc => {
            if app.show_slash_commands {
                app.show_slash_commands = false;
                app.input.clear();
            } else if app.workbench.api_error().is_some() {
                app.workbench.clear_error();
            } else {
                return Ok(true);
            }
        }
        KeyCode::Tab => {
            app.next_view();
            on_view_entered(app, rt);
        }
        KeyCode::BackTab => {
            app.prev_view();
            on_view_entered(app, rt);
        }
        KeyCode::Enter => return submit_input(app, rt),
        KeyCode::Backspace => {
            app.input.pop();
            app.show_slash_commands = app.input.trim_start().starts_with('/');
        }
        KeyCode::Char(ch) => {
            app.input.push(ch);
            app.show_slash_commands = app.input.trim_start().starts_with('/');
        }
        KeyCode::Up if app.view == DashboardView::Radar => app.radar.select_prev(),
        KeyCode::Down if app.view == DashboardView::Radar => app.radar.select_next(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.enable_auto_scroll(),
        _ => {}
    }
    Ok(false)
}

fn submit_input(app: &mut App, rt: &mut Runtime) -> anyhow::Result<bool> {
    let input = std::mem::take(&mut app.input);
    app.show_slash_commands = false;
    match parse_slash_command(&input) {
        Ok(Some(command)) => return Ok(run_slash_command(app, rt, command)),
        Ok(None) => {}
        Err(message) => {
            app.push_status(message);
            return Ok(false);
        }
    }
    let text = input.trim();
    if text.is_empty() {
        return Ok(false);
    }
    if app.view == DashboardView::Radar {
        app.radar.query = text.to_string();
        start_radar_query(app, rt);
    } else {
        app.set_view(DashboardView::RagDebugger);
        start_send(app, rt, text);
    }
    Ok(false)
}

/// Execute a parsed slash command. Returns `true` to exit.
fn run_slash_command(app: &mut App, rt: &mut Runtime, command: SlashCommand) -> bool {
    debug!("slash command (command={:?})", command);
    match command {
        SlashCommand::Namespace(namespace) => change_namespace(app, rt, &namespace),
        SlashCommand::NewSession => new_session(app, rt),
        SlashCommand::Reset {
            dry_run,
            clear_audit,
        } => spawn_reset(app, rt, dry_run, clear_audit),
        SlashCommand::Seed { reset } => spawn_seed(app, rt, reset),
        SlashCommand::Scope(scope) => {
            let current = app.audit.filter.scope;
            app.audit.filter.scope = scope.unwrap_or(current.next());
            app.push_status(format!("audit scope: {}", app.audit.filter.scope));
            spawn_audit_load(app, rt);
        }
        SlashCommand::Limit { target, value } => match target {
            LimitTarget::Audit => {
                app.audit.filter.set_limit_input(&value);
                app.push_status(format!("audit limit: {}", app.audit.filter.limit()));
                spawn_audit_load(app, rt);
            }
            LimitTarget::Condensations => {
                app.condensations.set_limit_input(&value);
                app.push_status(format!(
                    "condensation limit: {}",
                    app.condensations.limit()
                ));
                spawn_condensations_load(app, rt);
            }
            LimitTarget::ContextPacks => {
                app.context_packs.set_limit_input(&value);
                app.push_status(format!(
                    "context pack limit: {}",
                    app.context_packs.limit()
                ));
                spawn_context_packs_load(app, rt);
            }
        },
        SlashCommand::Rerank => toggle_rerank(app),
        SlashCommand::View(view) => {
            app.set_view(view);
            on_view_entered(app, rt);
        }
        SlashCommand::Filter(mode) => {
            let namespace = app.workbench.namespace().to_string();
            let filter = &mut app.pipeline.filter;
            match mode {
                VaultFilter::Namespace => {
                    filter.namespace = namespace;
                    filter.session_id.clear();
                }
                VaultFilter::Session => {
                    filter.namespace = namespace;
                    filter.session_id = app.workbench.session_id().to_string();
                }
                VaultFilter::All => filter.clear(),
            }
            app.push_status("vault filter updated");
            spawn_pipeline_fetch(rt);
        }
        SlashCommand::Refresh => reload_view(app, rt),
        SlashCommand::Quit => return true,
    }
    false
}

/// Parse a slash command from the input line.
fn parse_slash_command(input: &str) -> Result<Option<SlashCommand>, String> {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(None);
    };
    let mut parts = rest.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();
    let command = match command {
        "ns" | "namespace" => {
            if args.is_empty() {
                return Err("usage: /ns <namespace>".to_string());
            }
            SlashCommand::Namespace(args.join(" "))
        }
        "new" => SlashCommand::NewSession,
        "reset" => {
            let mut dry_run = false;
            let mut clear_audit = false;
            for arg in args {
                match arg {
                    "dry-run" | "dry" => dry_run = true,
                    "clear-audit" | "audit" => clear_audit = true,
                    _ => return Err("usage: /reset [dry-run] [clear-audit]".to_string()),
                }
            }
            SlashCommand::Reset {
                dry_run,
                clear_audit,
            }
        }
        "seed" => match args.as_slice() {
            [] => SlashCommand::Seed { reset: false },
            ["reset"] => SlashCommand::Seed { reset: true },
            _ => return Err("usage: /seed [reset]".to_string()),
        },
        "scope" => match args.as_slice() {
            [] => SlashCommand::Scope(None),
            [scope] => SlashCommand::Scope(Some(
                scope
                    .parse()
                    .map_err(|_| "usage: /scope <session|namespace|all>".to_string())?,
            )),
            _ => return Err("usage: /scope <session|namespace|all>".to_string()),
        },
        "limit" => {
            let (target, value) = match args.as_slice() {
                [value] => (LimitTarget::Audit, value),
                [target, value] => {
                    let target = match *target {
                        "audit" => LimitTarget::Audit,
                        "condensations" | "history" => LimitTarget::Condensations,
                        "packs" | "context" => LimitTarget::ContextPacks,
                        _ => return Err(limit_usage()),
                    };
                    (target, value)
                }
                _ => return Err(limit_usage()),
            };
            SlashCommand::Limit {
                target,
                value: value.to_string(),
            }
        }
        "rerank" => SlashCommand::Rerank,
        "view" => match args.as_slice() {
            [name] => SlashCommand::View(name.parse()?),
            _ => return Err("usage: /view <name>".to_string()),
        },
        "filter" => match args.as_slice() {
            [] | ["namespace"] => SlashCommand::Filter(VaultFilter::Namespace),
            ["session"] => SlashCommand::Filter(VaultFilter::Session),
            ["all"] | ["clear"] => SlashCommand::Filter(VaultFilter::All),
            _ => return Err("usage: /filter [namespace|session|all]".to_string()),
        },
        "refresh" => SlashCommand::Refresh,
        "quit" | "q" => SlashCommand::Quit,
        _ => return Err(format!("unknown command: {command}")),
    };
    Ok(Some(command))
}

fn limit_usage() -> String {
    "usage: /limit [audit|condensations|packs] <n>".to_string()
}

fn toggle_rerank(app: &mut App) {
    app.radar.toggle_rerank();
    let state = if app.radar.rerank_enabled { "on" } else { "off" };
    app.push_status(format!("rerank {state}"));
}

fn change_namespace(app: &mut App, rt: &mut Runtime, namespace: &str) {
    match app.workbench.set_namespace(namespace) {
        Ok(true) => {
            rt.abort_condensation();
            app.on_identity_changed();
            app.push_status(format!("namespace: {}", app.workbench.namespace()));
            reload_view(app, rt);
        }
        Ok(false) => app.push_status("usage: /ns <namespace>"),
        Err(err) => app.workbench.set_error(format!("failed to save namespace: {err}")),
    }
}

fn new_session(app: &mut App, rt: &mut Runtime) {
    match app.workbench.new_session() {
        Ok(()) => {
            rt.abort_condensation();
            app.on_identity_changed();
            app.push_status("new session");
            reload_view(app, rt);
        }
        Err(err) => app.workbench.set_error(format!("failed to save session: {err}")),
    }
}

/// Fetch whatever the active tab shows.
fn reload_view(app: &mut App, rt: &Runtime) {
    match app.view {
        DashboardView::Dashboard => spawn_stats_fetch(rt),
        DashboardView::Pipeline => spawn_pipeline_fetch(rt),
        DashboardView::Radar => start_radar_query(app, rt),
        DashboardView::RagDebugger => {}
        DashboardView::Audit => {
            spawn_audit_load(app, rt);
            spawn_condensations_load(app, rt);
        }
        DashboardView::Cortex => refresh_memories(app, &rt.backend),
        DashboardView::ContextPack => spawn_context_packs_load(app, rt),
    }
}

/// Lazy first load when a tab opens.
fn on_view_entered(app: &mut App, rt: &Runtime) {
    match app.view {
        DashboardView::Audit => {
            if app.audit.rows.is_empty() && !app.audit.loading {
                spawn_audit_load(app, rt);
            }
            if app.condensations.rows.is_empty() && !app.condensations.loading {
                spawn_condensations_load(app, rt);
            }
        }
        DashboardView::ContextPack => {
            if app.context_packs.entries.is_empty() && !app.context_packs.loading {
                spawn_context_packs_load(app, rt);
            }
        }
        DashboardView::Cortex => refresh_memories(app, &rt.backend),
        _ => {}
    }
}

/// The demo backend grows its cloud on every query; the HTTP backend only
/// gets a generated cloud once.
fn refresh_memories(app: &mut App, backend: &Backend) {
    match &backend.mock {
        Some(mock) => app.set_memories(mock.memories()),
        None if app.memories.is_empty() => {
            let memories = generate_mock_memories(MOCK_MEMORY_COUNT, &mut rand::rng());
            app.set_memories(memories);
        }
        None => {}
    }
}

fn start_send(app: &mut App, rt: &mut Runtime, text: &str) {
    let Some(pending) = app.workbench.begin_send(text) else {
        if app.workbench.is_processing() {
            app.push_status("waiting for the previous message");
        }
        return;
    };
    app.enable_auto_scroll();
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = pending.execute(api.as_ref()).await;
        let _ = tx.send(AppEvent::SendFinished { pending, result }).await;
    });
}

fn spawn_condensation_poll(rt: &mut Runtime, ticket: PollTicket) {
    rt.abort_condensation();
    info!(
        "starting condensation poll (response_id={}, session_id={})",
        ticket.response_id, ticket.session_id
    );
    let api = rt.api();
    let tx = rt.tx.clone();
    let poller = rt.poller.clone();
    rt.condensation = Some(tokio::spawn(async move {
        let outcome = poller.run(api.as_ref(), &ticket).await;
        let _ = tx.send(AppEvent::Condensation { ticket, outcome }).await;
    }));
}

fn start_radar_query(app: &mut App, rt: &Runtime) {
    let session_id = app.workbench.session_id().to_string();
    let Some(request) =
        app.radar
            .begin_query(app.workbench.namespace(), &session_id, app.radar_top_k)
    else {
        return;
    };
    info!(
        "radar query (session_id={}, top_k={})",
        session_id, app.radar_top_k
    );
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = api.query(&request).await;
        let _ = tx.send(AppEvent::Radar { session_id, result }).await;
    });
}

fn spawn_audit_load(app: &mut App, rt: &Runtime) {
    let session_id = app.workbench.session_id().to_string();
    let params = app.audit.begin_load(app.workbench.namespace(), &session_id);
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = api.ops_audit(&params).await;
        let _ = tx.send(AppEvent::Audit { session_id, result }).await;
    });
}

fn spawn_condensations_load(app: &mut App, rt: &Runtime) {
    let session_id = app.workbench.session_id().to_string();
    let params = app
        .condensations
        .begin_load(app.workbench.namespace(), &session_id);
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = api.ops_condensations(&params).await;
        let _ = tx
            .send(AppEvent::Condensations { session_id, result })
            .await;
    });
}

fn spawn_context_packs_load(app: &mut App, rt: &Runtime) {
    let session_id = app.workbench.session_id().to_string();
    let params = app
        .context_packs
        .begin_load(app.workbench.namespace(), &session_id);
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let (packs, procedural) =
            tokio::join!(api.ops_context_packs(&params), api.ops_procedural());
        let _ = tx
            .send(AppEvent::ContextPacks {
                session_id,
                packs,
                procedural,
            })
            .await;
    });
}

fn spawn_reset(app: &mut App, rt: &Runtime, dry_run: bool, clear_audit: bool) {
    let request = app.workbench.reset_request(dry_run, clear_audit);
    info!(
        "resetting session (session_id={}, dry_run={}, clear_audit={})",
        request.session_id, dry_run, clear_audit
    );
    app.push_status(if dry_run { "reset dry run…" } else { "resetting…" });
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = api.reset_session(&request).await;
        let _ = tx.send(AppEvent::Reset { request, result }).await;
    });
}

fn spawn_seed(app: &mut App, rt: &Runtime, reset: bool) {
    let params = app.workbench.seed_params(reset);
    app.push_status("seeding…");
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = api.dev_seed(&params).await;
        let _ = tx.send(AppEvent::Seed(result)).await;
    });
}

fn spawn_stats_fetch(rt: &Runtime) {
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = api.ops_stats().await;
        let _ = tx.send(AppEvent::Stats(result)).await;
    });
}

fn spawn_pipeline_fetch(rt: &Runtime) {
    let api = rt.api();
    let tx = rt.tx.clone();
    tokio::spawn(async move {
        let result = api.ops_pipeline().await;
        let _ = tx.send(AppEvent::Pipeline(result)).await;
    });
}

fn spawn_stats_poller(
    api: Arc<dyn MemosApi>,
    tx: mpsc::Sender<AppEvent>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let result = api.ops_stats().await;
            if tx.send(AppEvent::Stats(result)).await.is_err() {
                break;
            }
        }
    })
}

fn spawn_pipeline_poller(
    api: Arc<dyn MemosApi>,
    tx: mpsc::Sender<AppEvent>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let result = api.ops_pipeline().await;
            if tx.send(AppEvent::Pipeline(result)).await.is_err() {
                break;
            }
        }
    })
}

fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if let Ok(true) = crossterm::event::poll(Duration::from_millis(30)) {
                while let Ok(true) = crossterm::event::poll(Duration::from_millis(0)) {
                    let Ok(event) = crossterm::event::read() else {
                        break;
                    };
                    let app_event = match event {
                        CrosstermEvent::Key(key) => AppEvent::Input(key),
                        CrosstermEvent::Mouse(mouse) => {
                            let lines = if mouse.modifiers.contains(KeyModifiers::SHIFT) {
                                MOUSE_SCROLL_LINES.saturating_mul(2)
                            } else {
                                MOUSE_SCROLL_LINES
                            };
                            match mouse.kind {
                                MouseEventKind::ScrollUp => AppEvent::Scroll(-lines),
                                MouseEventKind::ScrollDown => AppEvent::Scroll(lines),
                                _ => continue,
                            }
                        }
                        _ => continue,
                    };
                    if sender.send(app_event).await.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

fn spawn_tick(tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("what's the deadline?"), Ok(None));
        assert_eq!(parse_slash_command("  /  "), Ok(None));
    }

    #[test]
    fn namespace_requires_an_argument() {
        assert_eq!(
            parse_slash_command("/ns Team_B"),
            Ok(Some(SlashCommand::Namespace("Team_B".to_string())))
        );
        assert_eq!(
            parse_slash_command("/ns"),
            Err("usage: /ns <namespace>".to_string())
        );
    }

    #[test]
    fn reset_flags_parse_in_any_order() {
        assert_eq!(
            parse_slash_command("/reset clear-audit dry-run"),
            Ok(Some(SlashCommand::Reset {
                dry_run: true,
                clear_audit: true
            }))
        );
        assert_eq!(
            parse_slash_command("/reset"),
            Ok(Some(SlashCommand::Reset {
                dry_run: false,
                clear_audit: false
            }))
        );
        assert!(parse_slash_command("/reset now").is_err());
    }

    #[test]
    fn scope_and_limit_targets() {
        assert_eq!(
            parse_slash_command("/scope ns"),
            Ok(Some(SlashCommand::Scope(Some(AuditScope::Namespace))))
        );
        assert_eq!(
            parse_slash_command("/scope"),
            Ok(Some(SlashCommand::Scope(None)))
        );
        assert_eq!(
            parse_slash_command("/limit packs 7"),
            Ok(Some(SlashCommand::Limit {
                target: LimitTarget::ContextPacks,
                value: "7".to_string()
            }))
        );
        assert_eq!(
            parse_slash_command("/limit 50"),
            Ok(Some(SlashCommand::Limit {
                target: LimitTarget::Audit,
                value: "50".to_string()
            }))
        );
        assert_eq!(parse_slash_command("/limit vault 3"), Err(limit_usage()));
    }

    #[test]
    fn views_and_unknown_commands() {
        assert_eq!(
            parse_slash_command("/view rag"),
            Ok(Some(SlashCommand::View(DashboardView::RagDebugger)))
        );
        assert_eq!(
            parse_slash_command("/view nowhere"),
            Err("unknown view: nowhere".to_string())
        );
        assert_eq!(
            parse_slash_command("/teleport"),
            Err("unknown command: teleport".to_string())
        );
    }

    #[test]
    fn seed_and_filter_presets() {
        assert_eq!(
            parse_slash_command("/seed reset"),
            Ok(Some(SlashCommand::Seed { reset: true }))
        );
        assert_eq!(
            parse_slash_command("/filter clear"),
            Ok(Some(SlashCommand::Filter(VaultFilter::All)))
        );
        assert_eq!(
            parse_slash_command("/filter"),
            Ok(Some(SlashCommand::Filter(VaultFilter::Namespace)))
        );
    }
}
