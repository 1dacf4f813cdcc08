//! Application state for the MemOS dashboard.

use log::{debug, info};
use memos_rs_config::DashboardView;
use memos_rs_core::mock::{HeatCell, cortex_links, heatmap_cells};
use memos_rs_core::{
    AuditPanel, CondensationHistory, CondensationStatus, ContextPackHistory, MemoryNode,
    MessageRole, PipelineFilter, PipelineView, RadarState, StatsBoard, Workbench,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::cmp::min;

/// Top-level application state for the TUI.
pub struct App {
    /// Active tab.
    pub view: DashboardView,
    /// RAG debugger controller; owns the namespace/session identity.
    pub workbench: Workbench,
    pub stats: StatsBoard,
    pub pipeline: PipelineView,
    pub radar: RadarState,
    pub audit: AuditPanel,
    pub condensations: CondensationHistory,
    pub context_packs: ContextPackHistory,
    /// Point cloud behind the cortex view.
    pub memories: Vec<MemoryNode>,
    pub links: Vec<(usize, usize)>,
    pub heatmap: Vec<HeatCell>,
    /// Current input buffer.
    pub input: String,
    /// Whether to show the slash command palette.
    pub show_slash_commands: bool,
    /// Status line text.
    pub status: String,
    /// Backend shown in the header.
    pub backend_label: String,
    /// `top_k` for radar queries.
    pub radar_top_k: u32,
    /// Current scroll offset of the scrollable panel.
    pub scroll: u16,
    /// Whether to auto-scroll to the bottom.
    pub auto_scroll: bool,
    /// Maximum scroll offset for the scrollable panel.
    pub max_scroll: u16,
}

impl App {
    pub fn new(
        workbench: Workbench,
        view: DashboardView,
        backend_label: impl Into<String>,
        radar_top_k: u32,
    ) -> Self {
        let filter = PipelineFilter::new(workbench.namespace());
        Self {
            view,
            workbench,
            stats: StatsBoard::default(),
            pipeline: PipelineView::new(filter),
            radar: RadarState::new(),
            audit: AuditPanel::default(),
            condensations: CondensationHistory::default(),
            context_packs: ContextPackHistory::default(),
            memories: Vec::new(),
            links: Vec::new(),
            heatmap: Vec::new(),
            input: String::new(),
            show_slash_commands: false,
            status: "idle".to_string(),
            backend_label: backend_label.into(),
            radar_top_k,
            scroll: 0,
            auto_scroll: true,
            max_scroll: 0,
        }
    }

    /// Replace the cortex point cloud and derive its links and heatmap.
    pub fn set_memories(&mut self, memories: Vec<MemoryNode>) {
        debug!("set memories (count={})", memories.len());
        self.links = cortex_links(&memories);
        self.heatmap = heatmap_cells(&memories);
        self.memories = memories;
    }

    /// Switch tab and reset scroll state.
    pub fn set_view(&mut self, view: DashboardView) {
        if self.view == view {
            return;
        }
        info!("view changed (view={})", view);
        self.view = view;
        self.scroll = 0;
        self.auto_scroll = view == DashboardView::RagDebugger;
        self.max_scroll = 0;
    }

    pub fn next_view(&mut self) {
        self.set_view(self.step_view(1));
    }

    pub fn prev_view(&mut self) {
        self.set_view(self.step_view(DashboardView::ALL.len() - 1));
    }

    fn step_view(&self, step: usize) -> DashboardView {
        let views = DashboardView::ALL;
        let idx = views.iter().position(|v| *v == self.view).unwrap_or(0);
        views[(idx + step) % views.len()]
    }

    /// Index of the active tab in [`DashboardView::ALL`].
    pub fn view_index(&self) -> usize {
        DashboardView::ALL
            .iter()
            .position(|v| *v == self.view)
            .unwrap_or(0)
    }

    /// Set the status line.
    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Whether a result issued for `session_id` still belongs on screen.
    pub fn is_current_session(&self, session_id: &str) -> bool {
        self.workbench.session_id() == session_id
    }

    /// Drop every panel tied to the previous namespace/session.
    pub fn on_identity_changed(&mut self) {
        info!(
            "identity changed (namespace={}, session_id={})",
            self.workbench.namespace(),
            self.workbench.session_id()
        );
        self.radar.clear();
        self.radar.loading = false;
        self.audit.rows.clear();
        self.audit.error = None;
        self.condensations.rows.clear();
        self.condensations.error = None;
        self.context_packs.entries.clear();
        self.context_packs.error = None;
        self.pipeline.filter = PipelineFilter::new(self.workbench.namespace());
        self.scroll = 0;
        self.auto_scroll = true;
        self.max_scroll = 0;
    }

    /// Right-hand status text: workbench progress wins over the plain status.
    pub fn status_text(&self) -> String {
        if self.workbench.is_processing() {
            return "processing".to_string();
        }
        match self.workbench.condensation_status() {
            CondensationStatus::Condensing => "condensing…".to_string(),
            CondensationStatus::Pending => "condensation pending".to_string(),
            CondensationStatus::Idle => self.status.clone(),
        }
    }

    /// Scroll upward by a number of lines.
    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll downward by a number of lines.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = min(self.scroll.saturating_add(lines), self.max_scroll);
        if self.scroll >= self.max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
        self.scroll = self.max_scroll;
    }

    /// Update scroll bounds after layout changes.
    ///
    /// Snaps to the new bottom only when auto-scroll is on or the offset was
    /// already pinned to the old bottom.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        let was_at_bottom = self.auto_scroll && self.scroll >= self.max_scroll;
        self.max_scroll = max_scroll;
        if self.auto_scroll || was_at_bottom {
            self.scroll = max_scroll;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    /// Render the debugger transcript into styled lines.
    pub fn transcript_lines(&self) -> Vec<Line<'static>> {
        let messages = self.workbench.transcript();
        let mut lines = Vec::new();

        if messages.is_empty() {
            lines.push(Line::from(Span::styled(
                " No messages yet. Type a message below to query memory.",
                Style::default().fg(Color::Rgb(128, 128, 128)),
            )));
            return lines;
        }

        for (idx, message) in messages.iter().enumerate() {
            let (badge, bg) = match message.role {
                MessageRole::User => (" you ", Color::Rgb(107, 161, 230)),
                MessageRole::Agent => (" agent ", Color::Rgb(238, 121, 72)),
                MessageRole::System => (" system ", Color::Rgb(60, 60, 60)),
            };
            let badge_style = Style::default()
                .fg(Color::Rgb(10, 10, 10))
                .bg(bg)
                .add_modifier(Modifier::BOLD);
            let content_style = match message.role {
                MessageRole::System => Style::default().fg(Color::Rgb(128, 128, 128)),
                _ => Style::default().fg(Color::Rgb(238, 238, 238)),
            };

            lines.push(Line::from(vec![
                Span::styled(badge, badge_style),
                Span::styled(
                    format!(" {}", message.timestamp.format("%H:%M:%S")),
                    Style::default().fg(Color::Rgb(128, 128, 128)),
                ),
            ]));
            for line in message.content.lines() {
                lines.push(Line::from(Span::styled(format!(" {line}"), content_style)));
            }
            if idx + 1 < messages.len() {
                lines.push(Line::from(Span::raw("")));
            }
        }

        // Trailing padding keeps the last wrapped line reachable.
        lines.push(Line::from(Span::raw("")));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memos_rs_core::{MemoryStore, MockMemosApi, SessionState};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> App {
        let session = SessionState::load(Arc::new(MemoryStore::new()), "Project_X").expect("load");
        let api = Arc::new(MockMemosApi::seeded(3, Duration::ZERO));
        App::new(
            Workbench::new(api, session, 6),
            DashboardView::Radar,
            "mock",
            12,
        )
    }

    #[test]
    fn views_cycle_in_both_directions() {
        let mut app = app();
        app.next_view();
        assert_eq!(app.view, DashboardView::RagDebugger);
        app.prev_view();
        app.prev_view();
        assert_eq!(app.view, DashboardView::Pipeline);
        app.set_view(DashboardView::ContextPack);
        app.next_view();
        assert_eq!(app.view, DashboardView::Dashboard);
        assert_eq!(app.view_index(), 0);
    }

    #[test]
    fn identity_change_clears_session_panels() {
        let mut app = app();
        app.radar.loading = true;
        app.pipeline.filter.session_id = "old".to_string();
        app.workbench.set_namespace("Team_B").expect("namespace");
        app.on_identity_changed();
        assert!(!app.radar.loading);
        assert_eq!(app.pipeline.filter, PipelineFilter::new("Team_B"));
        assert!(app.audit.rows.is_empty());
    }

    #[test]
    fn scroll_bounds_follow_bottom_only_when_pinned() {
        let mut app = app();
        app.update_scroll_bounds(10);
        assert_eq!(app.scroll, 10);
        app.scroll_up(4);
        app.update_scroll_bounds(20);
        assert_eq!(app.scroll, 6);
        app.scroll_down(50);
        assert!(app.auto_scroll);
        app.update_scroll_bounds(30);
        assert_eq!(app.scroll, 30);
    }

    #[test]
    fn status_reports_condensation_progress() {
        let app = app();
        assert_eq!(app.status_text(), "idle");
        assert_eq!(app.transcript_lines().len(), 1);
    }
}
