//! Rendering routines for the MemOS dashboard.

use crate::app::App;
use chrono::Utc;
use memos_rs_config::DashboardView;
use memos_rs_core::context_pack::tail;
use memos_rs_core::mock::{CLOUD_RADIUS, Heat};
use memos_rs_core::pipeline::JobStatus;
use memos_rs_core::radar::RADAR_HALF_WIDTH;
use memos_rs_core::stats::{THROUGHPUT, TIER_HEALTH};
use memos_rs_core::{CondensationStatus, ContextPackView, MemoryCard, Zone, parse_memory_card};
use memos_rs_protocol::MemoryTier;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine, Points};
use ratatui::widgets::{
    Axis, Block, BorderType, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Scrollbar,
    ScrollbarOrientation, ScrollbarState, Tabs, Wrap,
};

const PRIMARY: Color = Color::Rgb(236, 91, 43); // #EC5B2B
const SECONDARY: Color = Color::Rgb(238, 121, 72); // #EE7948
const TEXT: Color = Color::Rgb(238, 238, 238); // #eeeeee
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128); // #808080
const BORDER: Color = Color::Rgb(60, 60, 60); // #3c3c3c
const BORDER_ACTIVE: Color = Color::Rgb(238, 121, 72); // #EE7948
const YELLOW: Color = Color::Rgb(229, 192, 123); // #e5c07b
const GREEN: Color = Color::Rgb(120, 220, 140);
const RED: Color = Color::Rgb(255, 110, 110);
const BLUE: Color = Color::Rgb(120, 190, 255);
const PURPLE: Color = Color::Rgb(190, 150, 255);

const SLASH_PALETTE_HEIGHT: u16 = 17;
const HEADER_HEIGHT: u16 = 4;
const HEATMAP_COLUMNS: usize = 12;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header bar
            Constraint::Length(1),             // tabs
            Constraint::Min(0),                // active view
            Constraint::Length(3),             // input
            Constraint::Length(1),             // status bar
        ])
        .split(frame.area());

    draw_header(frame, app, root[0]);
    draw_tabs(frame, app, root[1]);
    match app.view {
        DashboardView::Dashboard => draw_dashboard(frame, app, root[2]),
        DashboardView::Pipeline => draw_pipeline(frame, app, root[2]),
        DashboardView::Radar => draw_radar(frame, app, root[2]),
        DashboardView::RagDebugger => draw_rag_debugger(frame, app, root[2]),
        DashboardView::Audit => draw_audit(frame, app, root[2]),
        DashboardView::Cortex => draw_cortex(frame, app, root[2]),
        DashboardView::ContextPack => draw_context_pack(frame, app, root[2]),
    }
    if app.show_slash_commands {
        draw_slash_palette(frame, root[2]);
    }
    draw_input(frame, app, root[3]);
    draw_status_bar(frame, app, root[4]);
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    let label_style = Style::default().fg(TEXT_MUTED);
    let value_style = Style::default().fg(TEXT);

    let lines = vec![
        Line::from(vec![
            Span::styled(
                " ◆ MemOS",
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" memory dashboard", Style::default().fg(SECONDARY)),
            Span::styled(format!("  v{VERSION}"), label_style),
        ]),
        Line::from(vec![
            Span::styled("   namespace ", label_style),
            Span::styled(app.workbench.namespace().to_string(), value_style),
            Span::styled("  session ", label_style),
            Span::styled(app.workbench.session_id().to_string(), value_style),
            Span::styled("  backend ", label_style),
            Span::styled(app.backend_label.clone(), value_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_tabs(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let tabs = Tabs::new(DashboardView::ALL.iter().map(|view| view.title()))
        .select(app.view_index())
        .style(Style::default().fg(TEXT_MUTED))
        .highlight_style(Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD))
        .divider(Span::styled("│", Style::default().fg(BORDER)));
    frame.render_widget(tabs, area);
}

fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            format!(" {} ", title.into()),
            Style::default().fg(TEXT_MUTED),
        ))
}

fn muted(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(TEXT_MUTED)))
}

fn heading(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
    ))
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" error: {message}"),
        Style::default().fg(RED),
    ))
}

/// Render `lines` in a bordered panel that follows the app scroll state.
fn draw_scrolled(
    frame: &mut Frame<'_>,
    app: &mut App,
    area: Rect,
    block: Block<'_>,
    lines: Vec<Line<'static>>,
) {
    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1); // -1 for scrollbar
    let content_height = inner.height as usize;

    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);
    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_scroll_bounds(max_scroll);
    let scroll = app.scroll;

    let content_area = Rect {
        width: content_width,
        ..inner
    };
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(paragraph, content_area);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_lines)
            .position(scroll as usize)
            .viewport_content_length(content_height);
        let scrollbar_area = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(BORDER))
                .thumb_style(Style::default().fg(TEXT_MUTED)),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

// ── System overview ──────────────────────────────────────────────────

fn draw_dashboard(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(9),
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);
    for (card, cell) in app.stats.cards().iter().zip(cards.iter()) {
        let mut value = vec![Span::styled(
            format!(" {}", card.value),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )];
        if let Some(unit) = card.unit {
            value.push(Span::styled(format!(" {unit}"), Style::default().fg(TEXT_MUTED)));
        }
        frame.render_widget(
            Paragraph::new(vec![Line::from(""), Line::from(value)]).block(panel(card.label)),
            *cell,
        );
    }

    draw_throughput(frame, rows[1]);

    let tiers = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3); 3])
        .split(rows[2]);
    let colors = [BLUE, PURPLE, GREEN];
    for ((health, cell), color) in TIER_HEALTH.iter().zip(tiers.iter()).zip(colors) {
        let state = if health.online { "online" } else { "offline" };
        let gauge = Gauge::default()
            .block(panel(format!("{} · {state}", health.tier)))
            .gauge_style(Style::default().fg(color).bg(Color::Rgb(25, 25, 25)))
            .percent(health.percent)
            .label(format!("{} | {}", health.primary, health.secondary));
        frame.render_widget(gauge, *cell);
    }
}

fn draw_throughput(frame: &mut Frame<'_>, area: Rect) {
    let load: Vec<(f64, f64)> = THROUGHPUT
        .iter()
        .enumerate()
        .map(|(idx, point)| (idx as f64, point.load))
        .collect();
    let savings: Vec<(f64, f64)> = THROUGHPUT
        .iter()
        .enumerate()
        .map(|(idx, point)| (idx as f64, point.savings))
        .collect();
    let y_max = THROUGHPUT
        .iter()
        .map(|point| point.load.max(point.savings))
        .fold(0.0_f64, f64::max)
        .ceil()
        + 10.0;

    let datasets = vec![
        Dataset::default()
            .name("memory load")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(BLUE))
            .data(&load),
        Dataset::default()
            .name("token savings")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(PRIMARY))
            .data(&savings),
    ];
    let x_labels: Vec<Span<'static>> = THROUGHPUT
        .iter()
        .map(|point| Span::styled(point.label, Style::default().fg(TEXT_MUTED)))
        .collect();
    let chart = Chart::new(datasets)
        .block(panel("System Throughput & Token Optimization"))
        .x_axis(
            Axis::default()
                .bounds([0.0, (THROUGHPUT.len() - 1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", Style::default().fg(TEXT_MUTED)),
                    Span::styled(format!("{:.0}", y_max), Style::default().fg(TEXT_MUTED)),
                ]),
        );
    frame.render_widget(chart, area);
}

// ── Memory pipeline ──────────────────────────────────────────────────

fn draw_pipeline(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(32),
            Constraint::Percentage(28),
            Constraint::Percentage(40),
        ])
        .split(area);
    let now = Utc::now();

    let mut ingest = Vec::new();
    if let Some(job) = app.pipeline.processing_job(now) {
        ingest.push(job_line(&job.id, &job.text, job.status));
    }
    for job in app.pipeline.pending_jobs(now) {
        ingest.push(job_line(&job.id, &job.text, job.status));
    }
    if ingest.is_empty() {
        ingest.push(muted(" Queue empty."));
    }
    frame.render_widget(
        Paragraph::new(ingest)
            .wrap(Wrap { trim: false })
            .block(panel("Ingestion Queue")),
        cols[0],
    );

    let stage = app.pipeline.stage();
    let stage_color = if app.pipeline.queue_count > 0 {
        PRIMARY
    } else {
        TEXT_MUTED
    };
    let filter = &app.pipeline.filter;
    let mut worker = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" {}", stage.as_str().to_uppercase()),
            Style::default().fg(stage_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" queued ", Style::default().fg(TEXT_MUTED)),
            Span::styled(app.pipeline.queue_count.to_string(), Style::default().fg(TEXT)),
        ]),
        muted(format!(
            " updated {}",
            app.pipeline
                .last_updated
                .map(|ts| ts.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string())
        )),
        muted(format!(
            " filter ns={} session={}",
            or_any(&filter.namespace),
            or_any(&filter.session_id)
        )),
    ];
    if let Some(error) = &app.pipeline.error {
        worker.push(Line::from(""));
        worker.push(error_line(error));
    }
    frame.render_widget(
        Paragraph::new(worker)
            .wrap(Wrap { trim: false })
            .block(panel("Condensation Worker")),
        cols[1],
    );

    let mut vault = Vec::new();
    if app.pipeline.vault.is_empty() {
        vault.push(muted(" No condensed sessions for this filter yet."));
    }
    for item in &app.pipeline.vault {
        vault.push(Line::from(Span::styled(
            format!(" {}", item.summary),
            Style::default().fg(TEXT),
        )));
        vault.push(muted(format!(
            "   {} | saved {} tok | {} | {}",
            tail(&item.id, 8),
            item.saved_tokens,
            item.tier.short(),
            item.timestamp.format("%Y-%m-%d %H:%M:%S")
        )));
        if !item.entities.is_empty() {
            vault.push(Line::from(Span::styled(
                format!("   #{}", item.entities.join(" #")),
                Style::default().fg(SECONDARY),
            )));
        }
    }
    draw_scrolled(frame, app, cols[2], panel("Memory Vault"), vault);
}

fn or_any(value: &str) -> &str {
    if value.is_empty() { "*" } else { value }
}

fn job_line(id: &str, text: &str, status: JobStatus) -> Line<'static> {
    let (marker, color) = match status {
        JobStatus::Processing => ("▶", PRIMARY),
        JobStatus::Pending => ("·", TEXT_MUTED),
    };
    Line::from(vec![
        Span::styled(format!(" {marker} {id} "), Style::default().fg(color)),
        Span::styled(text.to_string(), Style::default().fg(TEXT)),
    ])
}

// ── Semantic radar ───────────────────────────────────────────────────

fn zone_color(zone: Zone) -> Color {
    match zone {
        Zone::Precise => GREEN,
        Zone::Usable => YELLOW,
        Zone::Noise => RED,
    }
}

fn draw_radar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    let radar = &app.radar;
    let rerank = radar.rerank_enabled;
    let active = radar.active_index();
    let sweep = f64::from(radar.sweep_angle).to_radians();
    let title = format!(
        "Semantic Radar · rerank {}",
        if rerank { "on" } else { "off" }
    );
    let canvas = Canvas::default()
        .block(panel(title))
        .marker(Marker::Braille)
        .x_bounds([-RADAR_HALF_WIDTH, RADAR_HALF_WIDTH])
        .y_bounds([-RADAR_HALF_WIDTH, RADAR_HALF_WIDTH])
        .paint(move |ctx| {
            for (fraction, color) in [(0.2, GREEN), (0.4, YELLOW), (1.0, BORDER)] {
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: RADAR_HALF_WIDTH * fraction,
                    color,
                });
            }
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.0,
                x2: RADAR_HALF_WIDTH * sweep.sin(),
                y2: RADAR_HALF_WIDTH * sweep.cos(),
                color: SECONDARY,
            });
            ctx.layer();
            for (idx, blip) in radar.blips.iter().enumerate() {
                let (x, y) = blip.offset(rerank);
                let color = if blip.is_filtered(rerank) {
                    BORDER
                } else {
                    zone_color(blip.zone(rerank))
                };
                let (glyph, style) = if Some(idx) == active {
                    ("◉", Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
                } else {
                    ("●", Style::default().fg(color))
                };
                // Canvas y grows upward.
                ctx.print(x, -y, Span::styled(glyph, style));
            }
        });
    frame.render_widget(canvas, cols[0]);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(" query ", Style::default().fg(TEXT_MUTED)),
            Span::styled(
                if radar.query.is_empty() {
                    "(type a query below)".to_string()
                } else {
                    radar.query.clone()
                },
                Style::default().fg(TEXT),
            ),
        ]),
        Line::from(vec![
            Span::styled(" ● precise ≥0.8 ", Style::default().fg(GREEN)),
            Span::styled(" ● usable ≥0.6 ", Style::default().fg(YELLOW)),
            Span::styled(" ● noise", Style::default().fg(RED)),
        ]),
    ];
    if radar.loading {
        lines.push(Line::from(Span::styled(
            " scanning…",
            Style::default().fg(SECONDARY),
        )));
    }
    if let Some(error) = &radar.error {
        lines.push(error_line(error));
    }
    lines.push(Line::from(""));

    match radar.active_blip() {
        Some(blip) => {
            let zone = blip.zone(rerank);
            lines.push(heading(format!(" {}", blip.id)));
            lines.push(muted(format!(" {}", blip.tier)));
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" raw {:.3}  rerank {:.3}  ", blip.raw_score, blip.rerank_score),
                    Style::default().fg(TEXT),
                ),
                Span::styled(zone.label(), Style::default().fg(zone_color(zone))),
            ]));
            if blip.is_noise_filtered(rerank) {
                lines.push(Line::from(Span::styled(
                    " noise filtered",
                    Style::default().fg(RED).add_modifier(Modifier::BOLD),
                )));
            }
            lines.push(Line::from(Span::styled(
                format!(" {}", blip.content),
                Style::default().fg(TEXT),
            )));
        }
        None => lines.push(muted(" No blips. Run a query to scan memory.")),
    }

    if !radar.blips.is_empty() {
        lines.push(Line::from(""));
        lines.push(muted(" Up/Down to select  Ctrl+R rerank"));
        for (idx, blip) in radar.blips.iter().enumerate() {
            let zone = blip.zone(rerank);
            let marker = if Some(idx) == active { ">" } else { " " };
            let style = if blip.is_filtered(rerank) {
                Style::default().fg(TEXT_MUTED)
            } else {
                Style::default().fg(zone_color(zone))
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {marker} {:.3} ", blip.score(rerank)), style),
                Span::styled(
                    format!("{} {}", blip.tier.short(), tail(&blip.id, 12)),
                    Style::default().fg(TEXT),
                ),
            ]));
        }
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel("Blip Detail")),
        cols[1],
    );
}

// ── RAG debugger ─────────────────────────────────────────────────────

fn draw_rag_debugger(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let lines = app.transcript_lines();
    draw_scrolled(frame, app, cols[0], panel("Conversation"), lines);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(cols[1]);

    let workbench = &app.workbench;
    let mut info = Vec::new();
    match workbench.context() {
        Some(context) => {
            info.push(Line::from(vec![
                Span::styled(" tier ", Style::default().fg(TEXT_MUTED)),
                Span::styled(context.source_tier.to_string(), Style::default().fg(TEXT)),
                Span::styled("  similarity ", Style::default().fg(TEXT_MUTED)),
                Span::styled(context.similarity_label(), Style::default().fg(TEXT)),
            ]));
            info.push(Line::from(vec![
                Span::styled(" tokens ", Style::default().fg(TEXT_MUTED)),
                Span::styled(
                    format!(
                        "{} → {}",
                        context.token_usage_original, context.token_usage_condensed
                    ),
                    Style::default().fg(TEXT),
                ),
                Span::raw("  "),
                Span::styled(
                    format!(" -{}% ", context.saved_percent()),
                    Style::default()
                        .fg(Color::Rgb(10, 10, 10))
                        .bg(GREEN)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            let condensation = match workbench.condensation_status() {
                CondensationStatus::Idle => "condensed",
                CondensationStatus::Condensing => "condensing…",
                CondensationStatus::Pending => "condensation pending",
            };
            info.push(muted(format!(
                " {} | chunks {} | id {}",
                condensation,
                context.raw_chunks.len(),
                tail(&context.id, 8)
            )));
        }
        None => info.push(muted(" No retrieval yet.")),
    }
    if workbench.is_processing() {
        info.push(Line::from(Span::styled(
            " retrieving…",
            Style::default().fg(SECONDARY),
        )));
    }
    if let Some(error) = workbench.api_error() {
        info.push(error_line(error));
    }
    frame.render_widget(
        Paragraph::new(info)
            .wrap(Wrap { trim: false })
            .block(panel("Retrieval")),
        right[0],
    );

    let compare = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right[1]);
    let (raw, condensed) = match workbench.context() {
        Some(context) => (
            text_lines(&context.original_text, TEXT_MUTED),
            condensed_lines(&context.condensed_text),
        ),
        None => (Vec::new(), Vec::new()),
    };
    let raw_title = workbench
        .context()
        .map(|c| format!("Raw Context · {} tok", c.token_usage_original))
        .unwrap_or_else(|| "Raw Context".to_string());
    let condensed_title = workbench
        .context()
        .map(|c| format!("Condensed · {} tok", c.token_usage_condensed))
        .unwrap_or_else(|| "Condensed".to_string());
    frame.render_widget(
        Paragraph::new(raw)
            .wrap(Wrap { trim: false })
            .block(panel(raw_title)),
        compare[0],
    );
    frame.render_widget(
        Paragraph::new(condensed)
            .wrap(Wrap { trim: false })
            .block(panel(condensed_title)),
        compare[1],
    );
}

fn text_lines(text: &str, color: Color) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(Span::styled(format!(" {line}"), Style::default().fg(color))))
        .collect()
}

/// Memory cards render as buckets; anything else as plain text.
fn condensed_lines(text: &str) -> Vec<Line<'static>> {
    match parse_memory_card(text) {
        Some(card) => card_lines(&card),
        None => text_lines(text, TEXT),
    }
}

fn card_lines(card: &MemoryCard) -> Vec<Line<'static>> {
    let mut lines = vec![muted(format!(" {}", card.schema))];
    for bucket in card.buckets() {
        if bucket.items.is_empty() {
            continue;
        }
        lines.push(heading(format!(" {}", bucket.label)));
        for item in bucket.items {
            lines.push(Line::from(Span::styled(
                format!("  • {item}"),
                Style::default().fg(TEXT),
            )));
        }
    }
    let risks = card.display_risks();
    if !risks.is_empty() {
        lines.push(heading(" Risks"));
        for risk in risks {
            lines.push(Line::from(Span::styled(
                format!("  ! {risk}"),
                Style::default().fg(YELLOW),
            )));
        }
    }
    let actions = card.display_actions();
    if !actions.is_empty() {
        lines.push(heading(" Actions"));
        for action in actions {
            lines.push(Line::from(Span::styled(
                format!("  → {action}"),
                Style::default().fg(BLUE),
            )));
        }
    }
    if let Some(excerpt) = card.raw_excerpt.as_deref().filter(|e| !e.is_empty()) {
        lines.push(heading(" Excerpt"));
        lines.extend(text_lines(excerpt, TEXT_MUTED));
    }
    lines
}

// ── Audit ────────────────────────────────────────────────────────────

fn draw_audit(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let namespace = app.workbench.namespace().to_string();
    let session_id = app.workbench.session_id().to_string();
    let mut header = vec![
        Span::styled(
            format!(" {}", app.audit.filter.header(&namespace, &session_id)),
            Style::default().fg(TEXT),
        ),
        Span::styled(
            format!(" | limit={}", app.audit.filter.limit()),
            Style::default().fg(TEXT_MUTED),
        ),
    ];
    if app.audit.show_scope_hint() {
        header.push(Span::styled(
            "  (/scope namespace to include other sessions)",
            Style::default().fg(TEXT_MUTED),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(header)).block(panel("Filter")),
        rows[0],
    );

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let mut events = Vec::new();
    if app.audit.loading {
        events.push(Line::from(Span::styled(
            " loading…",
            Style::default().fg(SECONDARY),
        )));
    }
    if let Some(error) = &app.audit.error {
        events.push(error_line(error));
    }
    if app.audit.rows.is_empty() && !app.audit.loading {
        events.push(muted(" No audit events."));
    }
    for row in &app.audit.rows {
        events.push(Line::from(vec![
            Span::styled(format!(" {} ", row.timestamp), Style::default().fg(TEXT_MUTED)),
            Span::styled(
                row.event_type.clone(),
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}/{}", row.namespace, tail(&row.session_id, 8)),
                Style::default().fg(TEXT),
            ),
        ]));
        events.push(muted(format!("   {}", row.details)));
    }
    draw_scrolled(frame, app, cols[0], panel("Audit Events"), events);

    let history = &app.condensations;
    let mut lines = Vec::new();
    if history.loading {
        lines.push(Line::from(Span::styled(
            " loading…",
            Style::default().fg(SECONDARY),
        )));
    }
    if let Some(error) = &history.error {
        lines.push(error_line(error));
    }
    if history.rows.is_empty() && !history.loading {
        lines.push(muted(" No condensations for this session."));
    }
    for row in &history.rows {
        lines.push(heading(format!(" {}", row.title())));
        lines.push(muted(format!(" {}", row.subtitle())));
        lines.push(Line::from(Span::styled(
            format!(" saved {} tok ({}%)", row.saved_tokens, row.saved_percent),
            Style::default().fg(GREEN),
        )));
        match &row.card {
            Some(card) => lines.extend(card_lines(card)),
            None => lines.extend(text_lines(&row.condensed_text, TEXT)),
        }
        lines.push(Line::from(""));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel(format!("Condensations · limit {}", history.limit()))),
        cols[1],
    );
}

// ── Cortex ───────────────────────────────────────────────────────────

fn tier_color(tier: &MemoryTier) -> Color {
    match tier {
        MemoryTier::L1Scratchpad => BLUE,
        MemoryTier::L2Semantic => PURPLE,
        MemoryTier::L3Entity => PRIMARY,
        MemoryTier::Other(_) => TEXT_MUTED,
    }
}

fn draw_cortex(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(area);

    let mut by_tier: Vec<(Color, Vec<(f64, f64)>)> = Vec::new();
    for node in &app.memories {
        let color = tier_color(&node.tier);
        let point = (node.embedding[0], node.embedding[1]);
        match by_tier.iter_mut().find(|(c, _)| *c == color) {
            Some((_, points)) => points.push(point),
            None => by_tier.push((color, vec![point])),
        }
    }
    let edges: Vec<(f64, f64, f64, f64)> = app
        .links
        .iter()
        .filter_map(|(a, b)| {
            let start = app.memories.get(*a)?;
            let end = app.memories.get(*b)?;
            Some((
                start.embedding[0],
                start.embedding[1],
                end.embedding[0],
                end.embedding[1],
            ))
        })
        .collect();

    let bound = CLOUD_RADIUS * 1.1;
    let canvas = Canvas::default()
        .block(panel(format!(
            "Cortex · {} memories · {} links",
            app.memories.len(),
            app.links.len()
        )))
        .marker(Marker::Braille)
        .x_bounds([-bound, bound])
        .y_bounds([-bound, bound])
        .paint(move |ctx| {
            for (x1, y1, x2, y2) in &edges {
                ctx.draw(&CanvasLine {
                    x1: *x1,
                    y1: *y1,
                    x2: *x2,
                    y2: *y2,
                    color: BORDER,
                });
            }
            ctx.layer();
            for (color, coords) in &by_tier {
                ctx.draw(&Points {
                    coords: coords.as_slice(),
                    color: *color,
                });
            }
        });
    frame.render_widget(canvas, cols[0]);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(" ● L1 ", Style::default().fg(BLUE)),
            Span::styled(" ● L2 ", Style::default().fg(PURPLE)),
            Span::styled(" ● L3", Style::default().fg(PRIMARY)),
        ]),
        Line::from(""),
    ];
    for row in app.heatmap.chunks(HEATMAP_COLUMNS) {
        let spans: Vec<Span<'static>> = row
            .iter()
            .map(|cell| {
                Span::styled(
                    "██",
                    Style::default().fg(heat_color(cell.heat, cell.intensity)),
                )
            })
            .collect();
        let mut line = vec![Span::raw(" ")];
        line.extend(spans);
        lines.push(Line::from(line));
    }
    let hot = app.heatmap.iter().filter(|c| c.heat == Heat::Hot).count();
    let decaying = app
        .heatmap
        .iter()
        .filter(|c| c.heat == Heat::Decaying)
        .count();
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!(" hot {hot}"), Style::default().fg(PRIMARY)),
        Span::styled(format!("  decaying {decaying}"), Style::default().fg(BLUE)),
    ]));
    frame.render_widget(
        Paragraph::new(lines).block(panel("Memory Heatmap")),
        cols[1],
    );
}

fn heat_color(heat: Heat, intensity: f64) -> Color {
    let (r, g, b) = match heat {
        Heat::Hot => (236.0, 91.0, 43.0),
        Heat::Warm => (229.0, 192.0, 123.0),
        Heat::Decaying => (120.0, 190.0, 255.0),
    };
    let scale = intensity.clamp(0.0, 1.0);
    Color::Rgb(
        (r * scale) as u8,
        (g * scale) as u8,
        (b * scale) as u8,
    )
}

// ── Context packs ────────────────────────────────────────────────────

fn draw_context_pack(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let current = app
        .workbench
        .context()
        .and_then(|context| context.context_pack.as_ref())
        .map(ContextPackView::from_value);
    let lines = match &current {
        Some(view) => pack_lines(view),
        None => vec![muted(
            " No context pack yet. Send a message in the RAG debugger.",
        )],
    };
    draw_scrolled(frame, app, cols[0], panel("Current Context Pack"), lines);

    let history = &app.context_packs;
    let mut lines = Vec::new();
    if history.loading {
        lines.push(Line::from(Span::styled(
            " loading…",
            Style::default().fg(SECONDARY),
        )));
    }
    if let Some(error) = &history.error {
        lines.push(error_line(error));
    }
    if history.entries.is_empty() && !history.loading {
        lines.push(muted(" No context packs for this session."));
    }
    for entry in &history.entries {
        lines.push(heading(format!(
            " {} | {} | retrieved {}",
            entry.timestamp,
            tail(&entry.id, 8),
            entry.retrieved_count
        )));
        lines.push(Line::from(Span::styled(
            format!("   {}", entry.query_text),
            Style::default().fg(TEXT),
        )));
        lines.push(muted(format!("   {}", entry.view.prompt_line())));
    }
    lines.push(Line::from(""));
    lines.push(heading(" Prompt registry"));
    lines.extend(text_lines(&history.prompt_registry, TEXT_MUTED));
    lines.push(heading(" Tool registry"));
    lines.extend(text_lines(&history.tool_registry, TEXT_MUTED));
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel(format!("History · limit {}", history.limit()))),
        cols[1],
    );
}

fn pack_lines(view: &ContextPackView) -> Vec<Line<'static>> {
    let mut lines = vec![
        muted(format!(" {}", view.schema)),
        Line::from(Span::styled(
            format!(" query: {}", view.query_text),
            Style::default().fg(TEXT),
        )),
        Line::from(Span::styled(
            format!(" {}", view.prompt_line()),
            Style::default().fg(TEXT),
        )),
        Line::from(""),
        heading(" Tools"),
    ];
    if view.tools.is_empty() {
        lines.push(muted("  (none)"));
    }
    for tool in &view.tools {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", tool.name), Style::default().fg(TEXT)),
            Span::styled(format!("  {}", tool.endpoint), Style::default().fg(TEXT_MUTED)),
        ]));
    }
    lines.push(heading(" Working memory (L1)"));
    if view.l1_window.is_empty() {
        lines.push(muted("  (empty)"));
    }
    for message in &view.l1_window {
        lines.push(Line::from(Span::styled(
            format!("  {}", message.line()),
            Style::default().fg(TEXT),
        )));
    }
    let summary_title = if view.session_summary_short_id.is_empty() {
        " Session summary".to_string()
    } else {
        format!(" Session summary · {}", view.session_summary_short_id)
    };
    lines.push(heading(summary_title));
    lines.extend(condensed_lines(&view.session_summary));
    lines.push(heading(" Retrieved chunks"));
    if view.raw_chunks.is_empty() {
        lines.push(muted("  (none)"));
    }
    for chunk in &view.raw_chunks {
        lines.push(Line::from(Span::styled(
            format!("  {}", chunk.line()),
            Style::default().fg(TEXT),
        )));
    }
    lines
}

// ── Input, status and palette ────────────────────────────────────────

fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let is_active = !app.workbench.is_processing() || app.view == DashboardView::Radar;
    let border_color = if is_active { BORDER_ACTIVE } else { BORDER };
    let (title, placeholder) = match app.view {
        DashboardView::Radar => (" Radar Query ", "Type a query to scan memory..."),
        _ if !is_active => (" Waiting for retrieval ", ""),
        _ => (" Message ", "Type a message or / for commands..."),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            title,
            Style::default().fg(if is_active { SECONDARY } else { TEXT_MUTED }),
        ));
    let inner = block.inner(area);

    let prompt_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let input_text = if app.input.is_empty() {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(placeholder, Style::default().fg(TEXT_MUTED)),
        ])
    } else {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(app.input.as_str(), Style::default().fg(TEXT)),
        ])
    };

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(input_text), inner);

    if is_active {
        let width = app.input.chars().count() as u16;
        frame.set_cursor_position((inner.x + 1 + width, inner.y));
    }
}

fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status = app.status_text();
    let status_color = match status.as_str() {
        "idle" => TEXT_MUTED,
        "processing" | "condensing…" => PRIMARY,
        _ => YELLOW,
    };

    let left_line = match app.workbench.api_error() {
        Some(error) => Line::from(vec![
            Span::styled(format!(" {error}"), Style::default().fg(RED)),
            Span::styled("  Esc", Style::default().fg(TEXT_MUTED)),
            Span::styled(" dismiss", Style::default().fg(BORDER)),
        ]),
        None => Line::from(vec![
            Span::styled(" Ctrl+C", Style::default().fg(TEXT_MUTED)),
            Span::styled(" quit", Style::default().fg(BORDER)),
            Span::styled("  Tab", Style::default().fg(TEXT_MUTED)),
            Span::styled(" views", Style::default().fg(BORDER)),
            Span::styled("  /", Style::default().fg(TEXT_MUTED)),
            Span::styled(" commands", Style::default().fg(BORDER)),
            Span::styled("  Ctrl+N", Style::default().fg(TEXT_MUTED)),
            Span::styled(" new session", Style::default().fg(BORDER)),
            Span::styled("  Ctrl+L", Style::default().fg(TEXT_MUTED)),
            Span::styled(" refresh", Style::default().fg(BORDER)),
        ]),
    };

    let right_text = format!(" {status} ");
    let right_len = right_text.chars().count() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    frame.render_widget(Paragraph::new(left_line), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right_text,
            Style::default().fg(status_color),
        ))),
        right_area,
    );
}

const SLASH_COMMANDS: [(&str, &str); 11] = [
    ("/ns <name>", "Switch namespace (new session)"),
    ("/new", "Start a new session"),
    ("/reset [dry-run] [clear-audit]", "Reset the session"),
    ("/seed [reset]", "Seed demo memories"),
    ("/scope [session|namespace|all]", "Audit scope"),
    ("/limit [target] <n>", "audit, condensations, packs"),
    ("/filter [namespace|session|all]", "Vault filter"),
    ("/rerank", "Toggle radar rerank"),
    ("/view <name>", "Open a view"),
    ("/refresh", "Reload the active view"),
    ("/quit", "Exit"),
];

fn draw_slash_palette(frame: &mut Frame<'_>, area: Rect) {
    let cmd_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(TEXT_MUTED);

    let mut lines = vec![Line::from("")];
    for (command, description) in SLASH_COMMANDS {
        lines.push(Line::from(vec![
            Span::styled(format!("  {command:<34}"), cmd_style),
            Span::styled(description, desc_style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Esc to close",
        Style::default()
            .fg(TEXT_MUTED)
            .add_modifier(Modifier::ITALIC),
    )));

    let height = SLASH_PALETTE_HEIGHT
        .min(area.height)
        .min(lines.len() as u16 + 2); // +2 for border
    let palette_area = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(height),
        width: area.width.saturating_sub(2).min(72),
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PRIMARY))
        .title(Span::styled(
            " Commands ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));

    frame.render_widget(ratatui::widgets::Clear, palette_area);
    frame.render_widget(Paragraph::new(lines).block(block), palette_area);
}
