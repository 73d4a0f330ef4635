use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, List,
    ListItem, ListState, Paragraph, Tabs, Wrap,
};

use f1_terminal::api::Gateway;
use f1_terminal::cascade::Phase;
use f1_terminal::chart::{self, ChartSeries};
use f1_terminal::config::AppConfig;
use f1_terminal::http_client;
use f1_terminal::provider::spawn_provider;
use f1_terminal::standings::StrokeWeight;
use f1_terminal::state::{
    self, AppState, DriverStats, Loadable, Panel, PanelNotice, ProviderCommand, apply_delta,
    panel_label,
};

const HIGHLIGHT: Color = Color::LightRed;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn dispatch(&mut self, cmds: Vec<ProviderCommand>) {
        if cmds.is_empty() {
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Data provider unavailable");
            return;
        };
        let mut failed = 0usize;
        for cmd in cmds {
            if tx.send(cmd).is_err() {
                failed += 1;
            }
        }
        if failed > 0 {
            self.state
                .push_log(format!("[WARN] {failed} request(s) could not be sent"));
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let cmds = match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.select_next();
                Vec::new()
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.select_prev();
                Vec::new()
            }
            KeyCode::Enter => self.state.select_highlighted_driver(),
            KeyCode::Tab => {
                self.state.panel = self.state.panel.next();
                Vec::new()
            }
            KeyCode::BackTab => {
                self.state.panel = self.state.panel.prev();
                Vec::new()
            }
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.state.panel = Panel::ALL[idx];
                Vec::new()
            }
            KeyCode::Char('[') => self.state.step_season(-1),
            KeyCode::Char(']') => self.state.step_season(1),
            KeyCode::Char('c') => {
                let rival = self.state.highlighted_driver().map(|d| d.driver.clone());
                self.state.set_rival(rival);
                Vec::new()
            }
            KeyCode::Char('x') => {
                self.state.set_rival(None);
                Vec::new()
            }
            KeyCode::Char('r') => self.state.retry(),
            KeyCode::Char('?') => {
                self.state.help_overlay = !self.state.help_overlay;
                Vec::new()
            }
            KeyCode::Esc => {
                self.state.help_overlay = false;
                Vec::new()
            }
            _ => Vec::new(),
        };
        self.dispatch(cmds);
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    http_client::configure_timeout(config.http_timeout);
    let gateway = Gateway::new(&config.api_base, config.http_cache)
        .map_err(|err| io::Error::other(format!("{err:#}")))?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(gateway, tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx));
    app.state
        .push_log(format!("[INFO] Data service: {}", config.api_base));
    let mut startup = app.state.request_drivers();
    startup.extend(app.state.select_driver(config.initial_driver.clone()));
    app.state.set_rival(config.initial_rival.clone());
    app.dispatch(startup);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            let follow_up = apply_delta(&mut app.state, delta);
            app.dispatch(follow_up);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(30)])
        .split(rows[1]);
    render_sidebar(frame, body[0], state);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(body[1]);
    render_tabs(frame, main[0], state);
    match state.panel {
        Panel::Overview => render_overview(frame, main[1], state),
        Panel::Standings => render_standings(frame, main[1], state),
        Panel::Points => render_points(frame, main[1], state),
        Panel::Grid => render_grid(frame, main[1], state),
        Panel::Podiums => render_podiums(frame, main[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[2]);

    let footer = Paragraph::new(
        "j/k Move | Enter Select | Tab/1-5 Panel | [/] Season | c Rival | x Clear rival | r Retry | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, rows[3]);

    if state.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn header_text(state: &AppState) -> String {
    let driver = state
        .subject()
        .map(|id| state.display_name(id).to_string())
        .unwrap_or_else(|| "no driver".to_string());
    let season = state
        .active_season()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut title = format!("F1 TERMINAL | {driver} | Season {season}");
    if let Some(rival) = state.rival.as_deref() {
        title.push_str(&format!(" | vs {}", state.display_name(rival)));
    }
    title
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Drivers").borders(Borders::ALL);
    match &state.drivers {
        Loadable::Loaded(drivers) if !drivers.is_empty() => {
            let items: Vec<ListItem> = drivers
                .iter()
                .map(|d| {
                    let marker = if state.subject() == Some(d.driver.as_str()) {
                        "* "
                    } else if state.rival.as_deref() == Some(d.driver.as_str()) {
                        "~ "
                    } else {
                        "  "
                    };
                    ListItem::new(format!("{marker}{}", d.full_name))
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().fg(Color::White).bg(Color::DarkGray));
            let mut list_state = ListState::default().with_selected(Some(state.sidebar_selected));
            frame.render_stateful_widget(list, area, &mut list_state);
        }
        other => {
            let text = match other {
                Loadable::Loading => "Loading drivers...".to_string(),
                Loadable::Failed(msg) => format!("Error: {msg}"),
                _ => "No drivers".to_string(),
            };
            frame.render_widget(muted_paragraph(text).block(block), area);
        }
    }
}

fn render_tabs(frame: &mut Frame, area: Rect, state: &AppState) {
    let titles: Vec<String> = Panel::ALL
        .iter()
        .enumerate()
        .map(|(idx, panel)| format!("{} {}", idx + 1, panel_label(*panel)))
        .collect();
    let selected = Panel::ALL
        .iter()
        .position(|p| *p == state.panel)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn muted_paragraph<'a>(text: impl Into<Text<'a>>) -> Paragraph<'a> {
    Paragraph::new(text).style(Style::default().fg(Color::DarkGray))
}

fn error_paragraph(msg: &str) -> Paragraph<'static> {
    Paragraph::new(format!("Error: {msg}")).style(Style::default().fg(Color::Red))
}

/// Placeholder for anything that is not loaded data yet.
fn loadable_placeholder<T>(
    value: &Loadable<T>,
    what: &str,
    state: &AppState,
) -> Option<Paragraph<'static>> {
    match value {
        Loadable::NotRequested => Some(match state.idle_panel_notice() {
            PanelNotice::Hint(text) => muted_paragraph(text),
            PanelNotice::Error(msg) => error_paragraph(&msg),
        }),
        Loadable::Loading => Some(muted_paragraph(format!("Loading {what}..."))),
        Loadable::Failed(msg) => Some(error_paragraph(msg)),
        Loadable::Loaded(_) => None,
    }
}

fn render_overview(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Driver Stats").borders(Borders::ALL);
    if let Some(placeholder) = loadable_placeholder(&state.driver_stats, "driver stats", state) {
        frame.render_widget(placeholder.block(block), area);
        return;
    }
    let Some(Some(stats)) = state.driver_stats.loaded() else {
        frame.render_widget(
            muted_paragraph("No data available for this driver.").block(block),
            area,
        );
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(inner);
    frame.render_widget(Paragraph::new(stats_lines(stats)), cols[0]);

    let finishes = Paragraph::new(finishes_lines(stats))
        .block(Block::default().title("Best / Worst by GP").borders(Borders::LEFT))
        .wrap(Wrap { trim: true });
    frame.render_widget(finishes, cols[1]);
}

fn stats_lines(stats: &DriverStats) -> Vec<Line<'static>> {
    let rows = [
        ("Total Races", stats.total_races.to_string()),
        ("Total Laps", stats.total_laps.to_string()),
        ("Total Wins", stats.total_wins.to_string()),
        ("Total Podiums", stats.total_podiums.to_string()),
        ("Pole Positions", stats.total_pole_positions.to_string()),
        ("Fastest Laps", stats.total_fastest_laps.to_string()),
        ("Avg Qualifying", format!("{:.0}", stats.avg_qualifying_pos)),
        ("Best Position", stats.best_position.to_string()),
        ("Total Points", format!("{:.1}", stats.total_points)),
        ("Best Track", stats.most_successful_track.clone()),
    ];
    rows.into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:<16}"), Style::default().fg(Color::Gray)),
                Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect()
}

fn finishes_lines(stats: &DriverStats) -> Vec<Line<'static>> {
    if stats.best_worst_finishes.is_empty() {
        return vec![Line::from("No finishes recorded")];
    }
    stats
        .best_worst_finishes
        .iter()
        .map(|f| Line::from(format!("{:<26} {:>3} / {:>3}", f.gp_name, f.best_finish, f.worst_finish)))
        .collect()
}

fn season_selector(state: &AppState) -> Line<'static> {
    let mut spans = vec![Span::raw("Season: ")];
    for year in state.standings.seasons() {
        if state.active_season() == Some(*year) {
            spans.push(Span::styled(
                format!("[{year}] "),
                Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(format!("{year} ")));
        }
    }
    Line::from(spans)
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match state.active_season() {
        Some(season) => format!("Standings ({season})"),
        None => "Standings".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    frame.render_widget(Paragraph::new(season_selector(state)), parts[0]);

    let controller = &state.standings;
    let message = match controller.phase() {
        Phase::Idle => Some(muted_paragraph("Please select a driver from the sidebar.")),
        Phase::LoadingYears => Some(muted_paragraph("Loading seasons...")),
        Phase::YearsLoaded => Some(muted_paragraph("No seasons available for this driver.")),
        Phase::LoadingStandings => Some(muted_paragraph("Loading standings...")),
        Phase::Error => Some(error_paragraph(controller.error().unwrap_or("Failed to load"))),
        Phase::StandingsLoaded => None,
    };
    if let Some(message) = message {
        frame.render_widget(message, parts[1]);
        return;
    }

    let matrix = state.standings_view();
    if matrix.is_empty() {
        frame.render_widget(muted_paragraph("No standings data for this season."), parts[1]);
        return;
    }
    let styles = controller.styles(&matrix);
    let series = chart::series_for(&matrix, &styles);
    let head_to_head = state.rival.is_some();
    let datasets = standings_datasets(&series, head_to_head);

    let x = chart::x_bounds(&matrix);
    let y = chart::y_bounds(&matrix);
    let chart = Chart::new(datasets)
        .x_axis(axis("Round", x))
        .y_axis(axis("Points", y));
    frame.render_widget(chart, parts[1]);
}

fn standings_datasets(series: &[ChartSeries], head_to_head: bool) -> Vec<Dataset<'_>> {
    // Naming every segment would repeat legend entries; only the first is named, and
    // only when the legend stays readable.
    let show_legend = head_to_head || series.len() <= 6;
    let mut datasets = Vec::new();
    for s in series {
        let (marker, style) = match s.style.stroke_weight {
            StrokeWeight::Bold => (
                Marker::HalfBlock,
                Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD),
            ),
            StrokeWeight::Normal if head_to_head => (Marker::Braille, Style::default().fg(Color::Cyan)),
            StrokeWeight::Normal => (Marker::Braille, Style::default().fg(Color::DarkGray)),
        };
        for (idx, segment) in s.segments.iter().enumerate() {
            let mut dataset = Dataset::default()
                .marker(marker)
                .graph_type(GraphType::Line)
                .style(style)
                .data(segment);
            if idx == 0 && (show_legend || s.style.emphasized) {
                dataset = dataset.name(s.name.clone());
            }
            datasets.push(dataset);
        }
    }
    datasets
}

fn axis(title: &'static str, bounds: [f64; 2]) -> Axis<'static> {
    Axis::default()
        .title(title)
        .style(Style::default().fg(Color::Gray))
        .bounds(bounds)
        .labels(
            chart::axis_labels(bounds)
                .into_iter()
                .map(Span::raw)
                .collect::<Vec<_>>(),
        )
}

fn render_points(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(season_title("Points by Round", state))
        .borders(Borders::ALL);
    if let Some(placeholder) = loadable_placeholder(&state.points, "points", state) {
        frame.render_widget(placeholder.block(block), area);
        return;
    }
    let rows = state.points.loaded().map(Vec::as_slice).unwrap_or(&[]);
    if rows.is_empty() {
        frame.render_widget(muted_paragraph("No points data for this season.").block(block), area);
        return;
    }
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            Bar::default()
                .value(r.points.cell_value().max(0.0).round() as u64)
                .label(Line::from(r.round.to_string()))
                .style(Style::default().fg(HIGHLIGHT))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn render_grid(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(season_title("Starting Positions", state))
        .borders(Borders::ALL);
    if let Some(placeholder) = loadable_placeholder(&state.grid, "starting positions", state) {
        frame.render_widget(placeholder.block(block), area);
        return;
    }
    let slots = state.grid.loaded().map(Vec::as_slice).unwrap_or(&[]);
    if slots.is_empty() {
        frame.render_widget(
            muted_paragraph("No starting grid data for this season.").block(block),
            area,
        );
        return;
    }
    let points: Vec<(f64, f64)> = slots
        .iter()
        .map(|s| (s.round as f64, s.grid as f64))
        .collect();
    let first = points.first().map(|p| p.0).unwrap_or(0.0);
    let last = points.last().map(|p| p.0).unwrap_or(1.0);
    let x = if last > first { [first, last] } else { [first - 0.5, first + 0.5] };
    let max_grid = points.iter().map(|p| p.1).fold(1.0, f64::max);
    let y = [0.0, max_grid + 1.0];

    let dataset = Dataset::default()
        .name("Grid")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(HIGHLIGHT))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(axis("Round", x))
        .y_axis(axis("Grid", y));
    frame.render_widget(chart, area);
}

fn render_podiums(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Podiums by Season")
        .borders(Borders::ALL);
    if let Some(placeholder) = loadable_placeholder(&state.podiums, "podiums", state) {
        frame.render_widget(placeholder.block(block), area);
        return;
    }
    let rows = state.podiums.loaded().map(Vec::as_slice).unwrap_or(&[]);
    if rows.is_empty() {
        frame.render_widget(muted_paragraph("No podiums recorded.").block(block), area);
        return;
    }
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            Bar::default()
                .value(u64::from(r.podiums))
                .label(Line::from(r.year.to_string()))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(4)
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn season_title(base: &str, state: &AppState) -> String {
    match state.active_season() {
        Some(season) => format!("{base} ({season})"),
        None => base.to_string(),
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "F1 Terminal - Help",
        "",
        "Drivers:",
        "  j/k or ↑/↓   Move",
        "  Enter        Analyse highlighted driver",
        "  c            Head-to-head vs highlighted driver",
        "  x            Leave head-to-head",
        "",
        "Panels:",
        "  Tab / 1-5    Switch panel",
        "  [ / ]        Newer / older season",
        "  r            Retry failed requests",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
