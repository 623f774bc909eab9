use crate::dashboard::DashboardView;
use crate::detail::{DetailTab, ErrorDetailView};
use crate::session::AuthSession;
use crate::tasks::{DashboardMessage, Request, spawn_request};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use linkrecovery_core::model::{DashboardStats, ErrorRecord, ErrorStatus, Priority, Site};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sites,
    Errors,
}

/// Work that needs the backend. Keys map to actions; actions are sent off
/// the render loop and their results come back as messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Reload,
    AddSite,
    Scan(String),
    OpenError(ErrorRecord),
    GenerateRecommendation,
    MarkFixed,
    MarkIgnored,
    Logout,
}

impl Action {
    pub fn busy_label(&self) -> &'static str {
        match self {
            Action::Reload => "Loading...",
            Action::AddSite => "Adding site...",
            Action::Scan(_) => "Scanning...",
            Action::OpenError(_) => "Loading details...",
            Action::GenerateRecommendation => "Generating...",
            Action::MarkFixed | Action::MarkIgnored => "Updating...",
            Action::Logout => "Logging out...",
        }
    }
}

pub struct App {
    pub session: AuthSession,
    pub dashboard: DashboardView,
    pub focus: Focus,
    pub selected_site: usize,
    pub selected_error: usize,
    /// Label of the latest request still out.
    pub busy: Option<&'static str>,
    pub pending: usize,
    pub should_quit: bool,
    tx: mpsc::UnboundedSender<DashboardMessage>,
    rx: mpsc::UnboundedReceiver<DashboardMessage>,
}

impl App {
    pub fn new(session: AuthSession) -> Self {
        let dashboard = DashboardView::new(session.client().clone());
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session,
            dashboard,
            focus: Focus::Errors,
            selected_site: 0,
            selected_error: 0,
            busy: None,
            pending: 0,
            should_quit: false,
            tx,
            rx,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        if self.dashboard.add_site_open {
            return self.handle_dialog_key(key);
        }
        if self.dashboard.detail.is_some() {
            return self.handle_detail_key(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Sites => Focus::Errors,
                    Focus::Errors => Focus::Sites,
                };
                None
            }
            KeyCode::Up => {
                match self.focus {
                    Focus::Sites => self.selected_site = self.selected_site.saturating_sub(1),
                    Focus::Errors => self.selected_error = self.selected_error.saturating_sub(1),
                }
                None
            }
            KeyCode::Down => {
                match self.focus {
                    Focus::Sites => {
                        let last = self.dashboard.sites.len().saturating_sub(1);
                        self.selected_site = (self.selected_site + 1).min(last);
                    }
                    Focus::Errors => {
                        let last = self.dashboard.recent_errors().len().saturating_sub(1);
                        self.selected_error = (self.selected_error + 1).min(last);
                    }
                }
                None
            }
            KeyCode::Char('a') => {
                self.dashboard.open_add_site();
                None
            }
            KeyCode::Char('r') => Some(Action::Reload),
            KeyCode::Char('s') => self.selected_site_action(),
            KeyCode::Char('L') => Some(Action::Logout),
            KeyCode::Enter => match self.focus {
                Focus::Sites => self.selected_site_action(),
                Focus::Errors => self
                    .dashboard
                    .recent_errors()
                    .get(self.selected_error)
                    .cloned()
                    .map(Action::OpenError),
            },
            _ => None,
        }
    }

    fn selected_site_action(&self) -> Option<Action> {
        if self.dashboard.scanning {
            return None;
        }
        self.dashboard
            .sites
            .get(self.selected_site)
            .map(|s| Action::Scan(s.id.clone()))
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.dashboard.cancel_add_site();
                None
            }
            KeyCode::Enter if !self.dashboard.adding_site => Some(Action::AddSite),
            KeyCode::Backspace => {
                self.dashboard.new_site_url.pop();
                None
            }
            KeyCode::Char(c) => {
                self.dashboard.new_site_url.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Option<Action> {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            self.dashboard.close_error();
            return None;
        }

        let detail = self.dashboard.detail.as_mut()?;
        match key.code {
            KeyCode::Tab => {
                detail.tab = detail.tab.toggle();
                None
            }
            KeyCode::Char('g') if !detail.generating && !detail.is_loading() => {
                Some(Action::GenerateRecommendation)
            }
            KeyCode::Char('f') if !detail.updating && !detail.is_loading() => {
                Some(Action::MarkFixed)
            }
            KeyCode::Char('i') if !detail.updating && !detail.is_loading() => {
                Some(Action::MarkIgnored)
            }
            _ => None,
        }
    }

    /// Send `action` to the backend without waiting for it. Must be called
    /// inside a tokio runtime.
    pub fn dispatch(&mut self, action: Action) {
        let request = match &action {
            Action::Reload => Some(Request::Load),
            Action::AddSite => self.dashboard.begin_add_site().map(Request::AddSite),
            Action::Scan(site_id) => self
                .dashboard
                .begin_scan()
                .then(|| Request::Scan(site_id.clone())),
            Action::OpenError(record) => {
                self.dashboard.show_error(record.clone());
                Some(Request::ErrorDetail(record.id.clone()))
            }
            Action::GenerateRecommendation => self
                .dashboard
                .detail
                .as_mut()
                .and_then(|d| {
                    d.begin_generate()
                        .then(|| Request::GenerateRecommendation(d.error.id.clone()))
                }),
            Action::MarkFixed | Action::MarkIgnored => {
                let status = if action == Action::MarkFixed {
                    ErrorStatus::Fixed
                } else {
                    ErrorStatus::Ignored
                };
                self.dashboard
                    .detail
                    .as_mut()
                    .and_then(|d| {
                        d.begin_update()
                            .then(|| Request::UpdateStatus(d.error.id.clone(), status))
                    })
            }
            Action::Logout => Some(Request::Logout),
        };

        if let Some(request) = request {
            self.busy = Some(action.busy_label());
            self.pending += 1;
            spawn_request(self.session.client().clone(), request, self.tx.clone());
        }
    }

    /// Apply every message that has arrived, without waiting.
    pub fn process_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.apply(message);
        }
    }

    /// Wait until no request is out. Follow-up reloads are waited for too.
    pub async fn settle(&mut self) {
        while self.pending > 0 {
            match self.rx.recv().await {
                Some(message) => self.apply(message),
                None => break,
            }
        }
    }

    pub fn apply(&mut self, message: DashboardMessage) {
        self.pending = self.pending.saturating_sub(1);

        let reload = match message {
            DashboardMessage::Loaded(result) => {
                self.dashboard.apply_load(result);
                false
            }
            DashboardMessage::SiteAdded(result) => self.dashboard.apply_site_added(result),
            DashboardMessage::Scanned(result) => self.dashboard.apply_scan(result),
            DashboardMessage::DetailLoaded { error_id, result } => {
                self.dashboard.apply_details(&error_id, result);
                false
            }
            DashboardMessage::RecommendationGenerated { error_id, result } => {
                self.dashboard.apply_recommendation(&error_id, result);
                false
            }
            DashboardMessage::StatusUpdated {
                error_id,
                status,
                result,
            } => self.dashboard.apply_status_update(&error_id, status, result),
            DashboardMessage::LoggedOut(result) => {
                self.session.apply_logout(result);
                self.should_quit = true;
                false
            }
        };

        if self.pending == 0 {
            self.busy = None;
        }
        if reload {
            self.dispatch(Action::Reload);
        }

        self.selected_site = self
            .selected_site
            .min(self.dashboard.sites.len().saturating_sub(1));
        self.selected_error = self
            .selected_error
            .min(self.dashboard.recent_errors().len().saturating_sub(1));
    }
}

/// Card labels and values, in display order. Missing stats show as zero.
pub fn stat_cards(stats: Option<&DashboardStats>) -> [(&'static str, u64, Color); 4] {
    let s = stats.cloned().unwrap_or_default();
    [
        ("Total 404s", s.total_errors, Color::White),
        ("New Issues", s.new_errors, Color::LightRed),
        ("Fixed", s.fixed_errors, Color::Green),
        ("Backlinks", s.backlinks_affected, Color::Blue),
    ]
}

pub fn priority_badge(score: u32) -> Span<'static> {
    match Priority::of(score) {
        Priority::High => Span::styled(
            format!(" HIGH {} ", score),
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        Priority::Normal => Span::styled(format!(" {} ", score), Style::default().fg(Color::Yellow)),
    }
}

fn last_scan_label(site: &Site) -> String {
    site.last_scan
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Never".to_string())
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

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn hint(key: &'static str) -> Span<'static> {
    Span::styled(key, Style::default().fg(Color::Black).bg(Color::Gray))
}

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(4), // Stat cards
            Constraint::Length(7), // Sites
            Constraint::Min(5),    // Errors
            Constraint::Length(1), // Hints bar
        ])
        .split(size);

    render_header(f, app, vertical_chunks[0]);

    if app.dashboard.loading {
        let main = Rect {
            height: vertical_chunks[3].y + vertical_chunks[3].height - vertical_chunks[1].y,
            ..vertical_chunks[1]
        };
        let loading = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center);
        f.render_widget(loading, main);
    } else {
        render_stats(f, &app.dashboard, vertical_chunks[1]);
        render_sites(f, app, vertical_chunks[2]);
        render_errors(f, app, vertical_chunks[3]);
    }

    render_hints(f, app, vertical_chunks[4]);

    if let Some(detail) = &app.dashboard.detail {
        render_detail(f, detail, centered_rect(80, 80, size));
    }
    if app.dashboard.add_site_open {
        render_add_site(f, &app.dashboard, centered_rect(60, 30, size));
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Link Recovery ")
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut spans = vec![Span::styled(
        app.session.email().unwrap_or("demo session").to_string(),
        Style::default().fg(Color::DarkGray),
    )];

    if let Some(busy) = app.busy {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("⠋ {}", busy),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    } else if let Some(scan) = &app.dashboard.last_scan {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!(
                "✓ {}: {} new, {} URLs inspected",
                scan.message, scan.errors_found, scan.urls_inspected
            ),
            Style::default().fg(Color::Green),
        ));
    }

    if let Some(err) = &app.session.error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(err.clone(), Style::default().fg(Color::Red)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_stats(f: &mut Frame, dashboard: &DashboardView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    for (chunk, (label, value, color)) in chunks.iter().zip(stat_cards(dashboard.stats.as_ref())) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", label))
            .border_style(Style::default().fg(Color::DarkGray));
        let number = Paragraph::new(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(number, *chunk);
    }
}

fn render_sites(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Sites;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Your Sites ({}) ", app.dashboard.sites.len()))
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.dashboard.sites.is_empty() {
        let empty_msg =
            Paragraph::new("No sites added yet. Add your first site to start monitoring 404 errors.")
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true });
        f.render_widget(empty_msg, inner);
        return;
    }

    let height = inner.height as usize;
    let offset = app.selected_site.saturating_sub(height.saturating_sub(1));

    let items: Vec<ListItem> = app
        .dashboard
        .sites
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(idx, site)| {
            let line = Line::from(vec![
                Span::styled(site.site_url.clone(), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  Last scan: {}", last_scan_label(site)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            let mut style = Style::default();
            if focused && idx == app.selected_site {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            ListItem::new(line).style(style)
        })
        .collect();

    f.render_widget(List::new(items), inner);
}

fn render_errors(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Errors;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent 404 Errors ")
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }));

    let errors = app.dashboard.recent_errors();
    if errors.is_empty() {
        let empty_msg = Paragraph::new("No 404 errors found. Run a scan to check for issues.")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(empty_msg, area);
        return;
    }

    let header = Row::new(vec!["URL", "Backlinks", "Impressions", "Priority"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = errors
        .iter()
        .enumerate()
        .map(|(idx, error)| {
            let mut style = Style::default();
            if focused && idx == app.selected_error {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            Row::new(vec![
                Cell::from(error.url.clone()),
                Cell::from(error.backlink_count.to_string()),
                Cell::from(error.impressions.to_string()),
                Cell::from(priority_badge(error.priority_score)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(30),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

fn render_detail(f: &mut Frame, detail: &ErrorDetailView, area: Rect) {
    f.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::raw(" 404 Error Details "),
        priority_badge(detail.error.priority_score),
        Span::raw(" "),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(details) = &detail.details else {
        let loading = Paragraph::new("⠋ Loading details...")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center);
        f.render_widget(loading, inner);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut text = vec![
        Line::from(vec![
            Span::styled("URL: ", label),
            Span::styled(details.error.url.clone(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Backlinks: ", label),
            Span::styled(
                details.error.backlink_count.to_string(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Impressions: ", label),
            Span::styled(
                details.error.impressions.to_string(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Status: ", label),
            Span::styled(details.error.status.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(""),
    ];

    let active = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let inactive = Style::default().fg(Color::Gray);
    let (rec_style, links_style) = match detail.tab {
        DetailTab::Recommendations => (active, inactive),
        DetailTab::Backlinks => (inactive, active),
    };
    text.push(Line::from(vec![
        Span::styled(" AI Recommendations ", rec_style),
        Span::raw(" "),
        Span::styled(format!(" Backlinks ({}) ", details.backlinks.len()), links_style),
    ]));
    text.push(Line::from(""));

    match detail.tab {
        DetailTab::Recommendations => match &details.recommendation {
            None if detail.generating => {
                text.push(Line::from(Span::styled(
                    "⠋ Generating...",
                    Style::default().fg(Color::Yellow),
                )));
            }
            None => {
                text.push(Line::from(
                    "Get smart suggestions for redirect targets and content creation.",
                ));
                text.push(Line::from(vec![
                    Span::raw("Press "),
                    Span::styled("g", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" to generate recommendations."),
                ]));
            }
            Some(rec) => {
                text.push(Line::from(Span::styled(
                    "Redirect Recommendation",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                text.push(Line::from(vec![
                    Span::styled("Suggested Target: ", label),
                    Span::styled(
                        rec.redirect_target.clone().unwrap_or_else(|| "N/A".to_string()),
                        Style::default().fg(Color::Cyan),
                    ),
                ]));
                text.push(Line::from(vec![
                    Span::styled("Reason: ", label),
                    Span::raw(
                        rec.redirect_reason
                            .clone()
                            .unwrap_or_else(|| "No reason provided".to_string()),
                    ),
                ]));
                text.push(Line::from(""));
                text.push(Line::from(Span::styled(
                    "Content Creation Suggestion",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                text.push(Line::from(
                    rec.content_suggestion
                        .clone()
                        .unwrap_or_else(|| "No content suggestion available".to_string()),
                ));
            }
        },
        DetailTab::Backlinks if details.backlinks.is_empty() => {
            text.push(Line::from(format!(
                "No backlinks found for this URL. The URL has {} backlinks according to traffic data.",
                details.error.backlink_count
            )));
        }
        DetailTab::Backlinks => {
            for backlink in &details.backlinks {
                text.push(Line::from(vec![
                    Span::styled("→ ", Style::default().fg(Color::DarkGray)),
                    Span::raw(backlink.source_url.clone()),
                ]));
                if let Some(anchor) = &backlink.anchor_text {
                    text.push(Line::from(vec![
                        Span::styled("    Anchor: ", label),
                        Span::styled(anchor.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    ]));
                }
            }
        }
    }

    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}

fn render_add_site(f: &mut Frame, dashboard: &DashboardView, area: Rect) {
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Add New Site ")
        .border_style(Style::default().fg(Color::Yellow));

    let input = if dashboard.new_site_url.is_empty() {
        Span::styled("https://example.com", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(dashboard.new_site_url.clone(), Style::default().fg(Color::Yellow))
    };

    let text = vec![
        Line::from("Enter the URL of the site you want to monitor for 404 errors."),
        Line::from(""),
        Line::from(vec![Span::raw("Site URL: "), input, Span::raw("█")]),
    ];

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_hints(f: &mut Frame, app: &App, area: Rect) {
    let hints = if app.dashboard.add_site_open {
        Line::from(vec![
            hint(" Enter "),
            Span::raw(" Add Site  "),
            hint(" ESC "),
            Span::raw(" Cancel"),
        ])
    } else if app.dashboard.detail.is_some() {
        Line::from(vec![
            hint(" g "),
            Span::raw(" Generate  "),
            hint(" f "),
            Span::raw(" Mark Fixed  "),
            hint(" i "),
            Span::raw(" Ignore  "),
            hint(" Tab "),
            Span::raw(" Switch Tab  "),
            hint(" q/ESC "),
            Span::raw(" Close"),
        ])
    } else {
        Line::from(vec![
            hint(" q/ESC "),
            Span::raw(" Exit  "),
            hint(" ↑/↓ "),
            Span::raw(" Select  "),
            hint(" Tab "),
            Span::raw(" Sites/Errors  "),
            hint(" Enter "),
            Span::raw(" Details  "),
            hint(" a "),
            Span::raw(" Add Site  "),
            hint(" s "),
            Span::raw(" Scan  "),
            hint(" r "),
            Span::raw(" Refresh  "),
            hint(" L "),
            Span::raw(" Logout"),
        ])
    };

    let paragraph = Paragraph::new(hints).style(Style::default().bg(Color::Black).fg(Color::Gray));
    f.render_widget(paragraph, area);
}

/// Log in, load the dashboard and run it until the user quits.
pub async fn run(session: AuthSession) -> Result<()> {
    let mut app = App::new(session);
    app.dispatch(Action::Reload);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.process_messages();
        terminal.draw(|f| draw(f, app))?;

        if app.should_quit {
            break;
        }

        // Requests run on the runtime's workers while this polls.
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(action) = app.handle_key(key)
        {
            app.dispatch(action);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use ratatui::backend::TestBackend;

    fn test_app() -> App {
        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        App::new(AuthSession::assumed(client))
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_app() -> App {
        let mut app = test_app();
        app.dashboard.loading = false;
        app.dashboard.stats = Some(DashboardStats {
            sites_count: 1,
            total_errors: 5,
            new_errors: 2,
            fixed_errors: 3,
            backlinks_affected: 12,
            recent_scans: Vec::new(),
        });
        let mut high = ErrorRecord::new("s1", "https://example.com/old-product");
        high.priority_score = 85;
        high.backlink_count = 4;
        let mut low = ErrorRecord::new("s1", "https://example.com/typo");
        low.priority_score = 70;
        app.dashboard.errors = vec![high, low];
        app
    }

    #[test]
    fn test_stat_cards_verbatim() {
        let app = loaded_app();
        let cards = stat_cards(app.dashboard.stats.as_ref());
        let values: Vec<u64> = cards.iter().map(|(_, v, _)| *v).collect();
        assert_eq!(values, vec![5, 2, 3, 12]);
        assert_eq!(cards[0].0, "Total 404s");

        let text = screen(&app);
        assert!(text.contains("Total 404s"));
        assert!(text.contains("Backlinks"));
        assert!(text.contains("12"));
    }

    #[test]
    fn test_missing_stats_render_zero() {
        let cards = stat_cards(None);
        assert!(cards.iter().all(|(_, v, _)| *v == 0));
    }

    #[test]
    fn test_high_badge_only_above_threshold() {
        assert!(priority_badge(85).content.contains("HIGH"));
        assert!(!priority_badge(70).content.contains("HIGH"));

        let text = screen(&loaded_app());
        assert!(text.contains("HIGH 85"));
        assert!(text.contains("https://example.com/old-product"));
    }

    #[test]
    fn test_loading_screen() {
        let app = test_app();
        let text = screen(&app);
        assert!(text.contains("Loading..."));
        assert!(!text.contains("Total 404s"));
    }

    #[test]
    fn test_empty_lists() {
        let mut app = test_app();
        app.dashboard.loading = false;
        let text = screen(&app);
        assert!(text.contains("No sites added yet"));
        assert!(text.contains("No 404 errors found"));
    }

    #[test]
    fn test_detail_panel_shows_loading_until_details_arrive() {
        let mut app = loaded_app();
        let record = app.dashboard.errors[0].clone();
        app.dashboard.detail = Some(ErrorDetailView::new(
            app.dashboard.client().clone(),
            record,
        ));

        let text = screen(&app);
        assert!(text.contains("404 Error Details"));
        assert!(text.contains("Loading details..."));
    }

    #[test]
    fn test_add_site_dialog_typing() {
        let mut app = loaded_app();
        assert_eq!(app.handle_key(key(KeyCode::Char('a'))), None);
        assert!(app.dashboard.add_site_open);

        for c in "https://x.io".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.dashboard.new_site_url, "https://x.i");
        assert!(screen(&app).contains("Add New Site"));

        assert_eq!(app.handle_key(key(KeyCode::Enter)), Some(Action::AddSite));

        app.handle_key(key(KeyCode::Esc));
        assert!(!app.dashboard.add_site_open);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_enter_opens_selected_error() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Down));
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Some(Action::OpenError(app.dashboard.errors[1].clone()))
        );
    }

    #[test]
    fn test_detail_keys_ignored_while_loading() {
        let mut app = loaded_app();
        let record = app.dashboard.errors[0].clone();
        app.dashboard.detail = Some(ErrorDetailView::new(
            app.dashboard.client().clone(),
            record,
        ));

        assert_eq!(app.handle_key(key(KeyCode::Char('f'))), None);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), None);
        assert!(app.dashboard.detail.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = loaded_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
