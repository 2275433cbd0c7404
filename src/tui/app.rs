//! Application state and event loop

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
    DefaultTerminal, Frame,
};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::gateway::HttpGateway;
use crate::services::RevenueLoader;
use crate::types::{RevenueReport, User, UserId};

use super::theme::Theme;
use super::widgets::{
    help::HelpPopup,
    revenue_chart::RevenueChart,
    spinner::{LoadingStage, Spinner},
    user_list::{self, UserListView, UserSelection},
};

/// Application state
pub enum AppState {
    /// Waiting on a fetch, with spinner animation
    Loading {
        spinner_frame: usize,
        stage: LoadingStage,
    },
    /// Selectable users
    UserList,
    /// The single active chart
    Chart {
        report: Box<RevenueReport>,
        user_label: String,
    },
    /// A fetch failed; shown in place of the expected view
    Error { message: String },
}

/// Background work the event loop must start
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Users,
    Revenue(UserId),
}

/// A tagged request; the tag identifies which response the app still wants
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub seq: u64,
    pub kind: RequestKind,
}

/// Outcome of a background fetch
pub enum LoadResult {
    Users(Result<Vec<User>, String>),
    Revenue(Result<RevenueReport, String>),
}

/// Response carried back over the channel
pub struct LoadMessage {
    pub seq: u64,
    pub result: LoadResult,
}

/// Main application
pub struct App {
    state: AppState,
    users: Vec<User>,
    selection: UserSelection,
    /// User rows the current terminal height can show
    list_rows: usize,
    /// Sequence of the request whose result is still wanted
    pending_seq: Option<u64>,
    next_seq: u64,
    should_quit: bool,
    show_help: bool,
    theme: Theme,
}

impl App {
    /// Create a new app in the user loading state
    pub fn new(theme: Theme) -> Self {
        Self {
            state: AppState::Loading {
                spinner_frame: 0,
                stage: LoadingStage::Users,
            },
            users: Vec::new(),
            selection: UserSelection::default(),
            list_rows: user_list::MAX_VISIBLE_ROWS,
            pending_seq: None,
            next_seq: 0,
            should_quit: false,
            show_help: false,
            theme,
        }
    }

    /// Tag a new request, superseding any request still in flight
    fn begin(&mut self, kind: RequestKind) -> Request {
        let stage = match kind {
            RequestKind::Users => LoadingStage::Users,
            RequestKind::Revenue(_) => LoadingStage::Revenue,
        };
        self.next_seq += 1;
        self.pending_seq = Some(self.next_seq);
        // Replacing the state drops any previous chart
        self.state = AppState::Loading {
            spinner_frame: 0,
            stage,
        };
        Request {
            seq: self.next_seq,
            kind,
        }
    }

    /// First request issued at startup
    pub fn start(&mut self) -> Request {
        self.begin(RequestKind::Users)
    }

    /// Apply a finished fetch; stale results are discarded
    pub fn apply(&mut self, message: LoadMessage) {
        if self.pending_seq != Some(message.seq) {
            debug!(seq = message.seq, "discarding stale result");
            return;
        }
        self.pending_seq = None;

        match message.result {
            LoadResult::Users(Ok(users)) => {
                self.users = users;
                self.selection.clamp(self.users.len(), self.list_rows);
                self.state = AppState::UserList;
            }
            LoadResult::Revenue(Ok(report)) => {
                let user_label = self
                    .users
                    .iter()
                    .find(|u| u.id.to_string() == report.user_id)
                    .map(User::display_name)
                    .unwrap_or_else(|| report.user_id.clone());
                self.state = AppState::Chart {
                    report: Box::new(report),
                    user_label,
                };
            }
            LoadResult::Users(Err(message)) | LoadResult::Revenue(Err(message)) => {
                warn!(error = %message, "load failed");
                self.state = AppState::Error { message };
            }
        }
    }

    /// Return to the user list, abandoning any pending fetch
    fn back_to_list(&mut self) {
        self.pending_seq = None;
        self.state = AppState::UserList;
    }

    /// Handle keyboard events; returns a request to start, if any
    pub fn handle_event(&mut self, event: Event) -> Option<Request> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return None;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return None;
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                return None;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return None;
            }
            _ => {}
        }

        let listing = matches!(self.state, AppState::UserList);
        let failed = matches!(self.state, AppState::Error { .. });
        let can_go_back = failed
            || matches!(
                self.state,
                AppState::Chart { .. }
                    | AppState::Loading {
                        stage: LoadingStage::Revenue,
                        ..
                    }
            );

        match key.code {
            KeyCode::Up | KeyCode::Char('k') if listing => {
                self.selection.up();
                None
            }
            KeyCode::Down | KeyCode::Char('j') if listing => {
                self.selection.down(self.users.len(), self.list_rows);
                None
            }
            KeyCode::Enter if listing => {
                let user_id = self.users.get(self.selection.selected)?.id.clone();
                Some(self.begin(RequestKind::Revenue(user_id)))
            }
            KeyCode::Char('r') if listing || failed => Some(self.begin(RequestKind::Users)),
            KeyCode::Esc | KeyCode::Backspace if can_go_back => {
                self.back_to_list();
                None
            }
            _ => None,
        }
    }

    /// Track the terminal height so list scrolling matches what is drawn
    pub fn resize(&mut self, height: u16) {
        self.list_rows = user_list::visible_rows(height);
        self.selection.clamp(self.users.len(), self.list_rows);
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let AppState::Loading {
            spinner_frame,
            stage,
        } = &self.state
        {
            self.state = AppState::Loading {
                spinner_frame: Spinner::next_frame(*spinner_frame),
                stage: *stage,
            };
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Draw the application
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        if area.height < 3 {
            return;
        }
        let y = area.y + area.height / 2;
        let text = format!("Error: {}", message);
        let x = area.x + (area.width.saturating_sub(text.chars().count() as u16)) / 2;
        buf.set_stringn(
            x,
            y,
            &text,
            area.width as usize,
            Style::default()
                .fg(self.theme.error())
                .add_modifier(Modifier::BOLD),
        );

        let hint = "r reload users  Esc back  q quit";
        let hint_x = area.x + (area.width.saturating_sub(hint.len() as u16)) / 2;
        buf.set_stringn(
            hint_x,
            y + 1,
            hint,
            area.width as usize,
            Style::default().fg(self.theme.muted()),
        );
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::Loading {
                spinner_frame,
                stage,
            } => {
                Spinner::new(*spinner_frame, *stage, self.theme).render(area, buf);
            }
            AppState::UserList => {
                UserListView::new(&self.users, self.selection, self.theme).render(area, buf);
            }
            AppState::Chart { report, user_label } => {
                RevenueChart::new(report, user_label, self.theme).render(area, buf);
            }
            AppState::Error { message } => self.render_error(message, area, buf),
        }

        if self.show_help {
            let popup_area = HelpPopup::centered_area(area);
            HelpPopup::new(self.theme).render(popup_area, buf);
        }
    }
}

/// Run the TUI application
pub fn run(config: Config) -> anyhow::Result<()> {
    let gateway = HttpGateway::new(config.endpoint()?)?;
    info!(endpoint = gateway.endpoint(), "starting tui");
    let loader = Arc::new(RevenueLoader::new(gateway, &config));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // Detect before raw mode
    let theme = Theme::detect();

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &runtime, loader, theme);
    ratatui::restore();
    result
}

/// Start a request on the runtime; its result comes back over `tx`
fn dispatch(
    runtime: &Runtime,
    loader: &Arc<RevenueLoader<HttpGateway>>,
    tx: &mpsc::Sender<LoadMessage>,
    request: Request,
) {
    let loader = Arc::clone(loader);
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = match request.kind {
            RequestKind::Users => {
                LoadResult::Users(loader.list_users().await.map_err(|e| e.to_string()))
            }
            RequestKind::Revenue(user_id) => LoadResult::Revenue(
                loader
                    .load_revenue(&user_id)
                    .await
                    .map_err(|e| e.to_string()),
            ),
        };
        // Receiver is gone once the app has quit
        let _ = tx.send(LoadMessage {
            seq: request.seq,
            result,
        });
    });
}

fn run_app(
    terminal: &mut DefaultTerminal,
    runtime: &Runtime,
    loader: Arc<RevenueLoader<HttpGateway>>,
    theme: Theme,
) -> anyhow::Result<()> {
    let mut app = App::new(theme);
    let (tx, rx) = mpsc::channel();

    dispatch(runtime, &loader, &tx, app.start());

    loop {
        app.resize(terminal.size()?.height);
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Non-blocking; stale messages are dropped by the app
        while let Ok(message) = rx.try_recv() {
            app.apply(message);
        }

        // Poll for events with 100ms timeout for spinner animation
        if event::poll(Duration::from_millis(100))? {
            if let Some(request) = app.handle_event(event::read()?) {
                dispatch(runtime, &loader, &tx, request);
            }
        } else {
            app.tick();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, DayName, RevenueTable};
    use crossterm::event::KeyEvent;
    use serde_json::json;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn users() -> Vec<User> {
        [
            json!({"id": 1, "first_name": "Ada", "last_name": "Lovelace"}),
            json!({"id": 2, "email": "bob@example.com"}),
        ]
        .iter()
        .filter_map(|v| User::from_row(v.as_object().unwrap()))
        .collect()
    }

    fn report(user_id: &str, amount: f64) -> RevenueReport {
        let mut table = RevenueTable::new();
        table.day_mut(DayName::Monday).add(Category::Calls, amount);
        RevenueReport::new(user_id, table)
    }

    /// App with the user list loaded
    fn listed_app() -> App {
        let mut app = App::new(Theme::Dark);
        let request = app.start();
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Users(Ok(users())),
        });
        app
    }

    fn render_text(app: &App) -> String {
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    // ========== startup ==========

    #[test]
    fn test_app_initial_state() {
        let app = App::new(Theme::Dark);
        assert!(matches!(
            app.state,
            AppState::Loading {
                spinner_frame: 0,
                stage: LoadingStage::Users
            }
        ));
        assert!(!app.should_quit());
    }

    #[test]
    fn test_start_requests_users() {
        let mut app = App::new(Theme::Dark);
        let request = app.start();
        assert_eq!(request.kind, RequestKind::Users);
        assert_eq!(app.pending_seq, Some(request.seq));
    }

    #[test]
    fn test_users_loaded_shows_list() {
        let app = listed_app();
        assert!(matches!(app.state, AppState::UserList));
        assert_eq!(app.users.len(), 2);
        assert!(render_text(&app).contains("Ada Lovelace"));
    }

    #[test]
    fn test_users_failure_shows_error() {
        let mut app = App::new(Theme::Dark);
        let request = app.start();
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Users(Err("transport error: refused".into())),
        });
        assert!(matches!(app.state, AppState::Error { .. }));
        assert!(render_text(&app).contains("Error: transport error: refused"));
    }

    // ========== navigation ==========

    #[test]
    fn test_quit_on_q() {
        let mut app = listed_app();
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_quit_on_ctrl_c() {
        let mut app = App::new(Theme::Dark);
        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit());
    }

    #[test]
    fn test_esc_on_list_does_not_quit() {
        let mut app = listed_app();
        assert!(app.handle_event(key(KeyCode::Esc)).is_none());
        assert!(!app.should_quit());
        assert!(matches!(app.state, AppState::UserList));
    }

    #[test]
    fn test_selection_moves() {
        let mut app = listed_app();
        app.handle_event(key(KeyCode::Down));
        assert_eq!(app.selection.selected, 1);
        app.handle_event(key(KeyCode::Char('j')));
        assert_eq!(app.selection.selected, 1);
        app.handle_event(key(KeyCode::Char('k')));
        assert_eq!(app.selection.selected, 0);
    }

    #[test]
    fn test_enter_requests_selected_user() {
        let mut app = listed_app();
        app.handle_event(key(KeyCode::Down));
        let request = app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(request.kind, RequestKind::Revenue(UserId::parse("2")));
        assert!(matches!(
            app.state,
            AppState::Loading {
                stage: LoadingStage::Revenue,
                ..
            }
        ));
    }

    #[test]
    fn test_enter_on_empty_list_does_nothing() {
        let mut app = App::new(Theme::Dark);
        let request = app.start();
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Users(Ok(Vec::new())),
        });
        assert!(app.handle_event(key(KeyCode::Enter)).is_none());
        assert!(matches!(app.state, AppState::UserList));
    }

    #[test]
    fn test_reload_users() {
        let mut app = listed_app();
        let request = app.handle_event(key(KeyCode::Char('r'))).unwrap();
        assert_eq!(request.kind, RequestKind::Users);
    }

    #[test]
    fn test_help_toggle() {
        let mut app = listed_app();
        app.handle_event(key(KeyCode::Char('?')));
        assert!(app.show_help);
        assert!(render_text(&app).contains("Press ? to close"));

        app.handle_event(key(KeyCode::Esc));
        assert!(!app.show_help);
        assert!(matches!(app.state, AppState::UserList));
    }

    // ========== chart lifecycle ==========

    #[test]
    fn test_chart_shown_for_current_request() {
        let mut app = listed_app();
        let request = app.handle_event(key(KeyCode::Enter)).unwrap();
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Revenue(Ok(report("1", 70.0))),
        });

        match &app.state {
            AppState::Chart { report, user_label } => {
                assert_eq!(report.user_id, "1");
                assert_eq!(user_label, "Ada Lovelace");
            }
            _ => panic!("expected chart"),
        }
    }

    #[test]
    fn test_esc_drops_chart() {
        let mut app = listed_app();
        let request = app.handle_event(key(KeyCode::Enter)).unwrap();
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Revenue(Ok(report("1", 70.0))),
        });

        app.handle_event(key(KeyCode::Esc));
        assert!(matches!(app.state, AppState::UserList));
    }

    #[test]
    fn test_abandoned_request_result_is_discarded() {
        let mut app = listed_app();
        let request = app.handle_event(key(KeyCode::Enter)).unwrap();

        // Navigate away before the fetch completes
        app.handle_event(key(KeyCode::Backspace));
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Revenue(Ok(report("1", 70.0))),
        });

        assert!(matches!(app.state, AppState::UserList));
    }

    #[test]
    fn test_superseded_request_result_is_discarded() {
        let mut app = listed_app();
        let first = app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(key(KeyCode::Esc));
        app.handle_event(key(KeyCode::Down));
        let second = app.handle_event(key(KeyCode::Enter)).unwrap();
        assert!(second.seq > first.seq);

        app.apply(LoadMessage {
            seq: first.seq,
            result: LoadResult::Revenue(Ok(report("1", 10.0))),
        });
        assert!(matches!(app.state, AppState::Loading { .. }));

        app.apply(LoadMessage {
            seq: second.seq,
            result: LoadResult::Revenue(Ok(report("2", 20.0))),
        });
        match &app.state {
            AppState::Chart { report, .. } => assert_eq!(report.user_id, "2"),
            _ => panic!("expected chart for second user"),
        }
    }

    #[test]
    fn test_revenue_failure_shows_error_then_back() {
        let mut app = listed_app();
        let request = app.handle_event(key(KeyCode::Enter)).unwrap();
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Revenue(Err("transport error: timed out".into())),
        });
        assert!(matches!(app.state, AppState::Error { .. }));

        app.handle_event(key(KeyCode::Esc));
        assert!(matches!(app.state, AppState::UserList));
        assert_eq!(app.users.len(), 2);
    }

    #[test]
    fn test_short_terminal_keeps_selection_on_screen() {
        let mut app = App::new(Theme::Dark);
        let request = app.start();
        let many: Vec<User> = (0..30)
            .filter_map(|i| User::from_row(json!({"id": i}).as_object().unwrap()))
            .collect();
        app.apply(LoadMessage {
            seq: request.seq,
            result: LoadResult::Users(Ok(many)),
        });

        app.resize(12);
        for _ in 0..10 {
            app.handle_event(key(KeyCode::Down));
        }
        assert_eq!(app.selection.selected, 10);
        assert_eq!(app.selection.scroll_offset, 5);

        let area = Rect::new(0, 0, 100, 12);
        let mut buf = Buffer::empty(area);
        (&app).render(area, &mut buf);
        let content: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(content.contains("▸ 10"));
    }

    #[test]
    fn test_tick_updates_spinner() {
        let mut app = App::new(Theme::Dark);
        app.tick();
        assert!(matches!(
            app.state,
            AppState::Loading {
                spinner_frame: 1,
                ..
            }
        ));
    }
}
