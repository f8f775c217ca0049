#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use tokio::sync::watch;

use crate::profile::{Profile, ProfileDirectory};
use crate::session::{SessionId, SessionManager};
use crate::store::StoreClient;
use crate::task::directory::TaskDirectory;
use crate::task::filter::{self, StatusFilter};
use crate::task::model::{Priority, Task, TaskStatus};
use crate::tui;

// Brief branding splash; it stays up indefinitely when sign-in failed.
const MIN_SPLASH: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Splash,
    Picker,
    Board,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Compose,
    AddProfile,
    Confirm,
}

#[derive(Debug, Clone, Copy)]
struct Theme {
    fg: Color,
    dim: Color,
    accent: Color,
    highlight_fg: Color,
    highlight_bg: Color,
    pending: Color,
    doing: Color,
    done: Color,
    bar_bg: Color,
}

impl Theme {
    const LIGHT: Theme = Theme {
        fg: Color::Black,
        dim: Color::DarkGray,
        accent: Color::Blue,
        highlight_fg: Color::White,
        highlight_bg: Color::Blue,
        pending: Color::DarkGray,
        doing: Color::Blue,
        done: Color::Green,
        bar_bg: Color::Blue,
    };

    const DARK: Theme = Theme {
        fg: Color::White,
        dim: Color::DarkGray,
        accent: Color::LightBlue,
        highlight_fg: Color::Black,
        highlight_bg: Color::LightBlue,
        pending: Color::Gray,
        doing: Color::LightBlue,
        done: Color::LightGreen,
        bar_bg: Color::Blue,
    };

    fn for_mode(dark: bool) -> Self {
        if dark { Self::DARK } else { Self::LIGHT }
    }

    fn status_color(self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.doing,
            TaskStatus::Done => self.done,
        }
    }

    fn priority_color(self, priority: Priority) -> Color {
        match priority {
            Priority::Low => self.dim,
            Priority::Medium => Color::Yellow,
            Priority::High => Color::Red,
        }
    }
}

#[derive(Debug, Clone)]
struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
        }
    }

    fn as_str(&self) -> &str {
        &self.text
    }

    fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn insert_char(&mut self, c: char) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        chars.insert(cur, c);
        self.text = chars.into_iter().collect();
        self.cursor = cur + 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur == 0 {
            return;
        }
        chars.remove(cur - 1);
        self.text = chars.into_iter().collect();
        self.cursor = cur - 1;
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        let len = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(len);
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    until: Instant,
}

impl Toast {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            until: Instant::now() + Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
struct ConfirmDelete {
    id: String,
    text: String,
}

struct AppState {
    cfg: crate::config::Config,
    store: StoreClient,
    profiles_dir: ProfileDirectory,
    tasks_dir: TaskDirectory,

    screen: Screen,
    mode: Mode,
    dark_mode: bool,

    session: Option<SessionId>,
    session_rx: watch::Receiver<Option<SessionId>>,
    splash_since: Instant,

    profiles: Vec<Profile>,
    profiles_rx: watch::Receiver<Vec<Profile>>,
    picker_state: TableState,
    profile_input: TextInput,

    active_profile: Option<String>,
    owner_tasks: Vec<Task>,
    tasks_rx: Option<watch::Receiver<Vec<Task>>>,
    task_state: TableState,
    filter: StatusFilter,

    composer: TextInput,
    composer_priority: Priority,
    confirm: Option<ConfirmDelete>,

    toast: Option<Toast>,
    last_error: Option<String>,
    last_refresh: Instant,
    should_quit: bool,
}

impl AppState {
    fn new(cfg: crate::config::Config, store: StoreClient, sessions: &SessionManager) -> Self {
        let session_rx = sessions.subscribe();
        let session = sessions.current();

        let profiles_dir = ProfileDirectory::new(&store);
        let profiles_rx = profiles_dir.subscribe();
        let profiles = profiles_rx.borrow().clone();

        let tasks_dir = TaskDirectory::new(&store, sessions.subscribe());

        let mut picker_state = TableState::default();
        picker_state.select(Some(0));
        let mut task_state = TableState::default();
        task_state.select(Some(0));

        let dark_mode = cfg.ui.dark_mode;

        Self {
            cfg,
            store,
            profiles_dir,
            tasks_dir,
            screen: Screen::Splash,
            mode: Mode::Normal,
            dark_mode,
            session,
            session_rx,
            splash_since: Instant::now(),
            profiles,
            profiles_rx,
            picker_state,
            profile_input: TextInput::new(),
            active_profile: None,
            owner_tasks: Vec::new(),
            tasks_rx: None,
            task_state,
            filter: StatusFilter::All,
            composer: TextInput::new(),
            composer_priority: Priority::Medium,
            confirm: None,
            toast: None,
            last_error: None,
            last_refresh: Instant::now(),
            should_quit: false,
        }
    }

    fn absorb_updates(&mut self) {
        if self.session_rx.has_changed().unwrap_or(false) {
            self.session = self.session_rx.borrow_and_update().clone();
        }
        if self.profiles_rx.has_changed().unwrap_or(false) {
            self.profiles = self.profiles_rx.borrow_and_update().clone();
            self.clamp_picker_selection();
        }
        if let Some(rx) = self.tasks_rx.as_mut()
            && rx.has_changed().unwrap_or(false)
        {
            self.owner_tasks = rx.borrow_and_update().clone();
            self.clamp_task_selection();
        }
    }

    fn maybe_leave_splash(&mut self) {
        if self.screen == Screen::Splash
            && self.session.is_some()
            && self.splash_since.elapsed() >= MIN_SPLASH
        {
            self.screen = Screen::Picker;
        }
    }

    fn maybe_refresh_store(&mut self) {
        let interval = Duration::from_millis(self.cfg.ui.refresh_interval_ms.max(100));
        if self.last_refresh.elapsed() < interval {
            return;
        }
        if let Err(e) = self.store.refresh() {
            tracing::error!(error = %e, "store refresh failed");
            self.last_error = Some(e.to_string());
        } else {
            self.last_error = None;
        }
        self.last_refresh = Instant::now();
    }

    fn expire_toast(&mut self) {
        if let Some(toast) = &self.toast
            && Instant::now() >= toast.until
        {
            self.toast = None;
        }
    }

    fn enter_board(&mut self, profile: String) {
        let rx = self.tasks_dir.subscribe(&profile);
        self.owner_tasks = rx.borrow().clone();
        self.tasks_rx = Some(rx);
        self.active_profile = Some(profile);
        self.filter = StatusFilter::All;
        self.task_state.select(Some(0));
        self.screen = Screen::Board;
    }

    // Dropping the receiver releases the owner subscription.
    fn leave_board(&mut self) {
        self.tasks_rx = None;
        self.owner_tasks.clear();
        self.active_profile = None;
        self.composer.clear();
        self.screen = Screen::Picker;
    }

    fn visible_tasks(&self) -> Vec<Task> {
        filter::apply_filter(&self.owner_tasks, self.filter)
    }

    fn selected_task(&self) -> Option<Task> {
        let visible = self.visible_tasks();
        if visible.is_empty() {
            return None;
        }
        let idx = self.task_state.selected().unwrap_or(0).min(visible.len() - 1);
        visible.into_iter().nth(idx)
    }

    fn clamp_picker_selection(&mut self) {
        if self.profiles.is_empty() {
            self.picker_state.select(Some(0));
            return;
        }
        let idx = self
            .picker_state
            .selected()
            .unwrap_or(0)
            .min(self.profiles.len() - 1);
        self.picker_state.select(Some(idx));
    }

    fn move_picker_selection(&mut self, delta: i64) {
        if self.profiles.is_empty() {
            return;
        }
        let cur = i64::try_from(self.picker_state.selected().unwrap_or(0)).unwrap_or(0);
        let max = i64::try_from(self.profiles.len().saturating_sub(1)).unwrap_or(0);
        let next = (cur + delta).clamp(0, max);
        self.picker_state.select(Some(usize::try_from(next).unwrap_or(0)));
    }

    fn clamp_task_selection(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.task_state.select(Some(0));
            return;
        }
        let idx = self.task_state.selected().unwrap_or(0).min(len - 1);
        self.task_state.select(Some(idx));
    }

    fn move_task_selection(&mut self, delta: i64) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let cur = i64::try_from(self.task_state.selected().unwrap_or(0)).unwrap_or(0);
        let max = i64::try_from(len.saturating_sub(1)).unwrap_or(0);
        let next = (cur + delta).clamp(0, max);
        self.task_state.select(Some(usize::try_from(next).unwrap_or(0)));
    }

    fn report_error(&mut self, what: &str, err: &anyhow::Error) {
        tracing::error!(error = %err, "{what}");
        self.last_error = Some(format!("{what}: {err}"));
    }
}

struct TerminalGuard {
    terminal: Option<ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>>,
}

impl TerminalGuard {
    fn new(
        terminal: ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> Self {
        Self {
            terminal: Some(terminal),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = tui::restore_terminal(terminal);
        }
    }
}

pub async fn run(
    cfg: crate::config::Config,
    store: StoreClient,
    sessions: &SessionManager,
) -> anyhow::Result<()> {
    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard::new(terminal);

    let mut app = AppState::new(cfg, store, sessions);

    loop {
        app.expire_toast();
        app.absorb_updates();
        app.maybe_leave_splash();
        app.maybe_refresh_store();

        {
            let Some(terminal) = guard.terminal.as_mut() else {
                anyhow::bail!("terminal unavailable");
            };
            terminal.draw(|f| draw(f, &mut app))?;
        }

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
        {
            handle_key(key, &mut app);
        }
    }

    Ok(())
}

fn handle_key(key: KeyEvent, app: &mut AppState) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        app.should_quit = true;
        return;
    }

    // Modals take precedence
    if app.confirm.is_some() {
        app.mode = Mode::Confirm;
        handle_confirm_key(key, app);
        return;
    }

    match app.mode {
        Mode::Confirm => {
            app.mode = Mode::Normal;
        }
        Mode::Compose => handle_compose_key(key, app),
        Mode::AddProfile => handle_add_profile_key(key, app),
        Mode::Normal => match app.screen {
            Screen::Splash => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    app.should_quit = true;
                }
            }
            Screen::Picker => handle_picker_key(key, app),
            Screen::Board => handle_board_key(key, app),
        },
    }
}

fn handle_picker_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('t') => app.dark_mode = !app.dark_mode,
        KeyCode::Char('j') | KeyCode::Down => app.move_picker_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_picker_selection(-1),
        KeyCode::Char('a') => {
            app.profile_input.clear();
            app.mode = Mode::AddProfile;
        }
        KeyCode::Enter => {
            let idx = app.picker_state.selected().unwrap_or(0);
            if let Some(profile) = app.profiles.get(idx) {
                let name = profile.name.clone();
                app.enter_board(name);
            }
        }
        _ => {}
    }
}

fn handle_add_profile_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Esc => app.mode = Mode::Normal,
        KeyCode::Enter => {
            match app.profiles_dir.create(app.profile_input.as_str()) {
                Ok(Some(profile)) => {
                    app.toast = Some(Toast::info(format!("Added {}", profile.name)));
                }
                Ok(None) => {
                    app.toast = Some(Toast::info("Nothing added"));
                }
                Err(e) => app.report_error("failed to add profile", &e),
            }
            app.profile_input.clear();
            app.mode = Mode::Normal;
        }
        KeyCode::Backspace => app.profile_input.backspace(),
        KeyCode::Left => app.profile_input.move_left(),
        KeyCode::Right => app.profile_input.move_right(),
        KeyCode::Home => app.profile_input.move_home(),
        KeyCode::End => app.profile_input.move_end(),
        KeyCode::Char(c) => app.profile_input.insert_char(c),
        _ => {}
    }
}

fn handle_board_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('t') => app.dark_mode = !app.dark_mode,
        KeyCode::Char('L') => app.leave_board(),
        KeyCode::Char('j') | KeyCode::Down => app.move_task_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_task_selection(-1),
        KeyCode::Char('n') => {
            app.composer.clear();
            app.mode = Mode::Compose;
        }
        KeyCode::Char('f') => {
            app.filter = app.filter.next();
            app.clamp_task_selection();
        }
        KeyCode::Char(c @ '1'..='4') => {
            let idx = (c as usize) - ('1' as usize);
            app.filter = StatusFilter::ALL[idx];
            app.clamp_task_selection();
        }
        KeyCode::Char('s') | KeyCode::Enter => {
            if let Some(task) = app.selected_task() {
                match app.tasks_dir.advance(&task.id) {
                    Ok(true) => {}
                    Ok(false) => {
                        app.toast = Some(Toast::info("Already done — press r to reset"));
                    }
                    Err(e) => app.report_error("failed to update task", &e),
                }
            }
        }
        KeyCode::Char('r') => {
            if let Some(task) = app.selected_task() {
                match app.tasks_dir.reset(&task.id) {
                    Ok(true) => {}
                    Ok(false) => {
                        app.toast = Some(Toast::info("Only done tasks can be reset"));
                    }
                    Err(e) => app.report_error("failed to reset task", &e),
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(task) = app.selected_task() {
                app.confirm = Some(ConfirmDelete {
                    id: task.id,
                    text: task.text,
                });
                app.mode = Mode::Confirm;
            }
        }
        _ => {}
    }
}

fn handle_compose_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Esc => {
            app.composer.clear();
            app.mode = Mode::Normal;
        }
        KeyCode::Tab => app.composer_priority = app.composer_priority.cycle(),
        KeyCode::Enter => {
            let owner = app.active_profile.clone().unwrap_or_default();
            match app
                .tasks_dir
                .create(app.composer.as_str(), app.composer_priority, &owner)
            {
                Ok(Some(_)) => app.composer.clear(),
                Ok(None) => {
                    // Blank text or no session: silently ignored, as the
                    // composer promises.
                }
                Err(e) => app.report_error("failed to add task", &e),
            }
        }
        KeyCode::Backspace => app.composer.backspace(),
        KeyCode::Left => app.composer.move_left(),
        KeyCode::Right => app.composer.move_right(),
        KeyCode::Home => app.composer.move_home(),
        KeyCode::End => app.composer.move_end(),
        KeyCode::Char(c) => app.composer.insert_char(c),
        _ => {}
    }
}

fn handle_confirm_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('y') => {
            if let Some(confirm) = app.confirm.take() {
                match app.tasks_dir.delete(&confirm.id) {
                    Ok(()) => app.toast = Some(Toast::info("Task deleted")),
                    Err(e) => app.report_error("failed to delete task", &e),
                }
            }
            app.mode = Mode::Normal;
            app.clamp_task_selection();
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            app.confirm = None;
            app.mode = Mode::Normal;
        }
        _ => {}
    }
}

fn draw(f: &mut Frame<'_>, app: &mut AppState) {
    let theme = Theme::for_mode(app.dark_mode);
    let area = f.area();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    match app.screen {
        Screen::Splash => draw_splash(f, root[0], app, theme),
        Screen::Picker => draw_picker(f, root[0], app, theme),
        Screen::Board => draw_board(f, root[0], app, theme),
    }

    draw_footer(f, root[1], app, theme);

    if let Some(confirm) = &app.confirm {
        draw_confirm(f, confirm, theme);
    }

    if app.mode == Mode::AddProfile {
        draw_add_profile_popup(f, app, theme);
    }
}

fn draw_splash(f: &mut Frame<'_>, area: Rect, app: &AppState, theme: Theme) {
    let block = centered_rect(60, 40, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Focus Work",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if app.session.is_some() {
        lines.push(Line::from(Span::styled(
            "Signing in…",
            Style::default().fg(theme.dim),
        )));
    } else if app.splash_since.elapsed() > Duration::from_secs(3) {
        // Sign-in failed earlier; there is no retry, only the logs.
        lines.push(Line::from(Span::styled(
            "No session. Check the diagnostics log, then restart.",
            Style::default().fg(theme.dim),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Signing in…",
            Style::default().fg(theme.dim),
        )));
    }

    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(p, block);
}

fn draw_picker(f: &mut Frame<'_>, area: Rect, app: &mut AppState, theme: Theme) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "Focus Work",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  —  pick a profile or add a new one",
            Style::default().fg(theme.dim),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(title, outer[0]);

    let list_area = centered_rect(50, 70, outer[1]);

    if app.profiles.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Who is working today?");
        let inner = block.inner(list_area);
        f.render_widget(block, list_area);
        f.render_widget(
            Paragraph::new("No profiles yet. Press 'a' to add one.")
                .style(Style::default().fg(theme.dim))
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }

    let rows = app.profiles.iter().map(|p| {
        let marker = if app.cfg.ui.icons { "● " } else { "" };
        Row::new(vec![
            Cell::from(format!("{marker}{}", p.name)).style(Style::default().fg(theme.fg)),
        ])
    });

    let table = Table::new(rows, vec![Constraint::Percentage(100)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Who is working today?"),
        )
        .row_highlight_style(
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    f.render_stateful_widget(table, list_area, &mut app.picker_state);
}

#[allow(clippy::too_many_lines)]
fn draw_board(f: &mut Frame<'_>, area: Rect, app: &mut AppState, theme: Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    draw_board_header(f, rows[0], app, theme);
    draw_stats(f, rows[1], app, theme);
    draw_composer(f, rows[2], app, theme);
    draw_filter_bar(f, rows[3], app, theme);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[4]);

    draw_task_table(f, body[0], app, theme);
    draw_task_detail(f, body[1], app, theme);
}

fn draw_board_header(f: &mut Frame<'_>, area: Rect, app: &AppState, theme: Theme) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Paragraph::new(Line::from(Span::styled(
        "Focus Work",
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )));
    f.render_widget(left, chunks[0]);

    let profile = app.active_profile.as_deref().unwrap_or("-");
    let right = Paragraph::new(Line::from(vec![
        Span::styled(profile, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  [{}]", if app.dark_mode { "dark" } else { "light" }),
            Style::default().fg(theme.dim),
        ),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(right, chunks[1]);
}

fn draw_stats(f: &mut Frame<'_>, area: Rect, app: &AppState, theme: Theme) {
    let stats = filter::stats(&app.owner_tasks);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(area);

    let cells = [
        ("Pending", stats.pending, theme.pending),
        ("In Progress", stats.in_progress, theme.doing),
        ("Done", stats.done, theme.done),
    ];

    for (i, (label, count, color)) in cells.into_iter().enumerate() {
        let block = Block::default().borders(Borders::ALL).title(label);
        let inner = block.inner(chunks[i]);
        f.render_widget(block, chunks[i]);
        f.render_widget(
            Paragraph::new(Span::styled(
                count.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            inner,
        );
    }
}

fn draw_composer(f: &mut Frame<'_>, area: Rect, app: &AppState, theme: Theme) {
    let composing = app.mode == Mode::Compose;
    let border_style = if composing {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.dim)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title("New task (n)");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let placeholder = !composing && app.composer.as_str().is_empty();
    let text_span = if placeholder {
        Span::styled(
            "What needs doing today?",
            Style::default().fg(theme.dim),
        )
    } else {
        Span::styled(app.composer.as_str(), Style::default().fg(theme.fg))
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(12)])
        .split(inner);

    f.render_widget(Paragraph::new(Line::from(text_span)), chunks[0]);
    f.render_widget(
        Paragraph::new(Span::styled(
            format!("[{}]", app.composer_priority.label()),
            Style::default().fg(theme.priority_color(app.composer_priority)),
        ))
        .alignment(Alignment::Right),
        chunks[1],
    );

    if composing {
        let x = chunks[0].x + cursor_x_for_text(app.composer.as_str(), app.composer.cursor);
        f.set_cursor_position((x, chunks[0].y));
    }
}

fn draw_filter_bar(f: &mut Frame<'_>, area: Rect, app: &AppState, theme: Theme) {
    let mut spans: Vec<Span> = vec![Span::styled("Filter: ", Style::default().fg(theme.dim))];
    for (i, filter) in StatusFilter::ALL.iter().enumerate() {
        let label = format!(" {} [{}] ", filter.label(), i + 1);
        let style = if *filter == app.filter {
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_task_table(f: &mut Frame<'_>, area: Rect, app: &mut AppState, theme: Theme) {
    let visible = app.visible_tasks();

    if visible.is_empty() {
        let block = Block::default().borders(Borders::ALL).title("Tasks");
        let inner = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(
            Paragraph::new("Nothing here. Press 'n' to add a task.")
                .style(Style::default().fg(theme.dim))
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }

    let headers = Row::new(vec!["STATUS", "PRIO", "TASK", "CREATED"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = visible.iter().map(|t| {
        let status = if app.cfg.ui.icons {
            format!("{} {}", status_icon(t.status), t.status.label())
        } else {
            t.status.label().to_owned()
        };
        Row::new(vec![
            Cell::from(status).style(Style::default().fg(theme.status_color(t.status))),
            Cell::from(t.priority.label())
                .style(Style::default().fg(theme.priority_color(t.priority))),
            Cell::from(t.text.clone()).style(Style::default().fg(theme.fg)),
            Cell::from(format_created(&t.created_at)).style(Style::default().fg(theme.dim)),
        ])
    });

    let table = Table::new(
        rows,
        vec![
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Min(10),
            Constraint::Length(16),
        ],
    )
    .header(headers)
    .block(Block::default().borders(Borders::ALL).title("Tasks"))
    .row_highlight_style(
        Style::default()
            .fg(theme.highlight_fg)
            .bg(theme.highlight_bg)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");

    f.render_stateful_widget(table, area, &mut app.task_state);
}

fn draw_task_detail(f: &mut Frame<'_>, area: Rect, app: &AppState, theme: Theme) {
    let block = Block::default().borders(Borders::ALL).title("Details");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(t) = app.selected_task() else {
        f.render_widget(
            Paragraph::new("No task selected.")
                .style(Style::default().fg(theme.dim))
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    };

    let action = match t.status {
        TaskStatus::Pending => "s start",
        TaskStatus::InProgress => "s finish",
        TaskStatus::Done => "r reset",
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Task: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(t.text.clone()),
        ]),
        Line::from(format!("ID: {}", t.id)),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(t.status.label(), Style::default().fg(theme.status_color(t.status))),
        ]),
        Line::from(vec![
            Span::raw("Priority: "),
            Span::styled(
                t.priority.label(),
                Style::default().fg(theme.priority_color(t.priority)),
            ),
        ]),
        Line::from(format!("Owner: {}", t.owner)),
        Line::from(""),
        Line::from(format!("Created: {}", format_created(&t.created_at))),
        Line::from(format!(
            "Started: {}",
            t.start_time.as_deref().unwrap_or("-")
        )),
        Line::from(format!(
            "Finished: {}",
            t.end_time.as_deref().unwrap_or("-")
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{action} • d delete"),
            Style::default().fg(theme.dim),
        )),
    ];

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &AppState, theme: Theme) {
    let effective_mode = if app.confirm.is_some() {
        Mode::Confirm
    } else {
        app.mode
    };

    let mut left = match effective_mode {
        Mode::Normal => match app.screen {
            Screen::Splash => "q quit".to_owned(),
            Screen::Picker => {
                "q quit • j/k move • Enter select • a add person • t theme".to_owned()
            }
            Screen::Board => {
                "q quit • j/k move • n new • s start/finish • r reset • d delete • f/1-4 filter • t theme • L switch profile"
                    .to_owned()
            }
        },
        Mode::Compose => "Enter add • Tab priority • Esc close".to_owned(),
        Mode::AddProfile => "Enter add • Esc cancel".to_owned(),
        Mode::Confirm => "y delete • n cancel".to_owned(),
    };

    if let Some(err) = &app.last_error {
        left = format!("Error: {err}");
    } else if let Some(toast) = &app.toast {
        left.clone_from(&toast.message);
    }

    let p = Paragraph::new(Line::from(Span::styled(
        left,
        Style::default().fg(Color::White).bg(theme.bar_bg),
    )))
    .style(Style::default().bg(theme.bar_bg));
    f.render_widget(p, area);
}

fn draw_confirm(f: &mut Frame<'_>, confirm: &ConfirmDelete, theme: Theme) {
    let area = centered_rect(60, 25, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Delete task");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(format!("Delete '{}'?", confirm.text)),
        Line::from(""),
        Line::from(Span::styled(
            "[y] delete    [n] cancel",
            Style::default().fg(theme.dim),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn draw_add_profile_popup(f: &mut Frame<'_>, app: &AppState, _theme: Theme) {
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("New person");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let prefix = "Name: ";
    f.render_widget(
        Paragraph::new(Line::from(format!("{prefix}{}", app.profile_input.as_str()))),
        inner,
    );

    let prefix_len = u16::try_from(prefix.chars().count()).unwrap_or(0);
    let x = inner.x
        + prefix_len
        + cursor_x_for_text(app.profile_input.as_str(), app.profile_input.cursor);
    f.set_cursor_position((x, inner.y));
}

fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "○",
        TaskStatus::InProgress => "◐",
        TaskStatus::Done => "●",
    }
}

fn format_created(created_at: &str) -> String {
    // RFC3339 "2026-08-06T09:41:00Z" reads fine as "2026-08-06 09:41".
    let trimmed = created_at.trim_end_matches('Z');
    match trimmed.split_once('T') {
        Some((date, time)) => {
            let hhmm: String = time.chars().take(5).collect();
            format!("{date} {hhmm}")
        }
        None => created_at.to_owned(),
    }
}

fn cursor_x_for_text(text: &str, cursor: usize) -> u16 {
    let prefix: String = text.chars().take(cursor).collect();
    u16::try_from(prefix.chars().count()).unwrap_or(0)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
