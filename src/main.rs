use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::{error, info, warn};

use xg_terminal::config::{AppConfig, app_cache_dir};
use xg_terminal::dashboard::{
    ContentBlock, DashboardState, FORM_FIELDS, Key, Page, PredictionOutcome, input_rows,
    missing_assets, page_content,
};
use xg_terminal::logging;
use xg_terminal::predictor::XgPredictor;

struct App {
    state: DashboardState,
    predictor: Option<XgPredictor>,
    asset_dir: PathBuf,
}

impl App {
    fn new(cfg: &AppConfig) -> Self {
        let (predictor, model_error) = match XgPredictor::load(&cfg.artifact_dir) {
            Ok(p) => (Some(p), None),
            Err(err) => {
                error!(%err, "xg artifacts unavailable");
                (None, Some(err.to_string()))
            }
        };

        let mut state = DashboardState::new(model_error.clone());
        match model_error {
            Some(err) => state.push_log(format!("[ERROR] {err}")),
            None => state.push_log("[INFO] Model and preprocessor loaded"),
        }
        let missing = missing_assets(&cfg.asset_dir);
        if !missing.is_empty() {
            warn!(count = missing.len(), dir = %cfg.asset_dir.display(), "figure assets missing");
            state.push_log(format!(
                "[WARN] {} figure assets not found in {}",
                missing.len(),
                cfg.asset_dir.display()
            ));
        }

        Self {
            state,
            predictor,
            asset_dir: cfg.asset_dir.clone(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if let Some(key) = map_key(key) {
            self.state.on_key(key, self.predictor.as_ref());
        }
    }
}

fn map_key(key: KeyEvent) -> Option<Key> {
    Some(match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Esc => Key::Esc,
        _ => return None,
    })
}

fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::load();
    if let Some(dir) = app_cache_dir()
        && let Err(err) = logging::init_file_logging(&dir.join("xg_terminal.log"))
    {
        eprintln!("[WARN] file logging disabled: {err}");
    }
    info!(artifacts = %cfg.artifact_dir.display(), "starting dashboard");

    let mut app = App::new(&cfg);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if app.state.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    frame.render_widget(nav_bar(&app.state), chunks[0]);
    render_page(frame, chunks[1], app);
    render_log(frame, chunks[2], &app.state);

    let footer = Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);
}

fn nav_bar(state: &DashboardState) -> Paragraph<'static> {
    let mut spans = vec![Span::styled(
        " Football Dashboard ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (idx, page) in Page::ALL.iter().enumerate() {
        let style = if *page == state.page {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else {
            Style::default()
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!("{} {}", idx + 1, page.label()), style));
    }
    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM))
}

fn footer_text(state: &DashboardState) -> &'static str {
    match state.page {
        Page::XgPrediction => {
            "Tab Next page | ↑/↓ Field | ←/→ Option | type Numbers | Enter Predict | Esc Quit"
        }
        _ => "Tab/1-5 Page | j/k/↑/↓ Scroll | q Quit",
    }
}

// Page router: the current page lives in `DashboardState`, nowhere else.
fn render_page(frame: &mut Frame, area: Rect, app: &App) {
    match app.state.page {
        Page::XgPrediction => render_xg_form(frame, area, &app.state),
        page => render_static_page(frame, area, page, app),
    }
}

fn render_static_page(frame: &mut Frame, area: Rect, page: Page, app: &App) {
    let content = page_content(page);
    let mut lines: Vec<Line> = Vec::new();
    if let Some(subtitle) = content.subtitle {
        lines.push(Line::styled(subtitle, Style::default().fg(Color::Cyan)));
        lines.push(Line::raw(""));
    }
    for block in content.blocks {
        match block {
            ContentBlock::Heading(text) => {
                lines.push(Line::styled(
                    text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            }
            ContentBlock::Text(text) => {
                lines.push(Line::raw(text));
                lines.push(Line::raw(""));
            }
            ContentBlock::Figure(fig) => {
                lines.push(Line::styled(
                    format!("▸ {}", fig.heading),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                let path = app.asset_dir.join(fig.asset);
                if path.exists() {
                    lines.push(Line::raw(format!("  [{}] {}", path.display(), fig.caption)));
                } else {
                    lines.push(Line::styled(
                        format!("  figure not found: {}", path.display()),
                        Style::default().fg(Color::Yellow),
                    ));
                }
            }
        }
    }

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.state.scroll, 0))
        .block(Block::default().title(content.title).borders(Borders::ALL));
    frame.render_widget(body, area);
}

fn render_xg_form(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(FORM_FIELDS as u16 + 2), Constraint::Min(3)])
        .split(area);

    let form = &state.form;
    let lines: Vec<Line> = (0..FORM_FIELDS)
        .map(|field| {
            let focused = field == form.focus;
            let marker = if focused { "> " } else { "  " };
            let value = if form.is_text_field(field) {
                form.value(field)
            } else {
                format!("< {} >", form.value(field))
            };
            let style = if focused {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::styled(format!("{marker}{:<30} {value}", form.label(field)), style)
        })
        .collect();
    let title = page_content(Page::XgPrediction).title;
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        sections[0],
    );

    let (text, color) = match (&state.outcome, &state.model_error) {
        (Some(PredictionOutcome::Value(v)), _) => (format!("Predicted XG: {v:.4}"), Color::Green),
        (Some(PredictionOutcome::Error(e)), _) => {
            (format!("An error occurred during prediction: {e}"), Color::Red)
        }
        (None, Some(err)) => (format!("Model unavailable: {err}"), Color::Red),
        (None, None) => ("Press Enter to predict".to_string(), Color::DarkGray),
    };
    let result = Paragraph::new(text)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Result").borders(Borders::ALL));

    let Some(input) = &state.submitted else {
        frame.render_widget(result, sections[1]);
        return;
    };
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(sections[1]);
    let echoed: Vec<Line> = input_rows(input)
        .into_iter()
        .map(|(name, value)| Line::raw(format!("{name:<16} {value}")))
        .collect();
    frame.render_widget(
        Paragraph::new(echoed).block(Block::default().title("Input Data").borders(Borders::ALL)),
        halves[0],
    );
    frame.render_widget(result, halves[1]);
}

fn render_log(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let visible = area.height.saturating_sub(1) as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|l| Line::raw(l.clone()))
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP).title("Log")),
        area,
    );
}
