use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
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
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use footy_terminal::feed;
use footy_terminal::model::{self, Prediction};
use footy_terminal::state::{self, AppState, PredictionCard, ProviderCommand, apply_delta};

const HOME_ADVANTAGE_STEP: f64 = 0.01;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input_active {
            self.on_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') | KeyCode::Char('i') => {
                self.state.input_active = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('e') => self.state.show_explain = !self.state.show_explain,
            KeyCode::Char('p') => {
                if self.cmd_tx.send(ProviderCommand::CycleProvider).is_err() {
                    self.state.push_log("[WARN] Provider switch request failed");
                }
            }
            KeyCode::Char('r') => self.request_selected_refresh(),
            KeyCode::Char('R') => {
                let ha = self.state.home_advantage;
                if self
                    .cmd_tx
                    .send(ProviderCommand::RefreshAll { home_advantage: ha })
                    .is_err()
                {
                    self.state.push_log("[WARN] Refresh request failed");
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_home_advantage(HOME_ADVANTAGE_STEP),
            KeyCode::Char('-') => self.nudge_home_advantage(-HOME_ADVANTAGE_STEP),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.state.input_active = false;
                self.request_prediction();
            }
            KeyCode::Esc => self.state.input_active = false,
            KeyCode::Backspace => {
                self.state.input_buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_alphanumeric() || c == '-' || c == '_' => {
                if self.state.input_buffer.len() < 32 {
                    self.state.input_buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn request_prediction(&mut self) {
        let match_id = self.state.input_buffer.trim().to_string();
        if match_id.is_empty() {
            self.state.push_log("[INFO] Enter a match id first");
            return;
        }
        let ha = self.state.home_advantage;
        if self
            .cmd_tx
            .send(ProviderCommand::Predict {
                match_id: match_id.clone(),
                home_advantage: ha,
            })
            .is_err()
        {
            self.state.push_log("[WARN] Prediction request failed");
        } else {
            self.state.push_log(format!("[INFO] Requested prediction for {match_id}"));
        }
    }

    fn request_selected_refresh(&mut self) {
        let Some(card) = self.state.selected_card() else {
            self.state.push_log("[INFO] No match selected");
            return;
        };
        let match_id = card.match_id.clone();
        let ha = self.state.home_advantage;
        if self
            .cmd_tx
            .send(ProviderCommand::Predict {
                match_id,
                home_advantage: ha,
            })
            .is_err()
        {
            self.state.push_log("[WARN] Refresh request failed");
        }
    }

    // Home advantage only shifts the pure model, so the selected card can be
    // recomputed in place without touching the network.
    fn nudge_home_advantage(&mut self, step: f64) {
        let ha = (self.state.home_advantage + step).clamp(0.0, model::HOME_ADVANTAGE_MAX);
        self.state.home_advantage = ha;

        let outcome = match self.state.selected_card_mut() {
            Some(card) => {
                card.input.home_advantage = ha;
                model::predict(&card.input).map(|prediction| card.prediction = prediction)
            }
            None => return,
        };
        match outcome {
            Ok(()) => self
                .state
                .push_log(format!("[INFO] Home advantage set to {ha:.2}")),
            Err(err) => self.state.push_log(format!("[WARN] {err:#}")),
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(tx, cmd_rx);

    let mut app = App::new(cmd_tx);
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
            apply_delta(&mut app.state, delta);
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
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], &app.state);
    render_body(frame, chunks[1], &app.state);
    render_console(frame, chunks[2], &app.state);
    render_footer(frame, chunks[3], &app.state);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let loading = if state.loading { "  [fetching...]" } else { "" };
    let cursor = if state.input_active { "_" } else { "" };
    let text = format!(
        "FOOTY TERMINAL  •  provider: {}  •  home adv: {:.2}{}\nmatch id > {}{}",
        if state.provider_label.is_empty() {
            "starting"
        } else {
            state.provider_label.as_str()
        },
        state.home_advantage,
        loading,
        state.input_buffer,
        cursor,
    );
    let header = Paragraph::new(text).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn render_body(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(area);

    render_card_list(frame, columns[0], state);
    render_detail(frame, columns[1], state);
}

fn render_card_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Predictions").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.cards.is_empty() {
        let empty = Paragraph::new("No predictions yet.\nType a match id and press Enter.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let visible = (inner.height as usize) / 2;
    let (start, end) = visible_range(state.selected, state.cards.len(), visible.max(1));

    for (offset, card) in state.cards[start..end].iter().enumerate() {
        let idx = start + offset;
        let y = inner.y + offset as u16 * 2;
        if y + 1 >= inner.y + inner.height {
            break;
        }
        let selected = idx == state.selected;
        let marker = if selected { ">" } else { " " };
        let title = format!(
            "{marker} {} vs {}",
            card.context.home_team_name, card.context.away_team_name
        );
        let probs = format!(
            "   H {:>4.1}%  D {:>4.1}%  A {:>4.1}%",
            card.prediction.home_win * 100.0,
            card.prediction.draw * 100.0,
            card.prediction.away_win * 100.0
        );
        let mut style = Style::default();
        if selected {
            style = style.add_modifier(Modifier::BOLD).fg(Color::Cyan);
        }
        let line_area = Rect::new(inner.x, y, inner.width, 1);
        frame.render_widget(Paragraph::new(title).style(style), line_area);
        let prob_area = Rect::new(inner.x, y + 1, inner.width, 1);
        frame.render_widget(
            Paragraph::new(probs).style(Style::default().fg(Color::Gray)),
            prob_area,
        );
    }
}

fn render_detail(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Match").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(card) = state.selected_card() else {
        let hint = Paragraph::new("Select a prediction to inspect it.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(4),
        ])
        .split(inner);

    render_context_lines(frame, rows[0], card);
    render_probability(frame, rows[1], &card.prediction);
    if state.show_explain {
        render_explain(frame, rows[2], card);
    } else {
        render_indicators(frame, rows[2], card);
    }
}

fn render_context_lines(frame: &mut Frame, area: Rect, card: &PredictionCard) {
    let ctx = &card.context;
    let venue = ctx
        .venue
        .as_deref()
        .map(|v| format!(" • {v}"))
        .unwrap_or_default();
    let age = card
        .fetched_at
        .elapsed()
        .map(|d| format!("{}s ago", d.as_secs()))
        .unwrap_or_else(|_| "just now".to_string());
    let text = format!(
        "{} vs {}\n{} • {}{}\nkickoff {} • via {} • {}",
        ctx.home_team_name,
        ctx.away_team_name,
        ctx.competition,
        ctx.season,
        venue,
        format_kickoff(&ctx.utc_kickoff),
        card.provider,
        age,
    );
    frame.render_widget(Paragraph::new(text), area);
}

fn render_probability(frame: &mut Frame, area: Rect, prediction: &Prediction) {
    let label = format!(
        "HOME {:>5.1}%   DRAW {:>5.1}%   AWAY {:>5.1}%",
        prediction.home_win * 100.0,
        prediction.draw * 100.0,
        prediction.away_win * 100.0
    );
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);
    frame.render_widget(
        Paragraph::new(label).style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );
    frame.render_widget(outcome_bar_chart(prediction), rows[1]);
}

fn outcome_bar_chart(prediction: &Prediction) -> BarChart<'static> {
    let home = Bar::default()
        .value((prediction.home_win * 100.0).round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Green));
    let draw = Bar::default()
        .value((prediction.draw * 100.0).round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Yellow));
    let away = Bar::default()
        .value((prediction.away_win * 100.0).round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[home, draw, away]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

fn render_indicators(frame: &mut Frame, area: Rect, card: &PredictionCard) {
    let input = &card.input;
    let ctx = &card.context;
    let text = format!(
        "{} form: {}   pos: {}   cards: {}   out: {}\n{} form: {}   pos: {}   cards: {}   out: {}\nhome advantage: {:.2}   (e: explain, +/-: adjust)",
        ctx.home_team_name,
        form_string(&input.home.form),
        position_string(input.home.position),
        cards_string(input.home.cards),
        input.home.key_starters_out,
        ctx.away_team_name,
        form_string(&input.away.form),
        position_string(input.away.position),
        cards_string(input.away.cards),
        input.away.key_starters_out,
        input.home_advantage,
    );
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title("Indicators").borders(Borders::TOP)),
        area,
    );
}

fn render_explain(frame: &mut Frame, area: Rect, card: &PredictionCard) {
    let explain = &card.prediction.explain;
    let text = format!(
        "home strength: {:.4}\naway strength: {:.4}\nblend: 0.6 x form + 0.4 x position, then discipline and injury multipliers\ndistribution: softmax over (home + adv, draw bias x mean, away), clamped and renormalized",
        explain.home_strength, explain.away_strength,
    );
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title("Why these numbers").borders(Borders::TOP)),
        area,
    );
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let text = state
        .logs
        .iter()
        .rev()
        .take(visible.max(1))
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text).block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let hint = if state.input_active {
        " typing match id   Enter: predict   Esc: cancel"
    } else {
        " /:match id  j/k:select  e:explain  p:provider  r/R:refresh  +/-:home adv  ?:help  q:quit"
    };
    frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Footy Terminal - Help",
        "",
        "Global:",
        "  / or i       Edit match id",
        "  Enter        Predict (while editing)",
        "  j/k or ↑/↓   Select prediction",
        "  e            Toggle explain panel",
        "  p            Cycle provider",
        "  r            Refresh selected match",
        "  R            Refresh all matches",
        "  + / -        Adjust home advantage",
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

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn form_string(form: &[model::FormResult]) -> String {
    if form.is_empty() {
        return "n/a".to_string();
    }
    form.iter()
        .map(|r| r.as_char().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn position_string(position: Option<u32>) -> String {
    position
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn cards_string(cards: Option<model::CardRates>) -> String {
    match cards {
        Some(c) => format!("{:.1}y/{:.2}r", c.yellow_per_match, c.red_per_match),
        None => "n/a".to_string(),
    }
}

fn format_kickoff(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "TBD".to_string();
    }
    let cleaned = raw.trim().trim_end_matches('Z');
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return format!("{} UTC", dt.format("%Y-%m-%d %H:%M"));
        }
    }
    cleaned.replace('T', " ")
}
