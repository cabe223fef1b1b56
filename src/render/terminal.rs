//! Interactive terminal viewer.
//!
//! [`run`] is the host loop: it owns the terminal and the clock, turns key
//! presses into session events and delivers timer ticks when they are due.

use super::{piece_symbol, text_color, CellLabel, HeatmapFrame, Renderer, FILE_LABELS, RANK_LABELS};
use crate::error::RenderError;
use crate::session::{Event, HeatmapSession, Response};
use crate::timer::{Schedule, TimerId};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::{cursor, execute, terminal};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tui::backend::CrosstermBackend;
use tui::layout::{Constraint, Direction, Layout};
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

const CELL_WIDTH: usize = 6;
const CELL_HEIGHT: usize = 3;
/// Poll timeout when no timer is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);
const INTERVAL_STEP_MS: u64 = 100;

const HELP: &str =
    "←/→ step  Home/End first/last  Space play  r repeat  a rays  p pieces  c color  +/- speed  q quit";

/// Raw mode and the alternate screen, restored on drop.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// What a key press asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Session(Event),
}

pub fn key_command(key: KeyEvent, session: &HeatmapSession) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    let interval_ms = session.autoplay().interval().as_millis() as u64;
    let event = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Right | KeyCode::Char('l') => Event::Next,
        KeyCode::Left | KeyCode::Char('h') => Event::Previous,
        KeyCode::Home | KeyCode::Char('g') => Event::First,
        KeyCode::End | KeyCode::Char('G') => Event::Last,
        KeyCode::Char(' ') => Event::TogglePlay,
        KeyCode::Char('r') => Event::ToggleRepeat,
        KeyCode::Char('a') => Event::ToggleRays,
        KeyCode::Char('p') => Event::TogglePieces,
        KeyCode::Char('c') => Event::CycleRayColor,
        // faster means a shorter interval
        KeyCode::Char('+') | KeyCode::Char('=') => {
            Event::SetInterval(interval_ms.saturating_sub(INTERVAL_STEP_MS))
        }
        KeyCode::Char('-') => Event::SetInterval(interval_ms + INTERVAL_STEP_MS),
        _ => return None,
    };
    Some(Command::Session(event))
}

/// Pending timers, at most one per kind.
#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<(Instant, TimerId)>,
}

impl TimerQueue {
    pub fn arm(&mut self, now: Instant, schedule: Schedule) {
        // a newer timer of the same kind makes the old one stale
        self.pending.retain(|(_, id)| id.kind() != schedule.id.kind());
        self.pending.push((now + schedule.after, schedule.id));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time until the earliest deadline, zero if one is already due.
    pub fn next_timeout(&self, now: Instant) -> Option<Duration> {
        self.pending
            .iter()
            .map(|(deadline, _)| deadline.saturating_duration_since(now))
            .min()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerId> {
        let mut due: Vec<(Instant, TimerId)> = Vec::new();
        self.pending.retain(|&(deadline, id)| {
            if deadline <= now {
                due.push((deadline, id));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(deadline, _)| *deadline);
        due.into_iter().map(|(_, id)| id).collect()
    }
}

/// Board, status line and key help drawn with tui widgets.
pub struct TerminalRenderer<W: Write> {
    terminal: Terminal<CrosstermBackend<W>>,
    status: String,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(writer: W) -> io::Result<Self> {
        let mut terminal = Terminal::new(CrosstermBackend::new(writer))?;
        terminal.clear()?;
        Ok(TerminalRenderer {
            terminal,
            status: String::new(),
        })
    }

    /// Text shown under the board on the next draw.
    pub fn set_status(&mut self, status: String) {
        self.status = status;
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    type Error = RenderError;

    fn draw(&mut self, frame: &HeatmapFrame) -> Result<(), RenderError> {
        let board = board_lines(frame);
        let status = self.status.clone();
        self.terminal.draw(|f| {
            let board_height = (8 * CELL_HEIGHT + 1 + 2) as u16;
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(board_height),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(0),
                ])
                .split(f.size());

            let title = Span::styled(
                frame.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            );
            let board_widget =
                Paragraph::new(board).block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(board_widget, chunks[0]);
            f.render_widget(Paragraph::new(status), chunks[1]);
            f.render_widget(
                Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
                chunks[2],
            );
        })?;
        Ok(())
    }
}

fn rgb(c: [u8; 3]) -> Color {
    Color::Rgb(c[0], c[1], c[2])
}

fn cell_text(label: CellLabel) -> String {
    match label {
        CellLabel::Empty => String::new(),
        CellLabel::Piece(piece) => piece_symbol(piece).to_string(),
        CellLabel::Value(value) => value.to_string(),
    }
}

/// Text lines of the board: `CELL_HEIGHT` lines per rank, then the file letters.
pub fn board_lines(frame: &HeatmapFrame) -> Vec<Spans<'static>> {
    let blank = " ".repeat(CELL_WIDTH);
    let mut lines = Vec::with_capacity(8 * CELL_HEIGHT + 1);
    for row in 0..8 {
        for line in 0..CELL_HEIGHT {
            let middle = line == CELL_HEIGHT / 2;
            let rank = if middle { RANK_LABELS[row] } else { ' ' };
            let mut spans = vec![Span::raw(format!("{} ", rank))];
            for col in 0..8 {
                let bg = frame.cell_color(row, col);
                let style = Style::default().bg(rgb(bg)).fg(rgb(text_color(bg)));
                let text = if middle {
                    format!("{:^width$}", cell_text(frame.labels[row][col]), width = CELL_WIDTH)
                } else {
                    blank.clone()
                };
                spans.push(Span::styled(text, style));
            }
            lines.push(Spans::from(spans));
        }
    }

    let mut files = String::from("  ");
    for file in FILE_LABELS {
        files.push_str(&format!("{:^width$}", file, width = CELL_WIDTH));
    }
    lines.push(Spans::from(files));
    lines
}

fn status_line(session: &HeatmapSession) -> String {
    let on_off = |b: bool| if b { "on" } else { "off" };
    format!(
        "{}  |  interval {} ms  |  repeat {}  |  rays {} ({:?})  |  {}",
        if session.is_playing() { "playing" } else { "paused" },
        session.autoplay().interval().as_millis(),
        on_off(session.autoplay().repeat()),
        on_off(session.show_rays()),
        session.ray_color(),
        if session.show_pieces() { "pieces" } else { "values" },
    )
}

fn redraw<W: Write>(
    renderer: &mut TerminalRenderer<W>,
    session: &HeatmapSession,
) -> Result<(), RenderError> {
    renderer.set_status(status_line(session));
    renderer.draw(&session.frame())
}

/// Run the viewer until the user quits. The terminal is restored on return.
pub fn run(session: &mut HeatmapSession) -> Result<(), RenderError> {
    let _guard = TerminalGuard::enter()?;
    let mut renderer = TerminalRenderer::new(io::stdout())?;
    let mut timers = TimerQueue::default();

    let apply = |timers: &mut TimerQueue, response: Response| {
        let now = Instant::now();
        for schedule in response.schedule {
            timers.arm(now, schedule);
        }
        response.redraw
    };

    let start = session.start();
    apply(&mut timers, start);
    redraw(&mut renderer, session)?;

    let result = loop {
        let timeout = timers
            .next_timeout(Instant::now())
            .unwrap_or(IDLE_POLL);
        let mut dirty = false;

        if event::poll(timeout)? {
            match event::read()? {
                TermEvent::Key(key) => match key_command(key, session) {
                    Some(Command::Quit) => break Ok(()),
                    Some(Command::Session(ev)) => match session.handle(ev) {
                        Ok(response) => dirty |= apply(&mut timers, response),
                        Err(err) => log::warn!("{}", err),
                    },
                    None => {}
                },
                TermEvent::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        for id in timers.take_due(Instant::now()) {
            let response = session.on_timer_tick(id);
            dirty |= apply(&mut timers, response);
        }

        if dirty {
            if let Err(err) = redraw(&mut renderer, session) {
                break Err(err);
            }
        }
    };

    session.close();
    result
}
