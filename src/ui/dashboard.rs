use crate::api::MessageFormat;
use crate::config::{MonitorSettings, ALERT_HISTORY_CAPACITY};
use crate::monitor::message::{format_clock, format_usd, render_alert};
use crate::monitor::{MonitorEngine, TickResult};
use crate::ui::history::{AlertHistory, HistoryEntry};
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

type DynError = Box<dyn Error + Send + Sync>;
type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Terminal front-end: drives one tick per period and renders its outcome.
pub struct Dashboard {
    settings: MonitorSettings,
    history: AlertHistory,
    last_result: TickResult,
    last_tick_at: Option<DateTime<Local>>,
    ticks: u64,
    notifications: bool,
    running: bool,
    busy: bool,
}

impl Dashboard {
    pub fn new(settings: MonitorSettings, notifications: bool) -> Self {
        Self {
            settings,
            history: AlertHistory::new(ALERT_HISTORY_CAPACITY),
            last_result: TickResult::default(),
            last_tick_at: None,
            ticks: 0,
            notifications,
            running: true,
            busy: false,
        }
    }

    pub async fn run(&mut self, engine: &mut MonitorEngine) -> Result<(), DynError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let outcome = self.event_loop(&mut terminal, engine).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        outcome
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Term,
        engine: &mut MonitorEngine,
    ) -> Result<(), DynError> {
        while self.running {
            self.busy = true;
            terminal.draw(|f| self.render(f, Duration::ZERO))?;

            let result = engine
                .run_tick(self.settings.threshold_pct, self.settings.interval)
                .await?;
            self.absorb(result);
            self.busy = false;

            // Fixed delay: the next tick starts one period after this one ended.
            let mut next_tick = Instant::now() + self.settings.tick_period;
            while self.running && Instant::now() < next_tick {
                let remaining = next_tick.saturating_duration_since(Instant::now());
                terminal.draw(|f| self.render(f, remaining))?;

                if event::poll(Duration::from_millis(100))? {
                    if let Event::Key(key) = event::read()? {
                        if self.handle_key_input(key) {
                            next_tick = Instant::now();
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the user asked for an immediate tick.
    fn handle_key_input(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                false
            }
            KeyCode::Char('r') => true,
            _ => false,
        }
    }

    fn absorb(&mut self, result: TickResult) {
        let now = Local::now();
        for event in result.delivered_events() {
            self.history.push(HistoryEntry {
                delivered_at: now,
                message: render_alert(event, self.settings.interval, MessageFormat::Plain),
            });
        }
        if !result.failed_symbols.is_empty() {
            log::warn!(
                "Unavailable symbols: {}",
                result
                    .failed_symbols
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        self.last_result = result;
        self.last_tick_at = Some(now);
        self.ticks += 1;
    }

    fn render(&self, f: &mut Frame, remaining: Duration) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(12),
                Constraint::Length(2),
            ])
            .split(f.size());

        self.render_header(f, chunks[0]);
        self.render_failures(f, chunks[1]);
        self.render_variations(f, chunks[2]);
        self.render_history(f, chunks[3]);
        self.render_footer(f, chunks[4], remaining);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let active = self.last_result.alerts.len();
        let delta = if active > 0 {
            Span::styled(format!(" (+{})", active), Style::default().fg(Color::Green))
        } else {
            Span::raw("")
        };

        let header = Paragraph::new(Line::from(vec![
            Span::raw("Monitored symbols: "),
            Span::styled(
                self.settings.symbols.len().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   Active alerts: "),
            Span::styled(active.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            delta,
            Span::raw(format!(
                "   Threshold: {:.2}%   Interval: {}   Notifications: ",
                self.settings.threshold_pct, self.settings.interval
            )),
            if self.notifications {
                Span::styled("ON", Style::default().fg(Color::Green))
            } else {
                Span::styled("OFF", Style::default().fg(Color::Red))
            },
        ]))
        .block(Block::default().borders(Borders::ALL).title("Price Variation Monitor"));

        f.render_widget(header, area);
    }

    fn render_failures(&self, f: &mut Frame, area: Rect) {
        if self.last_result.failed_symbols.is_empty() {
            return;
        }
        let names = self
            .last_result
            .failed_symbols
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let warning = Paragraph::new(Line::from(Span::styled(
            format!("⚠ Unavailable symbols: {}", names),
            Style::default().fg(Color::Yellow),
        )));
        f.render_widget(warning, area);
    }

    fn render_variations(&self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Detected Variations");

        if self.last_result.alerts.is_empty() {
            let text = if self.busy && self.ticks == 0 {
                "Fetching prices..."
            } else {
                "No symbol crossed the threshold in the last tick."
            };
            f.render_widget(Paragraph::new(text).block(block), area);
            return;
        }

        let rows = self.last_result.alerts.iter().map(|event| {
            let color = if event.variation_pct >= 0.0 {
                Color::Green
            } else {
                Color::Red
            };
            Row::new(vec![
                Cell::from(event.symbol.to_string()),
                Cell::from(Span::styled(
                    format!("{:.2}%", event.variation_pct),
                    Style::default().fg(color),
                )),
                Cell::from(format_usd(event.current_price)),
                Cell::from(format_usd(event.initial_price)),
                Cell::from(format_clock(event.detected_at)),
                Cell::from(format_clock(event.window_start_time)),
                Cell::from(format_clock(event.window_end_time)),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(11),
                Constraint::Length(10),
                Constraint::Length(16),
                Constraint::Length(16),
                Constraint::Length(9),
                Constraint::Length(9),
                Constraint::Length(9),
            ],
        )
        .header(
            Row::new(vec!["Symbol", "Variation", "Current", "Initial", "Time", "Start", "End"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block);

        f.render_widget(table, area);
    }

    fn render_history(&self, f: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        for entry in self.history.newest_first() {
            lines.push(Line::from(Span::styled(
                entry.delivered_at.format("%H:%M:%S").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(
                entry
                    .message
                    .lines()
                    .filter(|l| !l.is_empty())
                    .map(|l| Line::from(format!("  {}", l))),
            );
        }
        if lines.is_empty() {
            lines.push(Line::from("No alerts delivered yet."));
        }

        let history = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Alert History"));
        f.render_widget(history, area);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect, remaining: Duration) {
        let status = if self.busy {
            Span::styled("Running tick...", Style::default().fg(Color::Cyan))
        } else {
            Span::raw(format!("Next tick in {}s", remaining.as_secs()))
        };
        let last = self
            .last_tick_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        let footer = Paragraph::new(Line::from(vec![
            status,
            Span::raw(format!("   Last tick: {}   Ticks: {}   ", last, self.ticks)),
            Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Refresh  "),
            Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Quit"),
        ]))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));

        f.render_widget(footer, area);
    }
}
