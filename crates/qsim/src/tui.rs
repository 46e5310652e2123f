use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use qsim_core::{ScenarioConfig, ScenarioRegistry, Session, Simulator, StepReport, Verdict};

use crate::render::{render_bloch, render_entangled, render_measurement, render_verdict};

pub fn run_tui(registry: ScenarioRegistry, config: ScenarioConfig, seed: Option<u64>, decimals: usize) -> Result<()> {
    // Build before touching the terminal so configuration errors print normally.
    let app = App::new(registry, config, seed, decimals)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

struct App {
    registry: ScenarioRegistry,
    config: ScenarioConfig,
    seed: Option<u64>,
    decimals: usize,
    session: Session,
    reports: Vec<StepReport>,
    verdict: Option<Verdict>,
    error: Option<String>,
    state: ListState,
}

impl App {
    fn new(registry: ScenarioRegistry, config: ScenarioConfig, seed: Option<u64>, decimals: usize) -> Result<App> {
        let session = new_session(&registry, &config, seed)?;
        Ok(App {
            registry,
            config,
            seed,
            decimals,
            session,
            reports: Vec::new(),
            verdict: None,
            error: None,
            state: ListState::default(),
        })
    }

    fn step(&mut self) {
        if self.session.is_finished() {
            return;
        }
        match self.session.step() {
            Ok(Some(report)) => {
                self.reports.push(report);
                self.state.select(Some(self.reports.len() - 1));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Step failed");
                self.error = Some(e.to_string());
                return;
            }
        }
        if self.session.is_finished() && self.verdict.is_none() {
            match self.session.finish() {
                Ok(verdict) => self.verdict = Some(verdict),
                Err(e) => self.error = Some(e.to_string()),
            }
        }
    }

    fn restart(&mut self) {
        match new_session(&self.registry, &self.config, self.seed) {
            Ok(session) => {
                self.session = session;
                self.reports.clear();
                self.verdict = None;
                self.error = None;
                self.state.select(None);
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn next(&mut self) {
        if self.reports.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.reports.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.reports.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    /// Report under the cursor, falling back to the latest one.
    fn selected_report(&self) -> Option<&StepReport> {
        self.state
            .selected()
            .and_then(|i| self.reports.get(i))
            .or_else(|| self.reports.last())
    }
}

fn new_session(registry: &ScenarioRegistry, config: &ScenarioConfig, seed: Option<u64>) -> Result<Session> {
    let scenario = registry.build(config)?;
    let simulator = match seed {
        Some(seed) => Simulator::seeded(seed),
        None => Simulator::new(),
    };
    Ok(Session::new(scenario, simulator)?)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') | KeyCode::Char('n') | KeyCode::Enter => app.step(),
                    KeyCode::Char('r') => app.restart(),
                    KeyCode::Down | KeyCode::Char('j') => app.next(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous(),
                    _ => {}
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.size());

    let scenario = app.session.scenario();
    let header = Paragraph::new(format!(
        "{} - step {}/{}",
        scenario.title(),
        app.session.position(),
        app.session.total_steps()
    ))
    .block(Block::default().borders(Borders::ALL).title("qsim"));
    f.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(chunks[1]);

    let mut items: Vec<ListItem> = app
        .reports
        .iter()
        .map(|r| ListItem::new(format!("{}. {}  {}", r.index + 1, r.operation, r.description)))
        .collect();
    // Upcoming steps, dimmed.
    items.extend(app.session.script().iter().enumerate().skip(app.reports.len()).map(|(i, s)| {
        ListItem::new(format!("{}. {}  {}", i + 1, s.operation, s.description))
            .style(Style::default().fg(Color::DarkGray))
    }));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Steps"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, body[0], &mut app.state);

    let detail = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)].as_ref())
        .split(body[1]);

    let (state_text, bloch_lines) = match app.selected_report() {
        Some(report) => {
            let mut lines: Vec<Line> = report
                .bloch
                .iter()
                .map(|b| {
                    let style = if b.entangled {
                        Style::default().fg(Color::Magenta)
                    } else {
                        Style::default()
                    };
                    Line::from(Span::styled(render_bloch(b, app.decimals), style))
                })
                .collect();
            lines.push(Line::from(""));
            if let Some(m) = &report.measured {
                lines.push(Line::from(render_measurement(m)));
            }
            let entangled_style = if report.is_entangled() {
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(render_entangled(&report.entangled), entangled_style)));
            (report.state.dirac_notation(app.decimals), lines)
        }
        None => ("|0...0⟩ (no steps taken yet)".to_string(), Vec::new()),
    };

    let state = Paragraph::new(state_text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("State vector"));
    f.render_widget(state, detail[0]);

    let bloch = Paragraph::new(bloch_lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Bloch vectors"));
    f.render_widget(bloch, detail[1]);

    let (footer_text, footer_style) = if let Some(error) = &app.error {
        (format!("Error: {}", error), Style::default().fg(Color::Red))
    } else if let Some(verdict) = &app.verdict {
        let color = if verdict.success { Color::Green } else { Color::Yellow };
        (
            format!("{} | r: Restart | q: Quit", render_verdict(verdict)),
            Style::default().fg(color),
        )
    } else {
        (
            "Space/n/Enter: Step | ↑/↓: Inspect | r: Restart | q: Quit".to_string(),
            Style::default(),
        )
    };
    let footer = Paragraph::new(footer_text)
        .style(footer_style)
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(footer, chunks[2]);
}
