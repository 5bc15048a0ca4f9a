use std::time::Duration;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Terminal,
};
use unicode_width::UnicodeWidthStr;

use crate::matcher::Step;
use crate::symbol::{Sequence, GLYPH_HEIGHT};

const HORIZONTAL_MARGIN: u16 = 5;
const GLYPH_GAP: &str = "   ";
const CURRENT_LEFT: &str = ">>";
const CURRENT_RIGHT: &str = "<<";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    /// Time left until the session deadline
    pub remaining: Duration,
    /// Time spent on the current round
    pub elapsed: Duration,
}

/// Everything a display needs to draw one moment of a round
#[derive(Clone, Debug)]
pub struct RoundView<'a> {
    pub title: &'a str,
    pub total_score: i64,
    pub round_score: i64,
    pub sequence: &'a Sequence,
    pub current: usize,
    pub last_step: Option<Step>,
    pub timing: Option<Timing>,
}

/// Presentation sink for the round runners. Nothing it does feeds back into
/// the game.
pub trait Display {
    fn show(&mut self, view: &RoundView<'_>);
}

/// Draws rounds onto a ratatui terminal
pub struct TerminalDisplay<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalDisplay<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    pub fn into_terminal(self) -> Terminal<B> {
        self.terminal
    }
}

impl<B: Backend> Display for TerminalDisplay<B> {
    fn show(&mut self, view: &RoundView<'_>) {
        if let Err(e) = self.terminal.draw(|f| f.render_widget(view, f.area())) {
            tracing::warn!(error = %e, "failed to draw round");
        }
    }
}

/// What a [`RecordingDisplay`] keeps from each view
#[derive(Clone, Debug, PartialEq)]
pub struct Shown {
    pub title: String,
    pub total_score: i64,
    pub round_score: i64,
    pub current: usize,
    pub last_step: Option<Step>,
    pub timing: Option<Timing>,
}

/// Display that only remembers what it was asked to show
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub shown: Vec<Shown>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct round titles in the order they first appeared
    pub fn titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = Vec::new();
        for s in &self.shown {
            if titles.last() != Some(&s.title.as_str()) {
                titles.push(&s.title);
            }
        }
        titles
    }

    pub fn tick_frames(&self) -> usize {
        self.shown
            .iter()
            .filter(|s| s.timing.is_some() && s.last_step.is_none())
            .count()
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, view: &RoundView<'_>) {
        self.shown.push(Shown {
            title: view.title.to_string(),
            total_score: view.total_score,
            round_score: view.round_score,
            current: view.current,
            last_step: view.last_step,
            timing: view.timing,
        });
    }
}

fn glyph_rows(view: &RoundView<'_>) -> Vec<Line<'static>> {
    let done_style = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);
    let current_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let pending_style = Style::default()
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::DIM);

    let mut rows: Vec<Vec<Span>> = vec![Vec::new(); GLYPH_HEIGHT];
    for (idx, symbol) in view.sequence.symbols().iter().enumerate() {
        let style = match idx.cmp(&view.current) {
            std::cmp::Ordering::Less => done_style,
            std::cmp::Ordering::Equal => current_style,
            std::cmp::Ordering::Greater => pending_style,
        };
        for (row, part) in rows.iter_mut().zip(symbol.glyph().lines()) {
            if idx == view.current {
                row.push(Span::styled(
                    format!("{CURRENT_LEFT}{part}{CURRENT_RIGHT}"),
                    style,
                ));
            } else {
                row.push(Span::styled(part.to_string(), style));
            }
            row.push(Span::raw(GLYPH_GAP));
        }
    }
    rows.into_iter().map(Line::from).collect()
}

fn arrow_row(view: &RoundView<'_>) -> Line<'static> {
    let spans = view
        .sequence
        .symbols()
        .iter()
        .enumerate()
        .map(|(idx, symbol)| {
            let style = if idx < view.current {
                Style::default().fg(Color::Green)
            } else if idx == view.current {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            Span::styled(format!("{} ", symbol.arrow()), style)
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

/// Width the block art needs for `view`, markers included
pub fn art_width(view: &RoundView<'_>) -> usize {
    let glyphs: usize = view
        .sequence
        .symbols()
        .iter()
        .map(|s| s.glyph().lines().next().unwrap_or_default().width() + GLYPH_GAP.width())
        .sum();
    glyphs + CURRENT_LEFT.width() + CURRENT_RIGHT.width()
}

impl Widget for &RoundView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let mut header = vec![
            Line::from(vec![
                Span::raw("Action: "),
                Span::styled(self.title.to_string(), bold_style.fg(Color::Cyan)),
            ]),
            Line::from(format!(
                "Current Score: {}   Combo: {}",
                self.total_score, self.round_score
            )),
        ];
        if let Some(timing) = self.timing {
            header.push(Line::from(format!(
                "Overall Time Remaining: {:.1} seconds",
                timing.remaining.as_secs_f64()
            )));
            header.push(Line::from(format!(
                "Combo Time Elapsed: {:.2} seconds",
                timing.elapsed.as_secs_f64()
            )));
        }

        let usable = area.width.saturating_sub(HORIZONTAL_MARGIN * 2) as usize;
        let art: Vec<Line> = if art_width(self) <= usable {
            glyph_rows(self)
        } else {
            vec![arrow_row(self)]
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(header.len() as u16),
                Constraint::Length(1),
                Constraint::Length(art.len() as u16),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new(header).render(chunks[0], buf);
        Paragraph::new(art).render(chunks[2], buf);

        let feedback = match self.last_step {
            Some(Step::Advance) => Some(Span::styled(
                "Correct!",
                bold_style.fg(Color::Green),
            )),
            Some(Step::Penalize) => Some(Span::styled(
                "Wrong key, try again!",
                bold_style.fg(Color::Red),
            )),
            Some(Step::Quit) => Some(Span::styled("Exiting...", italic_style)),
            None => None,
        };
        if let Some(feedback) = feedback {
            Paragraph::new(feedback)
                .alignment(Alignment::Left)
                .render(chunks[4], buf);
        }

        Paragraph::new(Span::styled(
            "arrow keys to match / (q) or (esc)ape to quit",
            italic_style,
        ))
        .wrap(Wrap { trim: true })
        .render(chunks[6], buf);
    }
}
