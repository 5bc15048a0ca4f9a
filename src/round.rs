//! Drives one sequence through the matcher, either blocking on every key
//! (untimed) or racing input against a tick and the session deadline (timed).

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::select_biased;
use tracing::{debug, info};

use crate::error::{GameError, Result};
use crate::matcher::{Matcher, Step};
use crate::runtime::{EventPump, Input, InputEvent, Pumped, Ticker};
use crate::symbol::Sequence;
use crate::ui::{Display, RoundView, Timing};

/// Speed bonus tiers as (upper bound in seconds, inclusive; points).
pub const BONUS_TIERS: [(f64, i64); 3] = [(1.0, 100), (2.0, 50), (3.0, 25)];

/// Bonus for completing a timed round in `elapsed`
pub fn speed_bonus(elapsed: Duration) -> i64 {
    let secs = elapsed.as_secs_f64();
    BONUS_TIERS
        .iter()
        .find(|(limit, _)| secs <= *limit)
        .map_or(0, |(_, points)| *points)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundEnd {
    Completed,
    Quit,
    TimeUp,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundOutcome {
    pub end: RoundEnd,
    /// Matching deltas plus the bonus, if one was earned
    pub score: i64,
    pub bonus: i64,
    pub duration: Duration,
}

impl RoundOutcome {
    pub fn completed(&self) -> bool {
        self.end == RoundEnd::Completed
    }
}

struct Frame<'a> {
    title: &'a str,
    total: i64,
    last_step: Option<Step>,
    timing: Option<Timing>,
}

fn show(display: &mut dyn Display, matcher: &Matcher<'_>, sequence: &Sequence, frame: Frame<'_>) {
    display.show(&RoundView {
        title: frame.title,
        total_score: frame.total,
        round_score: matcher.score(),
        sequence,
        current: matcher.cursor(),
        last_step: frame.last_step,
        timing: frame.timing,
    });
}

/// Bank the partial round score before a fatal error leaves the round
fn settle(end: Result<RoundEnd>, matcher: &Matcher<'_>, total: &mut i64) -> Result<RoundEnd> {
    if end.is_err() {
        *total += matcher.score();
    }
    end
}

fn timing(deadline: Instant, started: Instant) -> Timing {
    let now = Instant::now();
    Timing {
        remaining: deadline.saturating_duration_since(now),
        elapsed: now.saturating_duration_since(started),
    }
}

/// Play `sequence` with no time bound.
///
/// The round score, partial or not, is added to `total` when the round ends.
pub fn play_untimed(
    sequence: &Sequence,
    title: &str,
    total: &mut i64,
    input: &Input,
    display: &mut dyn Display,
) -> Result<RoundOutcome> {
    let started = Instant::now();
    let mut matcher = Matcher::new(sequence);
    let mut last_step = None;

    show(
        display,
        &matcher,
        sequence,
        Frame {
            title,
            total: *total,
            last_step,
            timing: None,
        },
    );

    let end = loop {
        if matcher.is_complete() {
            break Ok(RoundEnd::Completed);
        }

        let key = match input.read() {
            Ok(InputEvent::Key(key)) => key,
            Ok(InputEvent::Resize) => {
                show(
                    display,
                    &matcher,
                    sequence,
                    Frame {
                        title,
                        total: *total,
                        last_step,
                        timing: None,
                    },
                );
                continue;
            }
            Ok(InputEvent::Other) => continue,
            Err(e) => break Err(GameError::Input(e)),
        };

        let step = matcher.consume(&key);
        debug!(?step, cursor = matcher.cursor(), score = matcher.score(), "untimed key");
        last_step = Some(step);
        show(
            display,
            &matcher,
            sequence,
            Frame {
                title,
                total: *total,
                last_step,
                timing: None,
            },
        );
        if step == Step::Quit {
            break Ok(RoundEnd::Quit);
        }
    };
    let end = settle(end, &matcher, total)?;

    let outcome = RoundOutcome {
        end,
        score: matcher.score(),
        bonus: 0,
        duration: started.elapsed(),
    };
    *total += outcome.score;
    info!(title, ?end, score = outcome.score, "untimed round finished");
    Ok(outcome)
}

/// Play `sequence` against the session `deadline`.
///
/// Input is pumped from a background thread and selected against the tick
/// that refreshes the countdown. The deadline always wins over a pending key.
/// The pump and the tick are torn down before returning, on every path.
pub fn play_timed(
    sequence: &Sequence,
    title: &str,
    total: &mut i64,
    deadline: Instant,
    ticker: &dyn Ticker,
    input: &Arc<Input>,
    display: &mut dyn Display,
) -> Result<RoundOutcome> {
    let started = Instant::now();
    let mut matcher = Matcher::new(sequence);
    let mut last_step = None;

    show(
        display,
        &matcher,
        sequence,
        Frame {
            title,
            total: *total,
            last_step,
            timing: Some(timing(deadline, started)),
        },
    );

    let pump = EventPump::spawn(Arc::clone(input));
    let ticks = ticker.start();
    let expiry = crossbeam_channel::at(deadline);

    let (end, held): (Result<RoundEnd>, Option<Pumped>) = loop {
        if Instant::now() >= deadline {
            break (Ok(RoundEnd::TimeUp), None);
        }

        select_biased! {
            recv(expiry) -> _ => break (Ok(RoundEnd::TimeUp), None),
            recv(pump.events()) -> ev => {
                let Ok(ev) = ev else {
                    break (Err(GameError::Input(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "input pump stopped",
                    ))), None);
                };
                // arrived too late, leave it for whoever reads next
                if Instant::now() >= deadline {
                    break (Ok(RoundEnd::TimeUp), Some(ev));
                }
                let key = match ev {
                    Ok(InputEvent::Key(key)) => key,
                    Ok(_) => continue,
                    Err(e) => break (Err(GameError::Input(e)), None),
                };

                let step = matcher.consume(&key);
                debug!(?step, cursor = matcher.cursor(), score = matcher.score(), "timed key");
                last_step = Some(step);
                match step {
                    Step::Quit => break (Ok(RoundEnd::Quit), None),
                    Step::Advance if matcher.is_complete() => {
                        break (Ok(RoundEnd::Completed), None)
                    }
                    _ => show(
                        display,
                        &matcher,
                        sequence,
                        Frame {
                            title,
                            total: *total,
                            last_step,
                            timing: Some(timing(deadline, started)),
                        },
                    ),
                }
            },
            recv(ticks) -> _ => show(
                display,
                &matcher,
                sequence,
                Frame {
                    title,
                    total: *total,
                    last_step: None,
                    timing: Some(timing(deadline, started)),
                },
            ),
        }
    };
    // measured before teardown, joining the pump can take a poll interval
    let duration = started.elapsed();

    drop(ticks);
    pump.shutdown(held);
    let end = settle(end, &matcher, total)?;

    let bonus = match end {
        RoundEnd::Completed => speed_bonus(duration),
        RoundEnd::Quit | RoundEnd::TimeUp => 0,
    };
    let outcome = RoundOutcome {
        end,
        score: matcher.score() + bonus,
        bonus,
        duration,
    };
    *total += outcome.score;

    show(
        display,
        &matcher,
        sequence,
        Frame {
            title,
            total: *total,
            last_step,
            timing: Some(timing(deadline, started)),
        },
    );
    info!(
        title,
        ?end,
        score = outcome.score,
        bonus,
        secs = duration.as_secs_f64(),
        "timed round finished"
    );
    Ok(outcome)
}
