use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{error, info};

use crate::combos::{ComboLibrary, NamedSequence};
use crate::error::{GameError, Result};
use crate::round::{play_timed, play_untimed, RoundEnd};
use crate::runtime::{FixedTicker, Input};
use crate::symbol::Sequence;
use crate::ui::Display;

pub const RANDOM_TITLE: &str = "Random";

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Mode {
    /// combos drawn from the library, no time limit
    Library,
    /// freshly generated arrow sequences, no time limit
    Random,
    /// library combos against a session deadline, with speed bonuses
    Timed,
}

impl Mode {
    pub fn is_timed(self) -> bool {
        matches!(self, Mode::Timed)
    }

    pub fn uses_library(self) -> bool {
        !matches!(self, Mode::Random)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub rounds: usize,
    pub random_length: usize,
    pub time_limit: Duration,
    pub tick: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            random_length: 6,
            time_limit: Duration::from_secs(30),
            tick: Duration::from_millis(crate::TICK_RATE_MS),
        }
    }
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Finished,
    Quit,
    TimeUp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub total_score: i64,
    pub elapsed: Duration,
    pub rounds_completed: usize,
    pub end: SessionEnd,
}

impl SessionReport {
    pub fn score_and_secs(&self) -> (i64, f64) {
        (self.total_score, self.elapsed.as_secs_f64())
    }
}

/// Pick the sequences a session will play, in order.
///
/// Library modes shuffle the pool and keep the first `rounds`; random mode
/// generates `rounds` sequences of `random_length`.
pub fn plan_rounds<R: Rng + ?Sized>(
    mode: Mode,
    config: &SessionConfig,
    library: &ComboLibrary,
    rng: &mut R,
) -> Result<Vec<NamedSequence>> {
    if !mode.uses_library() {
        return Ok((0..config.rounds)
            .map(|_| NamedSequence {
                name: RANDOM_TITLE.to_string(),
                sequence: Sequence::random(config.random_length.max(1), rng),
            })
            .collect());
    }

    if library.is_empty() {
        return Err(GameError::EmptyLibrary);
    }
    let mut pool = library.entries().to_vec();
    pool.shuffle(rng);
    pool.truncate(config.rounds);
    Ok(pool)
}

/// One play invocation
#[derive(Debug)]
pub struct Session {
    mode: Mode,
    tick: Duration,
    started: Instant,
    deadline: Option<Instant>,
    total: i64,
    rounds_completed: usize,
}

impl Session {
    /// Starts the session clock, and for timed mode the deadline.
    pub fn new(mode: Mode, config: &SessionConfig) -> Self {
        let started = Instant::now();
        Self {
            mode,
            tick: config.tick,
            started,
            deadline: mode.is_timed().then(|| started + config.time_limit),
            total: 0,
            rounds_completed: 0,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Play `rounds` one after another until they run out, the player
    /// quits, or the deadline passes.
    pub fn run(
        mut self,
        rounds: &[NamedSequence],
        input: &Arc<Input>,
        display: &mut dyn Display,
    ) -> Result<SessionReport> {
        info!(mode = %self.mode, rounds = rounds.len(), "session started");
        let ticker = FixedTicker::new(self.tick);

        let mut end = SessionEnd::Finished;
        for round in rounds {
            let outcome = match self.deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        end = SessionEnd::TimeUp;
                        break;
                    }
                    play_timed(
                        &round.sequence,
                        &round.name,
                        &mut self.total,
                        deadline,
                        &ticker,
                        input,
                        display,
                    )
                }
                None => play_untimed(
                    &round.sequence,
                    &round.name,
                    &mut self.total,
                    input,
                    display,
                ),
            };
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, score = self.total, round = %round.name, "session aborted");
                    return Err(GameError::Aborted {
                        score: self.total,
                        elapsed: self.started.elapsed(),
                        source: Box::new(e),
                    });
                }
            };

            match outcome.end {
                RoundEnd::Completed => self.rounds_completed += 1,
                RoundEnd::Quit => {
                    end = SessionEnd::Quit;
                    break;
                }
                RoundEnd::TimeUp => {
                    end = SessionEnd::TimeUp;
                    break;
                }
            }
        }

        let report = SessionReport {
            total_score: self.total,
            elapsed: self.started.elapsed(),
            rounds_completed: self.rounds_completed,
            end,
        };
        info!(
            ?end,
            score = report.total_score,
            completed = report.rounds_completed,
            secs = report.elapsed.as_secs_f64(),
            "session finished"
        );
        Ok(report)
    }
}

/// Plan and run a whole session
pub fn play<R: Rng + ?Sized>(
    mode: Mode,
    config: &SessionConfig,
    library: &ComboLibrary,
    rng: &mut R,
    input: &Arc<Input>,
    display: &mut dyn Display,
) -> Result<SessionReport> {
    let rounds = plan_rounds(mode, config, library, rng)?;
    Session::new(mode, config).run(&rounds, input, display)
}
