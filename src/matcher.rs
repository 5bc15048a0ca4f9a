use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::symbol::{Sequence, Symbol};

pub const CORRECT_POINTS: i64 = 20;
pub const WRONG_KEY_PENALTY: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Advance,
    Penalize,
    Quit,
}

/// Esc, `q` or ctrl+c
pub fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Tracks progress through one sequence.
#[derive(Debug)]
pub struct Matcher<'a> {
    sequence: &'a Sequence,
    cursor: usize,
    score: i64,
}

impl<'a> Matcher<'a> {
    pub fn new(sequence: &'a Sequence) -> Self {
        Self {
            sequence,
            cursor: 0,
            score: 0,
        }
    }

    pub fn consume(&mut self, key: &KeyEvent) -> Step {
        if is_quit(key) {
            return Step::Quit;
        }

        match self.expected() {
            Some(symbol) if key.code == symbol.key_code() => {
                self.cursor += 1;
                self.score += CORRECT_POINTS;
                Step::Advance
            }
            _ => {
                self.score -= WRONG_KEY_PENALTY;
                Step::Penalize
            }
        }
    }

    pub fn expected(&self) -> Option<Symbol> {
        self.sequence.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.sequence.len()
    }
}
