use crossterm::event::KeyCode;
use itertools::Itertools;
use rand::Rng;

/// Every symbol a combo can be built from, in code order.
pub const ALPHABET: [Symbol; 4] = [Symbol::Up, Symbol::Down, Symbol::Left, Symbol::Right];

/// Height in rows of every glyph returned by [`Symbol::glyph`].
pub const GLYPH_HEIGHT: usize = 5;

/// One directional prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Symbol {
    Up,
    Down,
    Left,
    Right,
}

impl Symbol {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'U' => Some(Symbol::Up),
            'D' => Some(Symbol::Down),
            'L' => Some(Symbol::Left),
            'R' => Some(Symbol::Right),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Symbol::Up => 'U',
            Symbol::Down => 'D',
            Symbol::Left => 'L',
            Symbol::Right => 'R',
        }
    }

    /// The key that has to be pressed to match this symbol
    pub fn key_code(self) -> KeyCode {
        match self {
            Symbol::Up => KeyCode::Up,
            Symbol::Down => KeyCode::Down,
            Symbol::Left => KeyCode::Left,
            Symbol::Right => KeyCode::Right,
        }
    }

    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        ALPHABET.into_iter().find(|s| s.key_code() == code)
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Symbol::Up => "↑",
            Symbol::Down => "↓",
            Symbol::Left => "←",
            Symbol::Right => "→",
        }
    }

    /// Block art, `GLYPH_HEIGHT` lines separated by `\n`
    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::Up => "   ██   \n ██████ \n████████\n   ██   \n   ██   ",
            Symbol::Down => "   ██   \n   ██   \n████████\n ██████ \n   ██   ",
            Symbol::Left => "    ███   \n  █████   \n██████████\n  █████   \n    ███   ",
            Symbol::Right => "   ███    \n   █████  \n██████████\n   █████  \n   ███    ",
        }
    }
}

/// Ordered list of symbols a round expects
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Sequence(Vec<Symbol>);

impl Sequence {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }

    /// Translate a code string like "UDLR". Unknown characters are dropped.
    pub fn from_codes(codes: &str) -> Self {
        Self(codes.chars().filter_map(Symbol::from_code).collect())
    }

    pub fn to_codes(&self) -> String {
        self.0.iter().map(|s| s.code()).collect()
    }

    /// Uniformly sampled sequence of `len` symbols
    pub fn random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        Self(
            (0..len)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                .collect(),
        )
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<Symbol> {
        self.0.get(idx).copied()
    }

    /// Compact arrow rendering, e.g. "↑ ↓ ← →"
    pub fn arrows(&self) -> String {
        self.0.iter().map(|s| s.arrow()).join(" ")
    }
}
