use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GameError, Result};
use crate::symbol::Sequence;

static ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets");

pub const BUNDLED_COMBOS: &str = "stratagems.json";

/// A combo definition as stored on disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub name: String,
    pub sequence: String,
}

/// Anything that can produce combo definitions
pub trait ComboSource {
    fn load(&self) -> Result<Vec<Combo>>;
}

pub fn parse_combos(json: &str) -> Result<Vec<Combo>> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Debug, Clone)]
pub struct FileComboSource {
    path: PathBuf,
}

impl FileComboSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ComboSource for FileComboSource {
    fn load(&self) -> Result<Vec<Combo>> {
        let json = fs::read_to_string(&self.path).map_err(|source| GameError::ReadCombos {
            path: self.path.clone(),
            source,
        })?;
        parse_combos(&json)
    }
}

/// Combos compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledComboSource;

impl ComboSource for BundledComboSource {
    fn load(&self) -> Result<Vec<Combo>> {
        let json = ASSETS
            .get_file(BUNDLED_COMBOS)
            .and_then(|f| f.contents_utf8())
            .ok_or(GameError::MissingBundledCombos)?;
        parse_combos(json)
    }
}

/// Reads `path` when it names a regular file, otherwise the bundled combos
#[derive(Debug, Clone)]
pub struct DefaultComboSource {
    path: PathBuf,
}

impl DefaultComboSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ComboSource for DefaultComboSource {
    fn load(&self) -> Result<Vec<Combo>> {
        if self.path.is_file() {
            debug!(path = %self.path.display(), "loading combos from file");
            FileComboSource::new(&self.path).load()
        } else {
            debug!(path = %self.path.display(), "combo file not found, using bundled combos");
            BundledComboSource.load()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedSequence {
    pub name: String,
    pub sequence: Sequence,
}

/// Playable combos, each with at least one symbol
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComboLibrary {
    entries: Vec<NamedSequence>,
}

impl ComboLibrary {
    pub fn from_combos(combos: Vec<Combo>) -> Self {
        let entries = combos
            .into_iter()
            .filter_map(|combo| {
                let sequence = Sequence::from_codes(&combo.sequence);
                if sequence.is_empty() {
                    warn!(
                        name = %combo.name,
                        raw = %combo.sequence,
                        "skipping combo without symbols"
                    );
                    None
                } else {
                    Some(NamedSequence {
                        name: combo.name,
                        sequence,
                    })
                }
            })
            .collect();
        Self { entries }
    }

    /// Load and translate, failing when nothing playable remains
    pub fn load(source: &dyn ComboSource) -> Result<Self> {
        let library = Self::from_combos(source.load()?);
        if library.is_empty() {
            return Err(GameError::EmptyLibrary);
        }
        Ok(library)
    }

    pub fn entries(&self) -> &[NamedSequence] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
