#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system that turns raw player input into world commands.
//!
//! Players address board cells with labels such as `B4` (column letter then
//! 1-based row), pick towers by build-menu slot and refer to existing towers
//! by their 1-based construction order. Malformed input never reaches the
//! world; it is reported back as an [`InputError`].

use std::str::FromStr;

use path_defence_core::{CellCoord, Command, TowerId, TowerKind};

/// Reasons raw player input cannot be turned into a command.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The action keyword is not recognised.
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    /// The action is missing one of its arguments.
    #[error("`{action}` needs {expected}")]
    MissingArgument {
        /// Action keyword that was provided.
        action: &'static str,
        /// Description of the missing argument.
        expected: &'static str,
    },
    /// The tower slot is not a number between 1 and the number of kinds.
    #[error("tower slot `{0}` must be between 1 and 5")]
    InvalidSlot(String),
    /// The cell label is not a letter followed by a row number.
    #[error("`{0}` is not a cell such as B4")]
    InvalidCell(String),
    /// The cell label names a cell beyond the board.
    #[error("cell {0} is outside the board")]
    CellOutOfBounds(String),
    /// The tower index is not a positive number.
    #[error("tower index `{0}` is not a positive number")]
    InvalidTowerIndex(String),
    /// No tower exists at the provided index.
    #[error("there is no tower #{0}")]
    NoSuchTower(usize),
}

/// Player request expressed in raw, unvalidated text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerRequest {
    /// Build a tower from a menu slot on a labelled cell.
    Build {
        /// Build-menu slot as typed.
        slot: String,
        /// Cell label as typed.
        cell: String,
    },
    /// Upgrade the tower at a 1-based index.
    Upgrade {
        /// Tower index as typed.
        tower: String,
    },
    /// Increase the game speed.
    Faster,
    /// Decrease the game speed.
    Slower,
}

impl FromStr for PlayerRequest {
    type Err = InputError;

    /// Parses `build <slot> <cell>`, `upgrade <index>`, `faster` or `slower`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let action = words.next().unwrap_or_default().to_ascii_lowercase();
        match action.as_str() {
            "build" | "b" => {
                let missing = InputError::MissingArgument {
                    action: "build",
                    expected: "a slot and a cell",
                };
                let slot = words.next().ok_or_else(|| missing.clone())?;
                let cell = words.next().ok_or(missing)?;
                Ok(Self::Build {
                    slot: slot.to_owned(),
                    cell: cell.to_owned(),
                })
            }
            "upgrade" | "u" => {
                let tower = words.next().ok_or(InputError::MissingArgument {
                    action: "upgrade",
                    expected: "a tower index",
                })?;
                Ok(Self::Upgrade {
                    tower: tower.to_owned(),
                })
            }
            "faster" | "+" => Ok(Self::Faster),
            "slower" | "-" => Ok(Self::Slower),
            _ => Err(InputError::UnknownAction(line.trim().to_owned())),
        }
    }
}

/// Builder system bound to the dimensions of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Builder {
    columns: u32,
    rows: u32,
}

impl Builder {
    /// Creates a builder for a board of the provided size.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Translates a request into a command, resolving tower indices against `towers`.
    ///
    /// `towers` must list tower identifiers in construction order, mirroring
    /// the world's `query::towers` helper.
    pub fn handle(
        &self,
        request: &PlayerRequest,
        towers: &[TowerId],
        out: &mut Vec<Command>,
    ) -> Result<(), InputError> {
        let command = match request {
            PlayerRequest::Build { slot, cell } => Command::PlaceTower {
                kind: parse_slot(slot)?,
                cell: self.parse_cell(cell)?,
            },
            PlayerRequest::Upgrade { tower } => Command::UpgradeTower {
                tower: parse_tower_index(tower, towers)?,
            },
            PlayerRequest::Faster => Command::AdjustGameSpeed { faster: true },
            PlayerRequest::Slower => Command::AdjustGameSpeed { faster: false },
        };
        out.push(command);
        Ok(())
    }

    /// Parses a cell label and checks it against the board bounds.
    pub fn parse_cell(&self, label: &str) -> Result<CellCoord, InputError> {
        let cell = parse_cell_label(label)?;
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return Err(InputError::CellOutOfBounds(label.trim().to_ascii_uppercase()));
        }
        Ok(cell)
    }
}

/// Resolves a 1-based build-menu slot.
pub fn parse_slot(slot: &str) -> Result<TowerKind, InputError> {
    slot.trim()
        .parse::<usize>()
        .ok()
        .and_then(TowerKind::from_slot)
        .ok_or_else(|| InputError::InvalidSlot(slot.trim().to_owned()))
}

/// Parses a label made of one column letter and a 1-based row of one or two digits.
pub fn parse_cell_label(label: &str) -> Result<CellCoord, InputError> {
    let trimmed = label.trim();
    let invalid = || InputError::InvalidCell(trimmed.to_owned());
    let mut chars = trimmed.chars();
    let letter = chars
        .next()
        .filter(char::is_ascii_alphabetic)
        .ok_or_else(invalid)?;
    let digits = chars.as_str();
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }
    let column = u32::from(letter.to_ascii_uppercase()) - u32::from('A');
    Ok(CellCoord::new(column, row - 1))
}

/// Resolves a 1-based tower index against towers listed in construction order.
pub fn parse_tower_index(index: &str, towers: &[TowerId]) -> Result<TowerId, InputError> {
    let position: usize = index
        .trim()
        .parse()
        .ok()
        .filter(|position| *position > 0)
        .ok_or_else(|| InputError::InvalidTowerIndex(index.trim().to_owned()))?;
    towers
        .get(position - 1)
        .copied()
        .ok_or(InputError::NoSuchTower(position))
}
