use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell of the square terrain grid.
///
/// `Display` renders the canonical `"row_col"` key used by replay tooling and
/// `FromStr` parses it back. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn in_square(self, size: usize) -> bool {
        self.row >= 0 && self.col >= 0 && (self.row as usize) < size && (self.col as usize) < size
    }

    /// Isometric depth; cells with a larger depth are drawn in front.
    pub fn depth(self) -> i32 {
        self.row + self.col
    }
}

impl From<[i32; 2]> for GridCoord {
    fn from(value: [i32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<GridCoord> for [i32; 2] {
    fn from(value: GridCoord) -> Self {
        [value.row, value.col]
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid grid key '{key}', expected '<row>_<col>'")]
pub struct GridKeyError {
    pub key: String,
}

impl FromStr for GridCoord {
    type Err = GridKeyError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = || GridKeyError {
            key: key.to_string(),
        };
        let (row, col) = key.split_once('_').ok_or_else(invalid)?;
        let row = row.parse::<i32>().map_err(|_| invalid())?;
        let col = col.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self::new(row, col))
    }
}
