//! Coordinate notation: squares as file letter plus rank digit (`e4`), moves
//! as start square followed by end square (`e2e4`). Row 0 is rank 8.

use std::fmt;
use std::str::FromStr;

use crate::board::Square;
use crate::error::{EngineError, Result};
use crate::movegen::Move;

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let file = (b'a' + self.col()) as char;
        let rank = (b'8' - self.row()) as char;
        write!(f, "{file}{rank}")
    }
}

impl FromStr for Square {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(EngineError::InvalidSquare(s.to_string()));
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(EngineError::InvalidSquare(s.to_string()));
        }
        Square::new(b'8' - rank, file - b'a').ok_or_else(|| EngineError::InvalidSquare(s.to_string()))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Splits a four-character move such as `e2e4` into its two squares.
pub fn parse_move_squares(notation: &str) -> Result<(Square, Square)> {
    let notation = notation.trim();
    if notation.len() != 4 || !notation.is_ascii() {
        return Err(EngineError::InvalidNotation(notation.to_string()));
    }
    let from = notation[0..2]
        .parse()
        .map_err(|_| EngineError::InvalidNotation(notation.to_string()))?;
    let to = notation[2..4]
        .parse()
        .map_err(|_| EngineError::InvalidNotation(notation.to_string()))?;
    Ok((from, to))
}
