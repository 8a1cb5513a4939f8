use log::{debug, warn};

use crate::board::{Position, Square};
use crate::error::{EngineError, Result};
use crate::movegen::{self, GameState, Move};
use crate::notation::parse_move_squares;

/// A game in progress: the position plus the legal moves generated for it.
///
/// The move list is regenerated after every change, so it always belongs to
/// the current position and the terminal flags are current.
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    legal: Vec<Move>,
}

impl Game {
    pub fn new() -> Self {
        Self::from_position(Position::new())
    }

    pub fn from_position(mut position: Position) -> Self {
        let legal = movegen::legal_moves(&mut position);
        Self { position, legal }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn legal_moves(&self) -> &[Move] {
        &self.legal
    }

    /// Plays the legal move going from `from` to `to`.
    pub fn play(&mut self, from: Square, to: Square) -> Result<Move> {
        let intent = Move::new(from, to, &self.position)
            .ok_or_else(|| EngineError::IllegalMove(format!("no piece on {from}")))?;
        let Some(&mv) = self.legal.iter().find(|&&candidate| candidate == intent) else {
            warn!("rejected {intent}: not among {} legal moves", self.legal.len());
            return Err(EngineError::IllegalMove(intent.to_string()));
        };
        self.position.make_move(mv);
        debug!("played {mv}");
        self.refresh();
        Ok(mv)
    }

    pub fn play_notation(&mut self, notation: &str) -> Result<Move> {
        let (from, to) = parse_move_squares(notation)?;
        self.play(from, to)
    }

    /// Takes back the last move, if any.
    pub fn undo(&mut self) -> Option<Move> {
        let mv = self.position.undo_move()?;
        debug!("took back {mv}");
        self.refresh();
        Some(mv)
    }

    pub fn state(&self) -> GameState {
        movegen::game_state(&self.position)
    }

    pub fn move_log(&self) -> Vec<String> {
        self.position
            .history()
            .iter()
            .map(|entry| entry.mv.to_string())
            .collect()
    }

    fn refresh(&mut self) {
        self.legal = movegen::legal_moves(&mut self.position);
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;

    #[test]
    fn test_play_and_undo() {
        let mut game = Game::new();
        assert_eq!(game.legal_moves().len(), 20);
        let mv = game.play_notation("e2e4").unwrap();
        assert_eq!(mv.to_string(), "e2e4");
        assert_eq!(game.position().side_to_move(), Color::Black);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.move_log(), vec!["e2e4"]);

        assert_eq!(game.undo(), Some(mv));
        assert!(game.move_log().is_empty());
        assert_eq!(game.undo(), None);
        assert_eq!(game.position(), &Position::new());
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut game = Game::new();
        let before = game.position().clone();
        assert!(matches!(game.play_notation("e2e5"), Err(EngineError::IllegalMove(_))));
        assert!(matches!(game.play_notation("e4e5"), Err(EngineError::IllegalMove(_))));
        assert!(matches!(game.play_notation("e7e5"), Err(EngineError::IllegalMove(_))));
        assert!(matches!(game.play_notation("nonsense"), Err(EngineError::InvalidNotation(_))));
        assert_eq!(game.position(), &before);
    }

    #[test]
    fn test_matched_move_carries_engine_flags() {
        let mut game = Game::new();
        for notation in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            game.play_notation(notation).unwrap();
        }
        let mv = game.play_notation("e5d6").unwrap();
        assert!(mv.is_en_passant);
        assert!(mv.is_capture());
    }

    #[test]
    fn test_state_after_mate_and_takeback() {
        let mut game = Game::new();
        for notation in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            game.play_notation(notation).unwrap();
        }
        assert_eq!(game.state(), GameState::Checkmate(Color::Black));
        assert!(game.legal_moves().is_empty());

        game.undo();
        assert_eq!(game.state(), GameState::Ongoing);
        assert!(!game.position().is_checkmate());
        assert!(!game.legal_moves().is_empty());
    }
}
