pub mod board;
pub mod console;
pub mod error;
pub mod game;
pub mod movegen;
pub mod notation;

pub use board::{CastleSide, CastlingRights, Color, Piece, PieceKind, Position, Square};
pub use error::{EngineError, Result};
pub use game::Game;
pub use movegen::{GameState, Move};

use log::{debug, warn};

pub fn new_game() -> Position {
    Position::new()
}

/// Legal moves for the side to move; refreshes the checkmate/stalemate flags.
pub fn legal_moves(position: &mut Position) -> Vec<Move> {
    movegen::legal_moves(position)
}

/// Applies `mv` if it matches one of the current legal moves.
///
/// Matching uses move equality (start and end squares); the engine's own copy
/// of the move is the one applied. An unmatched move leaves the position as it
/// was.
pub fn apply_move(position: &mut Position, mv: &Move) -> Result<()> {
    let legal = movegen::legal_moves(position);
    match legal.into_iter().find(|candidate| candidate == mv) {
        Some(matched) => {
            position.make_move(matched);
            debug!("applied {matched}");
            Ok(())
        }
        None => {
            warn!("refusing {mv}: not a legal move for {:?}", position.side_to_move());
            Err(EngineError::IllegalMove(mv.to_string()))
        }
    }
}

pub fn undo(position: &mut Position) {
    position.undo_move();
}

pub fn is_checkmate(position: &Position) -> bool {
    position.is_checkmate()
}

pub fn is_stalemate(position: &Position) -> bool {
    position.is_stalemate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::is_in_check;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn play(position: &mut Position, notation: &str) {
        let (from, to) = notation::parse_move_squares(notation).unwrap();
        let mv = Move::new(from, to, position).unwrap();
        apply_move(position, &mv).unwrap();
    }

    #[test]
    fn test_initial_position() {
        let mut position = new_game();
        let moves = legal_moves(&mut position);

        // 16 pawn moves and 4 knight moves
        assert_eq!(moves.len(), 20);
        let pawn = moves.iter().filter(|mv| mv.piece.kind == PieceKind::Pawn).count();
        let knight = moves.iter().filter(|mv| mv.piece.kind == PieceKind::Knight).count();
        assert_eq!((pawn, knight), (16, 4));
        assert!(!is_checkmate(&position));
        assert!(!is_stalemate(&position));
    }

    #[test]
    fn test_pawn_moves() {
        let mut position = new_game();
        play(&mut position, "e2e4");
        assert_eq!(position.piece_at(sq("e2")), None);
        assert_eq!(position.piece_at(sq("e4")), Some(Piece::new(Color::White, PieceKind::Pawn)));
        assert_eq!(position.en_passant_target(), Some(sq("e3")));

        play(&mut position, "e7e5");
        assert_eq!(position.en_passant_target(), Some(sq("e6")));
        play(&mut position, "g1f3");
        assert_eq!(position.en_passant_target(), None);
    }

    #[test]
    fn test_castling() {
        let mut position = Position::from_layout(
            &[
                "bR -- -- -- bK -- -- bR",
                "bP bP bP -- -- bP bP bP",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "wP wP wP -- -- wP wP wP",
                "wR -- -- -- wK -- -- wR",
            ],
            Color::White,
        )
        .unwrap();

        let moves = legal_moves(&mut position);
        let kingside = moves.iter().find(|mv| mv.is_castle && mv.to == sq("g1"));
        let queenside = moves.iter().find(|mv| mv.is_castle && mv.to == sq("c1"));
        assert!(kingside.is_some());
        assert!(queenside.is_some());

        play(&mut position, "e1g1");
        assert_eq!(position.piece_at(sq("f1")), Some(Piece::new(Color::White, PieceKind::Rook)));
        assert_eq!(position.king_square(Color::White), sq("g1"));

        let moves = legal_moves(&mut position);
        assert!(moves.iter().any(|mv| mv.is_castle && mv.to == sq("c8")));
    }

    #[test]
    fn test_castling_lost_when_king_walks_back() {
        let mut position = Position::from_layout(
            &[
                "-- -- -- bK -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "wR -- -- -- wK -- -- wR",
            ],
            Color::White,
        )
        .unwrap();

        play(&mut position, "e1f1");
        play(&mut position, "d8c8");
        play(&mut position, "f1e1");
        play(&mut position, "c8d8");
        assert_eq!(position.king_square(Color::White), sq("e1"));
        assert!(!position.castling_rights().any(Color::White));
        let moves = legal_moves(&mut position);
        assert!(moves.iter().all(|mv| !mv.is_castle));

        // Taking the moves back restores the rights the king walk removed.
        for _ in 0..4 {
            undo(&mut position);
        }
        let moves = legal_moves(&mut position);
        assert_eq!(moves.iter().filter(|mv| mv.is_castle).count(), 2);
    }

    #[test]
    fn test_en_passant() {
        let mut position = new_game();
        for notation in ["e2e4", "d7d5", "e4e5", "f7f5"] {
            play(&mut position, notation);
        }

        let moves = legal_moves(&mut position);
        let en_passant = moves.iter().find(|mv| mv.is_en_passant && mv.from == sq("e5") && mv.to == sq("f6"));
        assert!(en_passant.is_some());

        play(&mut position, "e5f6");
        assert_eq!(position.piece_at(sq("f5")), None);
        undo(&mut position);
        assert_eq!(position.piece_at(sq("f5")), Some(Piece::new(Color::Black, PieceKind::Pawn)));
        assert_eq!(position.en_passant_target(), Some(sq("f6")));

        // Still available after the take-back.
        let moves = legal_moves(&mut position);
        assert!(moves.iter().any(|mv| mv.is_en_passant && mv.to == sq("f6")));
    }

    #[test]
    fn test_promotion() {
        let mut position = Position::from_layout(
            &[
                "-- -- -- -- -- -- -- bK",
                "wP -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- wK -- -- --",
            ],
            Color::White,
        )
        .unwrap();

        let moves = legal_moves(&mut position);
        let promotions = moves.iter().filter(|mv| mv.is_promotion).count();

        // Queen only
        assert_eq!(promotions, 1);
        play(&mut position, "a7a8");
        assert_eq!(position.piece_at(sq("a8")), Some(Piece::new(Color::White, PieceKind::Queen)));
        assert!(is_in_check(&position, Color::Black));
    }

    #[test]
    fn test_check() {
        let mut position = new_game();
        for notation in ["e2e4", "f7f6", "d1h5"] {
            play(&mut position, notation);
        }
        assert!(is_in_check(&position, Color::Black));
        assert!(!is_in_check(&position, Color::White));

        // Only g7g6 blocks; the king cannot move.
        let moves: Vec<String> = legal_moves(&mut position).iter().map(|mv| mv.to_string()).collect();
        assert_eq!(moves, vec!["g7g6"]);
    }

    #[test]
    fn test_checkmate() {
        let mut position = new_game();
        for notation in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            play(&mut position, notation);
        }
        let moves = legal_moves(&mut position);
        assert!(moves.is_empty());
        assert!(is_checkmate(&position));
        assert!(!is_stalemate(&position));
        assert_eq!(movegen::game_state(&position), GameState::Checkmate(Color::Black));

        // No longer mated once the mating move is taken back.
        undo(&mut position);
        assert!(!legal_moves(&mut position).is_empty());
        assert!(!is_checkmate(&position));
    }

    #[test]
    fn test_stalemate() {
        let mut position = Position::from_layout(
            &[
                "bK -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- wQ -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- --",
                "-- -- -- -- -- -- -- wK",
            ],
            Color::Black,
        )
        .unwrap();

        assert!(!is_in_check(&position, Color::Black));
        let moves = legal_moves(&mut position);
        assert!(moves.is_empty());
        assert!(is_stalemate(&position));
        assert!(!is_checkmate(&position));
        assert_eq!(movegen::game_state(&position), GameState::Stalemate);
    }

    #[test]
    fn test_move_validation() {
        let mut position = new_game();
        let before = position.clone();

        let too_far = Move::new(sq("e2"), sq("e5"), &position).unwrap();
        assert!(matches!(apply_move(&mut position, &too_far), Err(EngineError::IllegalMove(_))));

        let wrong_side = Move::new(sq("e7"), sq("e5"), &position).unwrap();
        assert!(apply_move(&mut position, &wrong_side).is_err());
        assert_eq!(position, before);
    }

    #[test]
    fn test_equal_squares_match_the_legal_move() {
        let mut position = new_game();
        for notation in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            play(&mut position, notation);
        }

        // Built by hand without the en-passant flag; the engine's copy is applied.
        let mut intent = Move::new(sq("e5"), sq("d6"), &position).unwrap();
        intent.is_en_passant = false;
        intent.captured = None;
        apply_move(&mut position, &intent).unwrap();
        assert_eq!(position.piece_at(sq("d5")), None);
        assert!(position.last_move().unwrap().is_en_passant);
    }

    #[test]
    fn test_random_playouts_make_undo_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..20 {
            let mut position = new_game();
            for _ in 0..80 {
                let moves = legal_moves(&mut position);
                let mover = position.side_to_move();
                for mv in &moves {
                    let before = position.clone();
                    position.make_move(*mv);
                    assert!(!is_in_check(&position, mover), "{mv} leaves the king attacked");
                    let king = position
                        .pieces(mover)
                        .find(|(_, piece)| piece.kind == PieceKind::King)
                        .map(|(square, _)| square);
                    assert_eq!(king, Some(position.king_square(mover)));
                    undo(&mut position);
                    assert_eq!(position, before, "{mv} did not undo cleanly");
                }
                let Some(mv) = moves.choose(&mut rng) else {
                    break;
                };
                position.make_move(*mv);
            }
        }
    }

    #[test]
    fn test_perft_initial_position() {
        let mut position = new_game();

        assert_eq!(perft(&mut position, 1), 20);
        assert_eq!(perft(&mut position, 2), 400);
        assert_eq!(perft(&mut position, 3), 8902);
        assert!(position.history().is_empty());
        assert_eq!(position.to_string(), new_game().to_string());
    }

    fn perft(position: &mut Position, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = legal_moves(position);
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for mv in moves {
            position.make_move(mv);
            nodes += perft(position, depth - 1);
            position.undo_move();
        }

        nodes
    }
}
