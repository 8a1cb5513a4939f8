use log::{debug, trace};

use crate::board::{CastleSide, Color, Piece, PieceKind, Position, Square, KING_HOME_COL};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A move together with the facts about it that held when it was built.
///
/// Equality only looks at the start and end squares, so a move built from two
/// clicked squares matches the generated move it stands for.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub is_promotion: bool,
    pub is_en_passant: bool,
    pub is_castle: bool,
}

impl Move {
    /// Builds the move of whatever stands on `from`, or `None` if it is empty.
    pub fn new(from: Square, to: Square, position: &Position) -> Option<Self> {
        let piece = position.piece_at(from)?;
        Some(Self::with_piece(from, to, piece, position))
    }

    fn with_piece(from: Square, to: Square, piece: Piece, position: &Position) -> Self {
        let is_pawn = piece.kind == PieceKind::Pawn;
        let is_en_passant = is_pawn
            && from.col() != to.col()
            && position.en_passant_target() == Some(to)
            && position.piece_at(to).is_none();
        let captured = if is_en_passant {
            position.piece_at(en_passant_victim(from, to))
        } else {
            position.piece_at(to)
        };
        Self {
            from,
            to,
            piece,
            captured,
            is_promotion: is_pawn && to.row() == piece.color.opposite().back_rank(),
            is_en_passant,
            is_castle: piece.kind == PieceKind::King && from.col().abs_diff(to.col()) == 2,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Square of the pawn taken by an en-passant capture.
    pub(crate) fn en_passant_victim(&self) -> Square {
        en_passant_victim(self.from, self.to)
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

/// The pawn taken en passant stands beside the capturer, behind its landing square.
fn en_passant_victim(from: Square, to: Square) -> Square {
    Square::at(from.row(), to.col())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Check(Color),     // Color is the side in check
    Checkmate(Color), // Color is the winner
    Stalemate,
}

/// Moves obeying piece geometry for `color`, ignoring king safety and castling.
pub fn pseudo_legal_moves(position: &Position, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();
    for (from, piece) in position.pieces(color) {
        piece_moves(position, from, piece, &mut moves);
    }
    moves
}

fn piece_moves(position: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    match piece.kind {
        PieceKind::Pawn => pawn_moves(position, from, piece, moves),
        PieceKind::Knight => step_moves(position, from, piece, &KNIGHT_OFFSETS, moves),
        PieceKind::Bishop => slide_moves(position, from, piece, &DIAGONALS, moves),
        PieceKind::Rook => slide_moves(position, from, piece, &ORTHOGONALS, moves),
        PieceKind::Queen => {
            slide_moves(position, from, piece, &DIAGONALS, moves);
            slide_moves(position, from, piece, &ORTHOGONALS, moves);
        }
        PieceKind::King => step_moves(position, from, piece, &KING_OFFSETS, moves),
    }
}

fn pawn_moves(position: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    let forward = piece.color.forward();

    if let Some(one) = from.offset(forward, 0) {
        if position.piece_at(one).is_none() {
            moves.push(Move::with_piece(from, one, piece, position));
            if from.row() == piece.color.pawn_rank() {
                if let Some(two) = one.offset(forward, 0) {
                    if position.piece_at(two).is_none() {
                        moves.push(Move::with_piece(from, two, piece, position));
                    }
                }
            }
        }
    }

    for to in pawn_attacks(from, piece.color) {
        match position.piece_at(to) {
            Some(target) if target.color != piece.color => {
                moves.push(Move::with_piece(from, to, piece, position));
            }
            None if position.en_passant_target() == Some(to) => {
                let victim = position.piece_at(en_passant_victim(from, to));
                if victim == Some(Piece::new(piece.color.opposite(), PieceKind::Pawn)) {
                    moves.push(Move::with_piece(from, to, piece, position));
                }
            }
            _ => {}
        }
    }
}

fn pawn_attacks(from: Square, color: Color) -> impl Iterator<Item = Square> {
    [-1i8, 1]
        .into_iter()
        .filter_map(move |d_col| from.offset(color.forward(), d_col))
}

fn step_moves(
    position: &Position,
    from: Square,
    piece: Piece,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(d_row, d_col) in offsets {
        let Some(to) = from.offset(d_row, d_col) else {
            continue;
        };
        match position.piece_at(to) {
            Some(occupant) if occupant.color == piece.color => {}
            _ => moves.push(Move::with_piece(from, to, piece, position)),
        }
    }
}

fn slide_moves(
    position: &Position,
    from: Square,
    piece: Piece,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(d_row, d_col) in directions {
        let mut current = from;
        while let Some(to) = current.offset(d_row, d_col) {
            match position.piece_at(to) {
                None => moves.push(Move::with_piece(from, to, piece, position)),
                Some(occupant) => {
                    if occupant.color != piece.color {
                        moves.push(Move::with_piece(from, to, piece, position));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

/// True if a piece of `by` could capture on `square`.
///
/// Pawns attack their two diagonals whether or not anything stands there, and
/// pawn pushes never count.
pub fn is_square_attacked(position: &Position, square: Square, by: Color) -> bool {
    let mut moves = Vec::new();
    for (from, piece) in position.pieces(by) {
        if piece.kind == PieceKind::Pawn {
            if pawn_attacks(from, by).any(|target| target == square) {
                return true;
            }
            continue;
        }
        moves.clear();
        piece_moves(position, from, piece, &mut moves);
        if moves.iter().any(|mv| mv.to == square) {
            return true;
        }
    }
    false
}

pub fn is_in_check(position: &Position, color: Color) -> bool {
    is_square_attacked(position, position.king_square(color), color.opposite())
}

/// Castle moves available to `color`, with every precondition but the final
/// king-safety check, which the legality filter applies to all candidates.
pub fn castle_moves(position: &Position, color: Color, moves: &mut Vec<Move>) {
    let rights = position.castling_rights();
    if !rights.any(color) {
        return;
    }
    let row = color.back_rank();
    let king_from = Square::at(row, KING_HOME_COL);
    let king = Piece::new(color, PieceKind::King);
    if position.king_square(color) != king_from || position.piece_at(king_from) != Some(king) {
        return;
    }
    let enemy = color.opposite();
    if is_square_attacked(position, king_from, enemy) {
        return;
    }

    for side in [CastleSide::Kingside, CastleSide::Queenside] {
        if !rights.get(color, side) {
            continue;
        }
        let rook = Some(Piece::new(color, PieceKind::Rook));
        if position.piece_at(Square::at(row, side.rook_col())) != rook {
            continue;
        }
        let path_clear = side
            .between_cols()
            .all(|col| position.piece_at(Square::at(row, col)).is_none());
        if !path_clear {
            continue;
        }
        let path_attacked = side
            .king_path_cols()
            .iter()
            .any(|&col| is_square_attacked(position, Square::at(row, col), enemy));
        if path_attacked {
            continue;
        }
        let king_to = Square::at(row, side.king_target_col());
        moves.push(Move::with_piece(king_from, king_to, king, position));
    }
}

/// Legal moves for the side to move. Also refreshes the checkmate and
/// stalemate flags on `position`.
pub fn legal_moves(position: &mut Position) -> Vec<Move> {
    let color = position.side_to_move();
    let saved_en_passant = position.en_passant_target();
    let saved_rights = position.castling_rights();

    let mut candidates = pseudo_legal_moves(position, color);
    castle_moves(position, color, &mut candidates);

    let mut legal = Vec::with_capacity(candidates.len());
    for mv in candidates {
        position.make_move(mv);
        let exposes_king = is_in_check(position, color);
        position.undo_move();
        if exposes_king {
            trace!("dropping {mv}: leaves the {color:?} king attacked");
        } else {
            legal.push(mv);
        }
    }
    position.restore_transient(saved_en_passant, saved_rights);

    if legal.is_empty() {
        let in_check = is_in_check(position, color);
        position.set_terminal(in_check, !in_check);
        if in_check {
            debug!("checkmate, {:?} wins", color.opposite());
        } else {
            debug!("stalemate, {color:?} has no moves");
        }
    } else {
        position.set_terminal(false, false);
    }
    legal
}

/// Summary of the position as of the last legal-move generation.
pub fn game_state(position: &Position) -> GameState {
    let side = position.side_to_move();
    if position.is_checkmate() {
        GameState::Checkmate(side.opposite())
    } else if position.is_stalemate() {
        GameState::Stalemate
    } else if is_in_check(position, side) {
        GameState::Check(side)
    } else {
        GameState::Ongoing
    }
}
