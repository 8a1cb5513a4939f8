use std::fmt;

use log::trace;

use crate::error::{EngineError, Result};
use crate::movegen::{self, Move};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn letter(&self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn from_letter(letter: char) -> Option<PieceKind> {
        match letter {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row step of a pawn advance. White plays up the board towards row 0.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn back_rank(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn pawn_rank(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    fn letter(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// Two-character code such as `wP` or `bK`.
    pub fn code(&self) -> String {
        format!("{}{}", self.color.letter(), self.kind.letter())
    }

    /// Parses a two-character code. `--` is the empty square.
    pub fn from_code(code: &str) -> Result<Option<Piece>> {
        if code == "--" {
            return Ok(None);
        }
        let mut chars = code.chars();
        let (Some(color), Some(kind), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(EngineError::InvalidLayout(format!("bad piece code `{code}`")));
        };
        let color = match color {
            'w' => Color::White,
            'b' => Color::Black,
            _ => return Err(EngineError::InvalidLayout(format!("bad piece colour in `{code}`"))),
        };
        let kind = PieceKind::from_letter(kind)
            .ok_or_else(|| EngineError::InvalidLayout(format!("bad piece kind in `{code}`")))?;
        Ok(Some(Piece::new(color, kind)))
    }
}

/// A board coordinate. Row 0 is black's back rank, column 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    pub fn new(row: u8, col: u8) -> Option<Square> {
        if row < 8 && col < 8 {
            Some(Square { row, col })
        } else {
            None
        }
    }

    /// Panics on coordinates off the board; only for values known to be in range.
    pub(crate) const fn at(row: u8, col: u8) -> Square {
        assert!(row < 8 && col < 8);
        Square { row, col }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Square> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square { row: row as u8, col: col as u8 })
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..8).flat_map(|row| (0..8).map(move |col| Square { row, col }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub fn of_king_move(from: Square, to: Square) -> CastleSide {
        if to.col() > from.col() {
            CastleSide::Kingside
        } else {
            CastleSide::Queenside
        }
    }

    pub fn rook_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 7,
            CastleSide::Queenside => 0,
        }
    }

    pub fn rook_target_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 5,
            CastleSide::Queenside => 3,
        }
    }

    pub fn king_target_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 6,
            CastleSide::Queenside => 2,
        }
    }

    /// Columns strictly between the king and the rook.
    pub fn between_cols(&self) -> std::ops::Range<u8> {
        match self {
            CastleSide::Kingside => 5..7,
            CastleSide::Queenside => 1..4,
        }
    }

    /// Columns the king crosses or lands on, which must not be attacked.
    pub fn king_path_cols(&self) -> [u8; 2] {
        match self {
            CastleSide::Kingside => [5, 6],
            CastleSide::Queenside => [3, 2],
        }
    }

    pub(crate) fn rook_home(&self, color: Color) -> Square {
        Square::at(color.back_rank(), self.rook_col())
    }
}

pub(crate) const KING_HOME_COL: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub fn get(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside,
            (Color::White, CastleSide::Queenside) => self.white_queenside,
            (Color::Black, CastleSide::Kingside) => self.black_kingside,
            (Color::Black, CastleSide::Queenside) => self.black_queenside,
        }
    }

    pub fn any(&self, color: Color) -> bool {
        self.get(color, CastleSide::Kingside) || self.get(color, CastleSide::Queenside)
    }

    fn set(&mut self, color: Color, side: CastleSide, value: bool) {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside = value,
            (Color::White, CastleSide::Queenside) => self.white_queenside = value,
            (Color::Black, CastleSide::Kingside) => self.black_kingside = value,
            (Color::Black, CastleSide::Queenside) => self.black_queenside = value,
        }
    }

    fn clear(&mut self, color: Color, side: CastleSide) {
        self.set(color, side, false);
    }
}

/// One undo record: the applied move and the state it overwrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<Square>,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: [[Option<Piece>; 8]; 8],
    side_to_move: Color,
    white_king: Square,
    black_king: Square,
    castling_rights: CastlingRights,
    en_passant_target: Option<Square>,
    history: Vec<HistoryEntry>,
    checkmate: bool,
    stalemate: bool,
}

impl Position {
    pub fn new() -> Self {
        let mut board = [[None; 8]; 8];
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            board[0][col] = Some(Piece::new(Color::Black, kind));
            board[1][col] = Some(Piece::new(Color::Black, PieceKind::Pawn));
            board[6][col] = Some(Piece::new(Color::White, PieceKind::Pawn));
            board[7][col] = Some(Piece::new(Color::White, kind));
        }
        Self {
            board,
            side_to_move: Color::White,
            white_king: Square::at(Color::White.back_rank(), KING_HOME_COL),
            black_king: Square::at(Color::Black.back_rank(), KING_HOME_COL),
            castling_rights: CastlingRights::ALL,
            en_passant_target: None,
            history: Vec::new(),
            checkmate: false,
            stalemate: false,
        }
    }

    /// Builds a position from eight rows of space-separated piece codes,
    /// row 0 first. Castling rights are granted wherever king and rook still
    /// stand on their original squares. The side that just moved may not be
    /// left in check.
    pub fn from_layout(rows: &[&str], side_to_move: Color) -> Result<Self> {
        if rows.len() != 8 {
            return Err(EngineError::InvalidLayout(format!("expected 8 rows, got {}", rows.len())));
        }
        let mut board = [[None; 8]; 8];
        let mut white_king = None;
        let mut black_king = None;
        for (row, line) in rows.iter().enumerate() {
            let codes: Vec<&str> = line.split_whitespace().collect();
            if codes.len() != 8 {
                return Err(EngineError::InvalidLayout(format!(
                    "row {row} has {} squares",
                    codes.len()
                )));
            }
            for (col, code) in codes.into_iter().enumerate() {
                let piece = Piece::from_code(code)?;
                if let Some(Piece { color, kind: PieceKind::King }) = piece {
                    let slot = match color {
                        Color::White => &mut white_king,
                        Color::Black => &mut black_king,
                    };
                    if slot.is_some() {
                        return Err(EngineError::InvalidLayout(format!("more than one {color:?} king")));
                    }
                    *slot = Some(Square::at(row as u8, col as u8));
                }
                board[row][col] = piece;
            }
        }
        let (Some(white_king), Some(black_king)) = (white_king, black_king) else {
            return Err(EngineError::InvalidLayout("both kings must be on the board".to_string()));
        };

        let mut position = Self {
            board,
            side_to_move,
            white_king,
            black_king,
            castling_rights: CastlingRights::default(),
            en_passant_target: None,
            history: Vec::new(),
            checkmate: false,
            stalemate: false,
        };
        for color in [Color::White, Color::Black] {
            let king_home = Square::at(color.back_rank(), KING_HOME_COL);
            if position.king_square(color) != king_home {
                continue;
            }
            for side in [CastleSide::Kingside, CastleSide::Queenside] {
                let rook = Some(Piece::new(color, PieceKind::Rook));
                if position.piece_at(side.rook_home(color)) == rook {
                    position.castling_rights.set(color, side, true);
                }
            }
        }

        let waiting = side_to_move.opposite();
        if movegen::is_in_check(&position, waiting) {
            return Err(EngineError::InvalidLayout(format!(
                "{waiting:?} is in check but {side_to_move:?} is to move"
            )));
        }
        Ok(position)
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.row() as usize][square.col() as usize]
    }

    fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        self.board[square.row() as usize][square.col() as usize] = piece;
    }

    /// Every occupied square holding a piece of `color`, in rank-major order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| match self.piece_at(square) {
            Some(piece) if piece.color == color => Some((square, piece)),
            _ => None,
        })
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn king_square(&self, color: Color) -> Square {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|entry| entry.mv)
    }

    /// Valid only as of the last legal-move generation.
    pub fn is_checkmate(&self) -> bool {
        self.checkmate
    }

    /// Valid only as of the last legal-move generation.
    pub fn is_stalemate(&self) -> bool {
        self.stalemate
    }

    pub(crate) fn set_terminal(&mut self, checkmate: bool, stalemate: bool) {
        self.checkmate = checkmate;
        self.stalemate = stalemate;
    }

    pub(crate) fn restore_transient(
        &mut self,
        en_passant_target: Option<Square>,
        castling_rights: CastlingRights,
    ) {
        self.en_passant_target = en_passant_target;
        self.castling_rights = castling_rights;
    }

    fn set_king_square(&mut self, color: Color, square: Square) {
        match color {
            Color::White => self.white_king = square,
            Color::Black => self.black_king = square,
        }
    }

    /// Applies `mv` without any legality check.
    pub fn make_move(&mut self, mv: Move) {
        let color = mv.piece.color;
        self.history.push(HistoryEntry {
            mv,
            castling_rights: self.castling_rights,
            en_passant_target: self.en_passant_target,
        });

        self.set_piece(mv.from, None);
        let placed = if mv.is_promotion {
            Piece::new(color, PieceKind::Queen)
        } else {
            mv.piece
        };
        self.set_piece(mv.to, Some(placed));

        if mv.is_en_passant {
            self.set_piece(mv.en_passant_victim(), None);
        }

        if mv.is_castle {
            let side = CastleSide::of_king_move(mv.from, mv.to);
            let row = mv.from.row();
            let rook = self.piece_at(Square::at(row, side.rook_col()));
            self.set_piece(Square::at(row, side.rook_col()), None);
            self.set_piece(Square::at(row, side.rook_target_col()), rook);
        }

        if mv.piece.kind == PieceKind::King {
            self.set_king_square(color, mv.to);
        }

        self.en_passant_target = if mv.piece.kind == PieceKind::Pawn
            && mv.from.row().abs_diff(mv.to.row()) == 2
        {
            Some(Square::at((mv.from.row() + mv.to.row()) / 2, mv.from.col()))
        } else {
            None
        };

        self.update_castling_rights(&mv);
        self.side_to_move = self.side_to_move.opposite();
        trace!("made {mv}, {:?} to move", self.side_to_move);
    }

    fn update_castling_rights(&mut self, mv: &Move) {
        if mv.piece.kind == PieceKind::King {
            self.castling_rights.clear(mv.piece.color, CastleSide::Kingside);
            self.castling_rights.clear(mv.piece.color, CastleSide::Queenside);
        }
        // A rook leaving its corner, or anything landing there, ends that right.
        for color in [Color::White, Color::Black] {
            for side in [CastleSide::Kingside, CastleSide::Queenside] {
                let home = side.rook_home(color);
                if mv.from == home || mv.to == home {
                    self.castling_rights.clear(color, side);
                }
            }
        }
    }

    /// Takes back the last move. Returns `None` when there is nothing to undo.
    pub fn undo_move(&mut self) -> Option<Move> {
        let entry = self.history.pop()?;
        let mv = entry.mv;

        self.set_piece(mv.from, Some(mv.piece));
        if mv.is_en_passant {
            self.set_piece(mv.to, None);
            self.set_piece(mv.en_passant_victim(), mv.captured);
        } else {
            self.set_piece(mv.to, mv.captured);
        }

        if mv.is_castle {
            let side = CastleSide::of_king_move(mv.from, mv.to);
            let row = mv.from.row();
            let rook = self.piece_at(Square::at(row, side.rook_target_col()));
            self.set_piece(Square::at(row, side.rook_target_col()), None);
            self.set_piece(Square::at(row, side.rook_col()), rook);
        }

        if mv.piece.kind == PieceKind::King {
            self.set_king_square(mv.piece.color, mv.from);
        }

        self.castling_rights = entry.castling_rights;
        self.en_passant_target = entry.en_passant_target;
        self.side_to_move = mv.piece.color;
        trace!("undid {mv}");
        Some(mv)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..8u8 {
            write!(f, "{} ", 8 - row)?;
            for col in 0..8u8 {
                let code = match self.piece_at(Square::at(row, col)) {
                    Some(piece) => piece.code(),
                    None => "--".to_string(),
                };
                if col < 7 {
                    write!(f, "{code} ")?;
                } else {
                    writeln!(f, "{code}")?;
                }
            }
        }
        write!(f, "  a  b  c  d  e  f  g  h")
    }
}
