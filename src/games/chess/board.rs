//! Mailbox board representation and attack detection.

use crate::{Coord, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn player(self) -> Player {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn from_player(player: Player) -> Self {
        if player == 1 {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank direction pawns of this color advance in.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Material value in pawns. The king is not counted.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight | PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Some(match c.to_ascii_uppercase() {
            'P' => PieceKind::Pawn,
            'N' => PieceKind::Knight,
            'B' => PieceKind::Bishop,
            'R' => PieceKind::Rook,
            'Q' => PieceKind::Queen,
            'K' => PieceKind::King,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter: uppercase for white.
    pub fn to_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Self { color, kind })
    }
}

/// Square index `rank * 8 + file`, a1 = 0 and h8 = 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square(u8);

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then(|| Square(rank * 8 + file))
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < 64).then_some(Square(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> u8 {
        self.0 % 8
    }

    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let f = self.file() as i8 + df;
        let r = self.rank() as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Square((r * 8 + f) as u8))
        } else {
            None
        }
    }

    /// Screen coordinate with rank 8 on row 0.
    pub fn to_coord(self) -> Coord {
        ((7 - self.rank()) as usize, self.file() as usize)
    }

    pub fn from_coord((row, col): Coord) -> Option<Self> {
        if row < 8 && col < 8 {
            Square::new(col as u8, 7 - row as u8)
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(format!("bad square {:?}", s));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| format!("bad square {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king: bool,
    pub white_queen: bool,
    pub black_king: bool,
    pub black_queen: bool,
}

impl CastlingRights {
    pub const ALL: Self = Self {
        white_king: true,
        white_queen: true,
        black_king: true,
        black_queen: true,
    };

    pub fn king_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }

    pub fn queen_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queen,
            Color::Black => self.black_queen,
        }
    }

    pub fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_king = false;
                self.white_queen = false;
            }
            Color::Black => {
                self.black_king = false;
                self.black_queen = false;
            }
        }
    }

    /// Drops the right tied to a rook corner when anything moves from or to it.
    pub fn touch(&mut self, sq: Square) {
        match sq.index() {
            0 => self.white_queen = false,
            7 => self.white_king = false,
            56 => self.black_queen = false,
            63 => self.black_king = false,
            _ => {}
        }
    }
}

pub(crate) const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2),
    (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];
pub(crate) const KING_STEPS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1),
    (-1, 0), (-1, -1), (0, -1), (1, -1),
];
pub(crate) const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Everything needed to generate moves: placement, side to move, castling
/// rights, en passant target and the move clocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub(crate) squares: Vec<Option<Piece>>,
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Position {
    pub fn empty() -> Self {
        Self {
            squares: vec![None; 64],
            side_to_move: Color::White,
            castling: CastlingRights::default(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn startpos() -> Self {
        use PieceKind::*;
        let mut pos = Self::empty();
        let back = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        for (file, kind) in back.into_iter().enumerate() {
            let file = file as u8;
            pos.put(Square(file), Some(Piece::new(Color::White, kind)));
            pos.put(Square(8 + file), Some(Piece::new(Color::White, Pawn)));
            pos.put(Square(48 + file), Some(Piece::new(Color::Black, Pawn)));
            pos.put(Square(56 + file), Some(Piece::new(Color::Black, kind)));
        }
        pos.castling = CastlingRights::ALL;
        pos
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    pub fn put(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| *p == Piece::new(color, PieceKind::King))
            .map(|(sq, _)| sq)
    }

    /// True if any piece of `by` attacks `sq`.
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        let holds = |s: Option<Square>, kinds: &[PieceKind]| {
            s.and_then(|s| self.piece_at(s))
                .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
        };

        let back = -by.forward();
        if holds(sq.offset(1, back), &[PieceKind::Pawn]) || holds(sq.offset(-1, back), &[PieceKind::Pawn]) {
            return true;
        }
        if KNIGHT_STEPS.iter().any(|&(df, dr)| holds(sq.offset(df, dr), &[PieceKind::Knight])) {
            return true;
        }
        if KING_STEPS.iter().any(|&(df, dr)| holds(sq.offset(df, dr), &[PieceKind::King])) {
            return true;
        }
        let slides = |dirs: &[(i8, i8)], kinds: &[PieceKind]| {
            dirs.iter().any(|&(df, dr)| {
                let mut cur = sq.offset(df, dr);
                while let Some(s) = cur {
                    if let Some(p) = self.piece_at(s) {
                        return p.color == by && kinds.contains(&p.kind);
                    }
                    cur = s.offset(df, dr);
                }
                false
            })
        };
        slides(&ROOK_DIRS, &[PieceKind::Rook, PieceKind::Queen])
            || slides(&BISHOP_DIRS, &[PieceKind::Bishop, PieceKind::Queen])
    }

    pub fn in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|k| self.is_attacked(k, color.opposite()))
    }

    /// Neither side can possibly mate: bare kings, a single minor piece, or
    /// only bishops all on one square color.
    pub fn insufficient_material(&self) -> bool {
        let others: Vec<(Square, Piece)> = self.pieces().filter(|(_, p)| p.kind != PieceKind::King).collect();
        match others.as_slice() {
            [] => true,
            [(_, p)] => matches!(p.kind, PieceKind::Knight | PieceKind::Bishop),
            many => {
                let shade = |sq: &Square| (sq.file() + sq.rank()) % 2;
                many.iter().all(|(_, p)| p.kind == PieceKind::Bishop)
                    && many.iter().all(|(sq, _)| shade(sq) == shade(&many[0].0))
            }
        }
    }

    /// Material balance in pawns from `color`'s side.
    pub fn material(&self, color: Color) -> i32 {
        self.pieces()
            .map(|(_, p)| if p.color == color { p.kind.value() } else { -p.kind.value() })
            .sum()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let c = Square::new(file, rank)
                    .and_then(|sq| self.piece_at(sq))
                    .map_or('.', Piece::to_char);
                write!(f, "{} ", c)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn square_names_round_trip() {
        assert_eq!(sq("a1").index(), 0);
        assert_eq!(sq("h8").index(), 63);
        assert_eq!(sq("e4").to_string(), "e4");
        assert!("i9".parse::<Square>().is_err());
        assert_eq!(sq("a8").to_coord(), (0, 0));
        assert_eq!(Square::from_coord((7, 4)), Some(sq("e1")));
    }

    #[test]
    fn start_position_is_quiet() {
        let pos = Position::startpos();
        assert!(!pos.in_check(Color::White));
        assert!(!pos.in_check(Color::Black));
        assert_eq!(pos.material(Color::White), 0);
        assert!(pos.is_attacked(sq("f3"), Color::White));
        assert!(!pos.is_attacked(sq("e4"), Color::White));
    }

    #[test]
    fn pawn_attacks_point_forward() {
        let mut pos = Position::empty();
        pos.put(sq("e4"), Some(Piece::new(Color::White, PieceKind::Pawn)));
        assert!(pos.is_attacked(sq("d5"), Color::White));
        assert!(pos.is_attacked(sq("f5"), Color::White));
        assert!(!pos.is_attacked(sq("d3"), Color::White));
    }

    #[test]
    fn sliders_are_blocked() {
        let mut pos = Position::empty();
        pos.put(sq("a1"), Some(Piece::new(Color::Black, PieceKind::Rook)));
        assert!(pos.is_attacked(sq("a8"), Color::Black));
        pos.put(sq("a4"), Some(Piece::new(Color::White, PieceKind::Pawn)));
        assert!(!pos.is_attacked(sq("a8"), Color::Black));
        assert!(pos.is_attacked(sq("a4"), Color::Black));
    }

    #[test]
    fn detects_insufficient_material() {
        let mut pos = Position::empty();
        pos.put(sq("e1"), Some(Piece::new(Color::White, PieceKind::King)));
        pos.put(sq("e8"), Some(Piece::new(Color::Black, PieceKind::King)));
        assert!(pos.insufficient_material());
        pos.put(sq("c1"), Some(Piece::new(Color::White, PieceKind::Bishop)));
        assert!(pos.insufficient_material());
        pos.put(sq("f8"), Some(Piece::new(Color::Black, PieceKind::Bishop)));
        assert!(pos.insufficient_material());
        pos.put(sq("a2"), Some(Piece::new(Color::White, PieceKind::Pawn)));
        assert!(!pos.insufficient_material());
    }
}
