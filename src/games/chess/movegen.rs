//! Legal move generation, move application and SAN notation.

use super::board::{Color, Piece, PieceKind, Position, Square, BISHOP_DIRS, KING_STEPS, KNIGHT_STEPS, ROOK_DIRS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PROMOTIONS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl ChessMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to, promotion: None }
    }

    pub fn with_promotion(self, kind: PieceKind) -> Self {
        Self {
            promotion: Some(kind),
            ..self
        }
    }
}

/// Long algebraic form, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

impl FromStr for ChessMove {
    type Err = String;

    /// Accepts `e2e4`, `e2-e4` and `e7e8q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clean: String = s.trim().chars().filter(|c| *c != '-').collect();
        if !clean.is_ascii() || (clean.len() != 4 && clean.len() != 5) {
            return Err(format!("Expected a move like e2e4, got {:?}", s));
        }
        let from = clean[0..2].parse::<Square>()?;
        let to = clean[2..4].parse::<Square>()?;
        let promotion = match clean[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_letter(c) {
                Some(k) if PROMOTIONS.contains(&k) => Some(k),
                _ => return Err(format!("bad promotion piece {:?}", c)),
            },
        };
        Ok(ChessMove { from, to, promotion })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastleSide {
    King,
    Queen,
}

/// What applying a move changed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDetails {
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub castle: Option<CastleSide>,
    pub en_passant: bool,
    pub promotion: Option<PieceKind>,
}

/// Moves that follow piece movement rules, ignoring whether the own king is left in check.
pub fn pseudo_legal_moves(pos: &Position) -> Vec<ChessMove> {
    let us = pos.side_to_move;
    let mut moves = Vec::with_capacity(48);
    for (from, piece) in pos.pieces().filter(|(_, p)| p.color == us) {
        match piece.kind {
            PieceKind::Pawn => pawn_moves(pos, from, us, &mut moves),
            PieceKind::Knight => steps(pos, from, us, &KNIGHT_STEPS, &mut moves),
            PieceKind::Bishop => slides(pos, from, us, &BISHOP_DIRS, &mut moves),
            PieceKind::Rook => slides(pos, from, us, &ROOK_DIRS, &mut moves),
            PieceKind::Queen => {
                slides(pos, from, us, &ROOK_DIRS, &mut moves);
                slides(pos, from, us, &BISHOP_DIRS, &mut moves);
            }
            PieceKind::King => {
                steps(pos, from, us, &KING_STEPS, &mut moves);
                castling_moves(pos, from, us, &mut moves);
            }
        }
    }
    moves
}

/// Pseudo-legal moves that do not leave the mover's king attacked.
pub fn legal_moves(pos: &Position) -> Vec<ChessMove> {
    let us = pos.side_to_move;
    pseudo_legal_moves(pos)
        .into_iter()
        .filter(|mv| {
            let mut next = pos.clone();
            apply(&mut next, mv);
            !next.in_check(us)
        })
        .collect()
}

fn pawn_moves(pos: &Position, from: Square, us: Color, out: &mut Vec<ChessMove>) {
    let fwd = us.forward();
    let last_rank = us.opposite().back_rank();
    let start_rank = if us == Color::White { 1 } else { 6 };
    let push = |to: Square, out: &mut Vec<ChessMove>| {
        if to.rank() == last_rank {
            out.extend(PROMOTIONS.iter().map(|&k| ChessMove::new(from, to).with_promotion(k)));
        } else {
            out.push(ChessMove::new(from, to));
        }
    };

    if let Some(one) = from.offset(0, fwd).filter(|s| pos.piece_at(*s).is_none()) {
        push(one, out);
        if from.rank() == start_rank {
            if let Some(two) = one.offset(0, fwd).filter(|s| pos.piece_at(*s).is_none()) {
                push(two, out);
            }
        }
    }
    for df in [-1, 1] {
        if let Some(to) = from.offset(df, fwd) {
            let enemy = pos.piece_at(to).is_some_and(|p| p.color != us);
            if enemy || pos.en_passant == Some(to) {
                push(to, out);
            }
        }
    }
}

fn steps(pos: &Position, from: Square, us: Color, deltas: &[(i8, i8)], out: &mut Vec<ChessMove>) {
    for &(df, dr) in deltas {
        if let Some(to) = from.offset(df, dr) {
            if pos.piece_at(to).map_or(true, |p| p.color != us) {
                out.push(ChessMove::new(from, to));
            }
        }
    }
}

fn slides(pos: &Position, from: Square, us: Color, dirs: &[(i8, i8)], out: &mut Vec<ChessMove>) {
    for &(df, dr) in dirs {
        let mut cur = from.offset(df, dr);
        while let Some(to) = cur {
            match pos.piece_at(to) {
                None => out.push(ChessMove::new(from, to)),
                Some(p) => {
                    if p.color != us {
                        out.push(ChessMove::new(from, to));
                    }
                    break;
                }
            }
            cur = to.offset(df, dr);
        }
    }
}

fn castling_moves(pos: &Position, from: Square, us: Color, out: &mut Vec<ChessMove>) {
    let rank = us.back_rank();
    let at = |file: u8| Square::new(file, rank);
    if Some(from) != at(4) || pos.in_check(us) {
        return;
    }
    let rook = Some(Piece::new(us, PieceKind::Rook));
    let empty = |files: &[u8]| files.iter().all(|&f| at(f).is_some_and(|s| pos.piece_at(s).is_none()));
    let safe = |files: &[u8]| files.iter().all(|&f| at(f).is_some_and(|s| !pos.is_attacked(s, us.opposite())));

    if pos.castling.king_side(us) && at(7).and_then(|s| pos.piece_at(s)) == rook && empty(&[5, 6]) && safe(&[5, 6]) {
        if let Some(to) = at(6) {
            out.push(ChessMove::new(from, to));
        }
    }
    if pos.castling.queen_side(us) && at(0).and_then(|s| pos.piece_at(s)) == rook && empty(&[1, 2, 3]) && safe(&[2, 3]) {
        if let Some(to) = at(2) {
            out.push(ChessMove::new(from, to));
        }
    }
}

/// Plays `mv` on `pos` without checking legality.
///
/// Returns `None`, leaving the position untouched, if `from` is empty.
pub fn apply(pos: &mut Position, mv: &ChessMove) -> Option<MoveDetails> {
    let piece = pos.piece_at(mv.from)?;
    let us = piece.color;
    let mut captured = pos.piece_at(mv.to);
    let mut en_passant = false;
    let mut castle = None;

    if piece.kind == PieceKind::Pawn && captured.is_none() && mv.from.file() != mv.to.file() && pos.en_passant == Some(mv.to) {
        if let Some(victim) = Square::new(mv.to.file(), mv.from.rank()) {
            captured = pos.piece_at(victim);
            pos.put(victim, None);
            en_passant = true;
        }
    }

    pos.put(mv.from, None);
    let placed = match mv.promotion {
        Some(kind) if piece.kind == PieceKind::Pawn => Piece::new(us, kind),
        _ => piece,
    };
    pos.put(mv.to, Some(placed));

    if piece.kind == PieceKind::King {
        let rank = mv.from.rank();
        let rook_hop = match mv.to.file() as i8 - mv.from.file() as i8 {
            2 => Some((CastleSide::King, 7, 5)),
            -2 => Some((CastleSide::Queen, 0, 3)),
            _ => None,
        };
        if let Some((side, rook_from, rook_to)) = rook_hop {
            if let (Some(rf), Some(rt)) = (Square::new(rook_from, rank), Square::new(rook_to, rank)) {
                let rook = pos.piece_at(rf);
                pos.put(rf, None);
                pos.put(rt, rook);
                castle = Some(side);
            }
        }
        pos.castling.clear(us);
    }
    pos.castling.touch(mv.from);
    pos.castling.touch(mv.to);

    pos.en_passant = None;
    if piece.kind == PieceKind::Pawn && (mv.to.rank() as i8 - mv.from.rank() as i8).abs() == 2 {
        pos.en_passant = mv.from.offset(0, us.forward());
    }

    if piece.kind == PieceKind::Pawn || captured.is_some() {
        pos.halfmove_clock = 0;
    } else {
        pos.halfmove_clock += 1;
    }
    if us == Color::Black {
        pos.fullmove_number += 1;
    }
    pos.side_to_move = us.opposite();

    Some(MoveDetails {
        piece,
        captured,
        castle,
        en_passant,
        promotion: if placed != piece { Some(placed.kind) } else { None },
    })
}

/// Standard algebraic notation of a legal `mv` played from `pos`, with `+` or `#`.
pub fn san(pos: &Position, mv: &ChessMove) -> String {
    let Some(piece) = pos.piece_at(mv.from) else {
        return mv.to_string();
    };
    let mut out = String::new();
    let file_char = |s: Square| (b'a' + s.file()) as char;
    let is_castle = piece.kind == PieceKind::King && (mv.to.file() as i8 - mv.from.file() as i8).abs() == 2;

    if is_castle {
        out.push_str(if mv.to.file() == 6 { "O-O" } else { "O-O-O" });
    } else {
        let capture = pos.piece_at(mv.to).is_some()
            || (piece.kind == PieceKind::Pawn && mv.from.file() != mv.to.file());
        if piece.kind == PieceKind::Pawn {
            if capture {
                out.push(file_char(mv.from));
            }
        } else {
            out.push(piece.kind.letter());
            let rivals: Vec<Square> = legal_moves(pos)
                .into_iter()
                .filter(|m| m.to == mv.to && m.from != mv.from && pos.piece_at(m.from) == Some(piece))
                .map(|m| m.from)
                .collect();
            if !rivals.is_empty() {
                if rivals.iter().all(|s| s.file() != mv.from.file()) {
                    out.push(file_char(mv.from));
                } else if rivals.iter().all(|s| s.rank() != mv.from.rank()) {
                    out.push((b'1' + mv.from.rank()) as char);
                } else {
                    out.push_str(&mv.from.to_string());
                }
            }
        }
        if capture {
            out.push('x');
        }
        out.push_str(&mv.to.to_string());
        if let Some(kind) = mv.promotion {
            out.push('=');
            out.push(kind.letter());
        }
    }

    let mut next = pos.clone();
    apply(&mut next, mv);
    if next.in_check(next.side_to_move) {
        out.push(if legal_moves(&next).is_empty() { '#' } else { '+' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::fen::parse_fen;

    fn mv(s: &str) -> ChessMove {
        s.parse().unwrap()
    }

    /// Leaf count of the legal move tree.
    fn perft(pos: &Position, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        legal_moves(pos)
            .iter()
            .map(|m| {
                let mut next = pos.clone();
                apply(&mut next, m);
                perft(&next, depth - 1)
            })
            .sum()
    }

    #[test]
    fn perft_from_start() {
        let pos = Position::startpos();
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft(&pos, 3), 8_902);
    }

    #[test]
    fn perft_kiwipete() {
        let pos = parse_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(perft(&pos, 1), 48);
        assert_eq!(perft(&pos, 2), 2_039);
    }

    #[test]
    fn en_passant_removes_pawn() {
        let mut pos = parse_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let ep = mv("e5d6");
        assert!(legal_moves(&pos).contains(&ep));
        let details = apply(&mut pos, &ep).unwrap();
        assert!(details.en_passant);
        assert_eq!(pos.piece_at("d5".parse().unwrap()), None);
    }

    #[test]
    fn castling_moves_rook_and_drops_rights() {
        let mut pos = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let details = apply(&mut pos, &mv("e1g1")).unwrap();
        assert_eq!(details.castle, Some(CastleSide::King));
        assert_eq!(pos.piece_at("f1".parse().unwrap()), Some(Piece::new(Color::White, PieceKind::Rook)));
        assert!(!pos.castling.white_king && !pos.castling.white_queen);
        assert!(pos.castling.black_king);
    }

    #[test]
    fn cannot_castle_through_attack() {
        let pos = parse_fen("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1").unwrap();
        let moves = legal_moves(&pos);
        assert!(!moves.contains(&mv("e1g1")));
        assert!(moves.contains(&mv("e1c1")));
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let pos = parse_fen("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert!(legal_moves(&pos).iter().all(|m| m.from != "e2".parse().unwrap()));
    }

    #[test]
    fn promotion_offers_four_pieces() {
        let pos = parse_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let promos: Vec<_> = legal_moves(&pos).into_iter().filter(|m| m.promotion.is_some()).collect();
        assert_eq!(promos.len(), 4);
    }

    #[test]
    fn san_notation() {
        let pos = Position::startpos();
        assert_eq!(san(&pos, &mv("g1f3")), "Nf3");
        assert_eq!(san(&pos, &mv("e2e4")), "e4");
        let mate = parse_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        assert_eq!(san(&mate, &mv("a1a8")), "Ra8#");
        let rooks = parse_fen("4k3/8/8/8/8/8/4K3/R6R w - - 0 1").unwrap();
        assert_eq!(san(&rooks, &mv("a1d1")), "Rad1");
    }

    #[test]
    fn non_ascii_move_text_is_rejected() {
        assert!("aé45".parse::<ChessMove>().is_err());
        assert!("e2é".parse::<ChessMove>().is_err());
        assert!("♞f3".parse::<ChessMove>().is_err());
        assert_eq!("e2-e4".parse::<ChessMove>(), Ok(mv("e2e4")));
    }
}
