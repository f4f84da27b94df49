//! Forsyth-Edwards Notation.

use super::board::{CastlingRights, Color, Piece, PieceKind, Position, Square};
use crate::error::FenError;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parses a FEN record. The two move counters are optional.
pub fn parse_fen(fen: &str) -> Result<Position, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(FenError::MissingFields(fields.len()));
    }
    let mut pos = Position::empty();

    let rows: Vec<&str> = fields[0].split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::Placement(format!("{} ranks", rows.len())));
    }
    for (i, row) in rows.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                file = file.saturating_add(skip as u8);
                continue;
            }
            let piece = Piece::from_char(c).ok_or_else(|| FenError::Placement(format!("unknown piece {:?}", c)))?;
            let sq = Square::new(file, rank).ok_or_else(|| FenError::Placement(format!("rank {} overflows", rank + 1)))?;
            pos.put(sq, Some(piece));
            file += 1;
        }
        if file != 8 {
            return Err(FenError::Placement(format!("rank {} has {} files", rank + 1, file)));
        }
    }
    for color in [Color::White, Color::Black] {
        let kings = pos.pieces().filter(|(_, p)| *p == Piece::new(color, PieceKind::King)).count();
        if kings != 1 {
            return Err(FenError::Placement(format!("{:?} has {} kings", color, kings)));
        }
    }

    pos.side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::SideToMove(other.to_string())),
    };

    let mut castling = CastlingRights::default();
    if fields[2] != "-" {
        for c in fields[2].chars() {
            match c {
                'K' => castling.white_king = true,
                'Q' => castling.white_queen = true,
                'k' => castling.black_king = true,
                'q' => castling.black_queen = true,
                _ => return Err(FenError::Castling(fields[2].to_string())),
            }
        }
    }
    pos.castling = castling;

    pos.en_passant = match fields[3] {
        "-" => None,
        sq => Some(sq.parse::<Square>().map_err(|_| FenError::EnPassant(sq.to_string()))?),
    };

    let counter = |i: usize, default: u32| -> Result<u32, FenError> {
        match fields.get(i) {
            None => Ok(default),
            Some(s) => s.parse::<u32>().map_err(|_| FenError::Counter(s.to_string())),
        }
    };
    pos.halfmove_clock = counter(4, 0)?;
    pos.fullmove_number = counter(5, 1)?.max(1);
    Ok(pos)
}

pub fn to_fen(pos: &Position) -> String {
    let mut placement = String::new();
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            match Square::new(file, rank).and_then(|sq| pos.piece_at(sq)) {
                Some(p) => {
                    if empty > 0 {
                        placement.push_str(&empty.to_string());
                        empty = 0;
                    }
                    placement.push(p.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            placement.push_str(&empty.to_string());
        }
        if rank > 0 {
            placement.push('/');
        }
    }

    let side = if pos.side_to_move == Color::White { "w" } else { "b" };
    let c = pos.castling;
    let mut castling: String = [(c.white_king, 'K'), (c.white_queen, 'Q'), (c.black_king, 'k'), (c.black_queen, 'q')]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, ch)| *ch)
        .collect();
    if castling.is_empty() {
        castling.push('-');
    }
    let ep = pos.en_passant.map_or_else(|| "-".to_string(), |s| s.to_string());
    format!(
        "{} {} {} {} {} {}",
        placement, side, castling, ep, pos.halfmove_clock, pos.fullmove_number
    )
}
