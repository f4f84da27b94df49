//! # Game Implementations Module
//!
//! Each game implements the `arena::GameState` trait so that the controller,
//! the search module and the terminal front-end can drive it uniformly.
//!
//! ## Supported Games
//! - **Chess**: full local legality with FEN, plus an optional remote move service
//! - **Checkers**: mandatory capture and multi-jump chains on the 8x8 dark squares
//! - **Connect 4**: gravity drops on a 6x7 grid, alpha-beta opponent
//! - **Reversi**: disc flipping on 8x8, alpha-beta opponent
//! - **Go**: 9x9 with liberties, captures, Ko and area scoring
//! - **Mancala**: 14-pit Kalah sowing with extra turns and captures
//! - **Ludo**: dice-driven race for 2-4 colors
//! - **Battleship**: fleet placement and hunt/target firing on 10x10
//! - **Carrom**: fixed-timestep physics of striker and carrom men
//! - **Monopoly**: a 20-space property trading loop for two players
//!
//! ## Adding New Games
//! To add a new game, create a new module and implement:
//! 1. A move type and an effects type
//! 2. A game state type with `GameState` and `NewGame`
//! 3. `AiPlayer` if the game has a computer opponent
//! 4. Display and parsing implementations for the terminal front-end

pub mod battleship;
pub mod carrom;
pub mod checkers;
pub mod chess;
pub mod connect4;
pub mod go;
pub mod ludo;
pub mod mancala;
pub mod monopoly;
pub mod reversi;

/// Orthogonal neighbours as (row delta, column delta).
pub(crate) const DIRECTIONS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Orthogonal and diagonal neighbours as (row delta, column delta).
pub(crate) const DIRECTIONS_8: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

/// Steps from `(r, c)` by `(dr, dc)`, returning `None` when leaving a `rows` x `cols` grid.
pub(crate) fn offset(
    (r, c): (usize, usize),
    (dr, dc): (i32, i32),
    rows: usize,
    cols: usize,
) -> Option<(usize, usize)> {
    let nr = r as i32 + dr;
    let nc = c as i32 + dc;
    if nr < 0 || nc < 0 || nr >= rows as i32 || nc >= cols as i32 {
        None
    } else {
        Some((nr as usize, nc as usize))
    }
}

/// Parses "row,col" into a pair of 0-based indices.
pub(crate) fn parse_pair(s: &str) -> Result<(usize, usize), String> {
    let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
    if parts.len() != 2 {
        return Err("Expected format: r,c".to_string());
    }
    let r = parts[0].parse::<usize>().map_err(|e| e.to_string())?;
    let c = parts[1].parse::<usize>().map_err(|e| e.to_string())?;
    Ok((r, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_stays_on_grid() {
        assert_eq!(offset((0, 0), (-1, 0), 8, 8), None);
        assert_eq!(offset((0, 0), (1, 1), 8, 8), Some((1, 1)));
        assert_eq!(offset((7, 7), (0, 1), 8, 8), None);
    }

    #[test]
    fn parse_pair_accepts_spaces() {
        assert_eq!(parse_pair(" 3 , 4 "), Ok((3, 4)));
        assert!(parse_pair("3").is_err());
        assert!(parse_pair("a,b").is_err());
    }
}
