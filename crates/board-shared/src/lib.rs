#![no_std]

/// The four line axes of a square grid as (row delta, column delta):
/// horizontal, vertical, and the two diagonals.
pub const AXES: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Reads a cell of a row-major board, treating out-of-range coordinates as empty.
#[inline]
fn cell(board: &[i32], width: i32, height: i32, row: i32, col: i32) -> i32 {
    if row < 0 || col < 0 || row >= height || col >= width {
        return 0;
    }
    board.get((row * width + col) as usize).copied().unwrap_or(0)
}

/// Counts consecutive cells owned by `player` starting next to `(row, col)`
/// and walking in direction `(dr, dc)`. The anchor cell itself is not counted.
pub fn run_length(
    board: &[i32],
    width: usize,
    height: usize,
    player: i32,
    (row, col): (usize, usize),
    (dr, dc): (i32, i32),
) -> usize {
    let (w, h) = (width as i32, height as i32);
    let mut r = row as i32 + dr;
    let mut c = col as i32 + dc;
    let mut len = 0;
    while cell(board, w, h, r, c) == player {
        len += 1;
        r += dr;
        c += dc;
    }
    len
}

/// Finds a winning line through the cell at `anchor`.
///
/// Counts outward in both directions along each axis, the way a move
/// executor checks only the lines touching the piece it just placed.
///
/// # Returns
/// `Some((axis, backward, forward))` for the first axis whose line through the anchor
/// reaches `line_size`, where `backward`/`forward` are the run lengths on each side.
pub fn anchored_line(
    board: &[i32],
    width: usize,
    height: usize,
    anchor: (usize, usize),
    line_size: usize,
) -> Option<((i32, i32), usize, usize)> {
    let player = cell(board, width as i32, height as i32, anchor.0 as i32, anchor.1 as i32);
    if player == 0 {
        return None;
    }
    for &(dr, dc) in AXES.iter() {
        let forward = run_length(board, width, height, player, anchor, (dr, dc));
        let backward = run_length(board, width, height, player, anchor, (-dr, -dc));
        if backward + forward + 1 >= line_size {
            return Some(((dr, dc), backward, forward));
        }
    }
    None
}

/// Checks for a win anywhere in a grid-based game
///
/// # Arguments
/// * `board` - The board data as a flat row-major slice
/// * `width` - Board width
/// * `height` - Board height
/// * `player` - The player ID to check for (e.g., 1 or -1)
/// * `line_size` - Number of consecutive pieces needed to win
pub fn check_line_win(board: &[i32], width: usize, height: usize, player: i32, line_size: usize) -> bool {
    if line_size == 0 {
        return false;
    }
    for row in 0..height {
        for col in 0..width {
            if board[row * width + col] != player {
                continue;
            }
            // Only start counting at the first cell of a run.
            for &(dr, dc) in AXES.iter() {
                if run_length(board, width, height, player, (row, col), (-dr, -dc)) == 0
                    && run_length(board, width, height, player, (row, col), (dr, dc)) + 1 >= line_size
                {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_horizontal_line() {
        let mut board = [0i32; 42];
        for c in 0..4 {
            board[5 * 7 + c] = 1;
        }
        assert!(check_line_win(&board, 7, 6, 1, 4));
        assert!(!check_line_win(&board, 7, 6, -1, 4));
        assert_eq!(anchored_line(&board, 7, 6, (5, 3), 4), Some(((0, 1), 3, 0)));
    }

    #[test]
    fn broken_line_is_not_a_win() {
        let mut board = [0i32; 42];
        board[0] = 1;
        board[1] = 1;
        board[3] = 1;
        board[4] = 1;
        assert!(!check_line_win(&board, 7, 6, 1, 4));
        assert_eq!(anchored_line(&board, 7, 6, (0, 1), 4), None);
    }

    #[test]
    fn detects_anti_diagonal() {
        let mut board = [0i32; 42];
        for k in 0..4 {
            board[(5 - k) * 7 + k] = -1;
        }
        assert!(check_line_win(&board, 7, 6, -1, 4));
        assert!(anchored_line(&board, 7, 6, (3, 2), 4).is_some());
    }
}
