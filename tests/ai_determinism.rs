use arena::config::ArenaConfig;
use arena::game_wrapper::{GameKind, GameWrapper, MoveWrapper};
use arena::games::checkers::{CheckersConfig, CheckersState};
use arena::games::connect4::{Connect4Config, Connect4State};
use arena::games::reversi::{ReversiConfig, ReversiState};
use arena::search::AlphaBeta;
use arena::{GameRng, GameState, NewGame};

fn fast_config(seed: u64) -> ArenaConfig {
    let mut config = ArenaConfig::default();
    config.set_seed(seed);
    config.set_depth(2);
    config
}

/// AI plays every seat for up to `plies` moves and returns the moves it chose.
fn self_play(kind: GameKind, seed: u64, plies: usize) -> Vec<MoveWrapper> {
    let mut game = GameWrapper::new_game(kind, &fast_config(seed));
    let mut rng = GameRng::new(seed);
    let mut played = Vec::new();
    for _ in 0..plies {
        if game.is_terminal() {
            break;
        }
        let Some(mv) = game.ai_move(&mut rng) else {
            break;
        };
        game.make_move(&mv).unwrap();
        played.push(mv);
    }
    played
}

#[test]
fn same_seed_same_game() {
    for kind in GameKind::ALL {
        // A carrom move simulates dozens of strikes; two are enough here.
        let plies = if kind == GameKind::Carrom { 2 } else { 40 };
        let first = self_play(kind, 99, plies);
        let second = self_play(kind, 99, plies);
        assert!(!first.is_empty(), "{}", kind);
        assert_eq!(first, second, "{}", kind);
    }
}

#[test]
fn ai_moves_are_always_legal() {
    for kind in GameKind::ALL {
        if kind == GameKind::Carrom {
            continue;
        }
        let mut game = GameWrapper::new_game(kind, &fast_config(5));
        let mut rng = GameRng::new(5);
        for _ in 0..60 {
            let Some(mv) = game.ai_move(&mut rng) else {
                break;
            };
            assert!(game.is_legal(&mv), "{} chose {}", kind, mv);
            game.make_move(&mv).unwrap();
        }
    }
}

#[test]
fn parallel_search_matches_sequential() {
    let mut c4 = Connect4State::new_game(&Connect4Config::default());
    let mut reversi = ReversiState::new_game(&ReversiConfig::default());
    let mut checkers = CheckersState::new_game(&CheckersConfig::default());
    let mut rng = GameRng::new(17);
    for _ in 0..6 {
        assert_eq!(AlphaBeta::new(4).best_move(&c4), AlphaBeta::sequential(4).best_move(&c4));
        assert_eq!(AlphaBeta::new(3).best_move(&reversi), AlphaBeta::sequential(3).best_move(&reversi));
        assert_eq!(AlphaBeta::new(3).best_move(&checkers), AlphaBeta::sequential(3).best_move(&checkers));

        let mv = rng.choose(&c4.get_possible_moves()).copied().unwrap();
        c4.make_move(&mv).unwrap();
        let mv = rng.choose(&reversi.get_possible_moves()).copied().unwrap();
        reversi.make_move(&mv).unwrap();
        let mv = rng.choose(&checkers.get_possible_moves()).copied().unwrap();
        checkers.make_move(&mv).unwrap();
    }
}

#[test]
fn ai_only_games_finish() {
    for kind in [GameKind::Connect4, GameKind::Reversi, GameKind::Mancala, GameKind::Checkers] {
        let mut game = GameWrapper::new_game(kind, &fast_config(3));
        let mut rng = GameRng::new(3);
        let mut plies = 0;
        while !game.is_terminal() && plies < 3000 {
            let mv = game.ai_move(&mut rng).unwrap();
            game.make_move(&mv).unwrap();
            plies += 1;
        }
        assert!(game.is_terminal(), "{} did not finish", kind);
    }
}
