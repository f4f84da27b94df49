use arena::config::ArenaConfig;
use arena::game_wrapper::{GameKind, GameWrapper, MoveWrapper};
use arena::games::go::GoMove;
use arena::GameState;
use proptest::prelude::*;

/// Parses `input` for `kind` and, when it parses, submits it. Neither step may panic,
/// and a rejected move must leave the game untouched.
fn submit(kind: GameKind, input: &str) {
    let mut game = GameWrapper::new_game(kind, &ArenaConfig::default());
    let Ok(mv) = game.parse_move(input) else {
        return;
    };
    let before = game.clone();
    let legal = game.is_legal(&mv);
    match game.make_move(&mv) {
        Ok(_) => assert!(legal, "{} accepted {:?} that is_legal refused", kind, input),
        Err(_) => assert_eq!(game, before, "{} changed after rejecting {:?}", kind, input),
    }
}

#[test]
fn hostile_inputs_are_rejected_cleanly() {
    let inputs = [
        "",
        " ",
        "-",
        ",",
        ",,",
        "0,18446744073709551615,h",
        "18446744073709551615,0,v",
        "18446744073709551615,18446744073709551615",
        "18446744073709551615",
        "-1",
        "-1,-1",
        "0,0-18446744073709551615,18446744073709551615",
        "aé45",
        "e2é",
        "♞f3",
        "é",
        "Z99999999999999999999",
        "A0",
        "240 nan 10",
        "240 inf 10",
        "240 0 nan",
        "99999999999 0 10",
    ];
    for kind in GameKind::ALL {
        for input in inputs {
            submit(kind, input);
        }
    }
}

#[test]
fn go_labels_use_the_configured_board() {
    let mut config = ArenaConfig::default();
    config.go.board_size = 13;
    let game = GameWrapper::new_game(GameKind::Go, &config);
    assert_eq!(game.parse_move("A13"), Ok(MoveWrapper::Go(GoMove::Place(0, 0))));
    assert_eq!(game.parse_move("D4"), Ok(MoveWrapper::Go(GoMove::Place(9, 3))));
    assert!(game.parse_move("A14").is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn arbitrary_text_never_panics(kind in 0usize..10, input in any::<String>()) {
        submit(GameKind::ALL[kind], &input);
    }

    #[test]
    fn move_shaped_text_never_panics(
        kind in 0usize..10,
        a in any::<u64>(),
        b in any::<u64>(),
        tail in prop::sample::select(vec!["", ",h", ",v", "-0,0", "-7,7", "q"]),
    ) {
        submit(GameKind::ALL[kind], &format!("{},{}{}", a, b, tail));
        submit(GameKind::ALL[kind], &format!("{}", a % 20));
    }
}
