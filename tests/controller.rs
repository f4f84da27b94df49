use arena::config::ArenaConfig;
use arena::game_controller::{GameController, MoveResult};
use arena::game_wrapper::{EffectsWrapper, GameKind, GameWrapper, MoveWrapper};
use arena::games::battleship::BattleshipMove;
use arena::games::go::GoMove;
use arena::games::ludo::LudoMove;
use arena::games::monopoly::MonopolyMove;
use arena::{GameRng, MoveError, Outcome};

fn controller(kind: GameKind) -> GameController {
    let mut config = ArenaConfig::default();
    config.set_seed(21);
    GameController::new(GameWrapper::new_game(kind, &config))
}

fn parse(c: &GameController, s: &str) -> MoveWrapper {
    c.get_render_state().parse_move(s).unwrap()
}

#[test]
fn every_game_offers_a_legal_hint() {
    let mut rng = GameRng::new(4);
    for kind in GameKind::ALL {
        if kind == GameKind::Carrom {
            continue;
        }
        let c = controller(kind);
        let hint = c.hint(&mut rng).unwrap_or_else(|| panic!("{} gave no hint", kind));
        assert!(c.validate_move(&hint).is_ok(), "{} hinted {}", kind, hint);
    }
}

#[test]
fn rejected_input_per_game() {
    let cases = [
        (GameKind::Chess, "e2e5"),
        (GameKind::Checkers, "5,0-3,2"),
        (GameKind::Reversi, "0,0"),
        (GameKind::Mancala, "8"),
        (GameKind::Ludo, "0"),
        (GameKind::Monopoly, "buy"),
        (GameKind::Battleship, "3,3"),
    ];
    for (kind, input) in cases {
        let mut c = controller(kind);
        let before = c.get_state_for_search();
        let mv = parse(&c, input);
        match c.try_make_move(mv) {
            MoveResult::Invalid { .. } => {}
            other => panic!("{} accepted {}: {:?}", kind, input, other),
        }
        assert_eq!(c.get_render_state(), &before, "{}", kind);
        assert_eq!(c.move_count(), 0);
    }
}

#[test]
fn undo_rewinds_the_dice() {
    let mut c = controller(GameKind::Ludo);
    let first = match c.try_make_move(MoveWrapper::Ludo(LudoMove::Roll)) {
        MoveResult::Success { effects, .. } => effects,
        other => panic!("roll failed: {:?}", other),
    };
    c.undo().unwrap();
    let second = match c.try_make_move(MoveWrapper::Ludo(LudoMove::Roll)) {
        MoveResult::Success { effects, .. } => effects,
        other => panic!("roll failed: {:?}", other),
    };
    assert_eq!(first, second);
}

#[test]
fn monopoly_turn_cycle() {
    let mut c = controller(GameKind::Monopoly);
    assert!(c.try_make_move(MoveWrapper::Monopoly(MonopolyMove::Roll)).is_success());
    // Whatever the roll, the mover can always finish the turn within a few actions.
    let mut guard = 0;
    while c.get_current_player() == 1 && guard < 20 {
        let mv = c.get_legal_moves(None).into_iter().next().unwrap();
        assert!(c.try_make_move(mv).is_success());
        guard += 1;
    }
    assert_eq!(c.get_current_player(), -1);
}

#[test]
fn battleship_placement_then_fire() {
    let mut c = controller(GameKind::Battleship);
    assert!(c.try_make_move(MoveWrapper::Battleship(BattleshipMove::RandomFleet)).is_success());
    let mut rng = GameRng::new(0);
    while matches!(c.get_legal_moves(None).first(), Some(MoveWrapper::Battleship(BattleshipMove::RandomFleet))) {
        let mv = c.ai_move(&mut rng).unwrap();
        assert!(c.try_make_move(mv).is_success());
    }
    let fire = c
        .get_legal_moves(None)
        .into_iter()
        .find(|m| matches!(m, MoveWrapper::Battleship(BattleshipMove::Fire(..))))
        .unwrap();
    match c.try_make_move(fire) {
        MoveResult::Success {
            effects: EffectsWrapper::Battleship(fx),
            ..
        } => assert!(fx.shot.is_some()),
        other => panic!("shot failed: {:?}", other),
    }
}

#[test]
fn go_resignation_ends_the_game() {
    let mut c = controller(GameKind::Go);
    assert!(c.try_make_move(MoveWrapper::Go(GoMove::Place(4, 4))).is_success());
    match c.try_make_move(MoveWrapper::Go(GoMove::Resign)) {
        MoveResult::Success { outcome, .. } => assert_eq!(outcome, Outcome::Win(1)),
        other => panic!("resign failed: {:?}", other),
    }
    assert_eq!(c.try_make_move(MoveWrapper::Go(GoMove::Pass)), MoveResult::GameOver);
    assert!(c.format_history().contains("Black wins!"));
}

#[test]
fn chess_piece_selection() {
    let c = controller(GameKind::Chess);
    let from_e2 = c.get_legal_moves(Some((6, 4)));
    let shown: Vec<String> = from_e2.iter().map(ToString::to_string).collect();
    assert_eq!(shown, vec!["e2e3", "e2e4"]);
    assert!(c.get_legal_moves(Some((4, 4))).is_empty());
}

#[test]
fn mismatched_moves_are_reported() {
    let mut c = controller(GameKind::Reversi);
    assert_eq!(
        c.validate_move(&MoveWrapper::Ludo(LudoMove::Roll)),
        Err(MoveError::MismatchedGameType)
    );
    assert_eq!(
        c.try_make_move(MoveWrapper::Ludo(LudoMove::Roll)),
        MoveResult::Invalid {
            reason: MoveError::MismatchedGameType
        }
    );
}
