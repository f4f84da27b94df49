//! Remote chess move service and the validating client in front of it.
//!
//! The service speaks JSON over HTTP under `/api/chess/`:
//!
//! | endpoint       | body                           |
//! |----------------|--------------------------------|
//! | `status`       | (GET)                          |
//! | `valid-moves`  | `{position, square}`           |
//! | `make-move`    | `{position, from, to}`         |
//! | `ai-move`      | `{position, difficulty}`       |
//! | `hint`         | `{position}`                   |
//!
//! [`ChessClient`] never trusts an answer it cannot check: each reply is
//! compared with the local rules, and on disagreement, error or timeout the
//! local answer is returned instead, tagged [`AnswerSource::LocalFallback`].

use super::{ChessEffects, ChessMove, ChessState, PieceKind, Square};
use crate::error::ServiceError;
use crate::{AiPlayer, GameRng, GameState, MoveError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2_000);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceStatus {
    pub status: String,
    pub engine: String,
    pub version: String,
}

/// Reply to `make-move` and `ai-move`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoveReply {
    pub new_position: String,
    pub move_notation: String,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_draw: bool,
    pub draw_reason: Option<String>,
    pub winner: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintReply {
    pub hint: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Deserialize)]
struct MovesReply {
    moves: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

#[derive(Serialize)]
struct SquareQuery<'a> {
    position: &'a str,
    square: &'a str,
}

#[derive(Serialize)]
struct MoveQuery<'a> {
    position: &'a str,
    from: &'a str,
    to: &'a str,
}

#[derive(Serialize)]
struct AiQuery<'a> {
    position: &'a str,
    difficulty: u8,
}

#[derive(Serialize)]
struct PositionQuery<'a> {
    position: &'a str,
}

/// A source of chess answers keyed by FEN position.
pub trait ChessService: Send + Sync {
    fn status(&self) -> impl Future<Output = Result<ServiceStatus, ServiceError>> + Send;

    /// Destination squares for the piece on `square`.
    fn valid_moves(&self, fen: &str, square: &str) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;

    fn make_move(&self, fen: &str, from: &str, to: &str) -> impl Future<Output = Result<MoveReply, ServiceError>> + Send;

    fn ai_move(&self, fen: &str, difficulty: u8) -> impl Future<Output = Result<MoveReply, ServiceError>> + Send;

    fn hint(&self, fen: &str) -> impl Future<Output = Result<HintReply, ServiceError>> + Send;
}

/// [`ChessService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChessService {
    client: Client,
    base_url: String,
}

impl HttpChessService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(concat!("board-arena/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/chess/{}", self.base_url, endpoint)
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let resp = self.client.post(self.url(endpoint)).json(body).send().await?;
        decode(resp).await
    }
}

async fn decode<R: DeserializeOwned>(resp: Response) -> Result<R, ServiceError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(match resp.json::<ErrorReply>().await {
            Ok(body) => ServiceError::Rejected(body.error),
            Err(_) => ServiceError::Status(status.as_u16()),
        });
    }
    Ok(resp.json::<R>().await?)
}

impl ChessService for HttpChessService {
    async fn status(&self) -> Result<ServiceStatus, ServiceError> {
        let resp = self.client.get(self.url("status")).send().await?;
        decode(resp).await
    }

    async fn valid_moves(&self, fen: &str, square: &str) -> Result<Vec<String>, ServiceError> {
        let reply: MovesReply = self.post("valid-moves", &SquareQuery { position: fen, square }).await?;
        Ok(reply.moves)
    }

    async fn make_move(&self, fen: &str, from: &str, to: &str) -> Result<MoveReply, ServiceError> {
        self.post("make-move", &MoveQuery { position: fen, from, to }).await
    }

    async fn ai_move(&self, fen: &str, difficulty: u8) -> Result<MoveReply, ServiceError> {
        self.post("ai-move", &AiQuery { position: fen, difficulty }).await
    }

    async fn hint(&self, fen: &str) -> Result<HintReply, ServiceError> {
        self.post("hint", &PositionQuery { position: fen }).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    Remote,
    LocalFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer<T> {
    pub value: T,
    pub source: AnswerSource,
}

/// Validating front of an optional [`ChessService`].
pub struct ChessClient<S> {
    service: Option<S>,
    timeout: Duration,
}

impl ChessClient<HttpChessService> {
    /// Client for the HTTP service at `base_url`, or an offline client when none is given.
    pub fn connect(base_url: Option<&str>, timeout: Duration) -> Result<Self, ServiceError> {
        match base_url {
            Some(url) => Ok(Self::new(HttpChessService::new(url, timeout)?, timeout)),
            None => Ok(Self::offline()),
        }
    }
}

impl<S: ChessService> ChessClient<S> {
    pub fn new(service: S, timeout: Duration) -> Self {
        Self {
            service: Some(service),
            timeout,
        }
    }

    /// A client that always answers locally.
    pub fn offline() -> Self {
        Self {
            service: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn is_online(&self) -> bool {
        self.service.is_some()
    }

    /// Status of the remote service, `None` when offline or unreachable.
    pub async fn status(&self) -> Option<ServiceStatus> {
        match self.remote(|s| s.status()).await {
            Ok(status) => Some(status),
            Err(e) => {
                debug!(error = %e, "chess service status unavailable");
                None
            }
        }
    }

    /// Legal moves of the piece on `from`.
    pub async fn valid_moves(&self, state: &ChessState, from: Square) -> Answer<Vec<ChessMove>> {
        let local = state.moves_from_square(from);
        let fen = state.fen();
        let square = from.to_string();
        let remote = self.remote(|s| s.valid_moves(&fen, &square)).await.and_then(|names| {
            let mut remote = names
                .iter()
                .map(|n| n.parse::<Square>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(ServiceError::Rejected)?;
            let mut expected: Vec<Square> = local.iter().map(|m| m.to).collect();
            remote.sort();
            remote.dedup();
            expected.sort();
            expected.dedup();
            if remote == expected {
                Ok(())
            } else {
                Err(ServiceError::Rejected(format!("move list for {} disagrees with local rules", square)))
            }
        });
        match remote {
            Ok(()) => Answer {
                value: local,
                source: AnswerSource::Remote,
            },
            Err(e) => self.fallback(e, local),
        }
    }

    /// Plays `mv` on `state`. Illegal moves are rejected locally before any request.
    pub async fn make_move(&self, state: &mut ChessState, mv: ChessMove) -> Result<Answer<ChessEffects>, MoveError> {
        let before = state.fen();
        let mut next = state.clone();
        let effects = next.make_move(&mv)?;

        let under_promotion = effects.mv.promotion.is_some_and(|k| k != PieceKind::Queen);
        let remote = if under_promotion {
            Err(ServiceError::Rejected("service promotes to a queen only".to_string()))
        } else {
            let (from, to) = (mv.from.to_string(), mv.to.to_string());
            self.remote(|s| s.make_move(&before, &from, &to)).await
        };

        let answer = match remote {
            Ok(reply) if same_position(&reply.new_position, &effects.fen) => Answer {
                value: effects,
                source: AnswerSource::Remote,
            },
            Ok(reply) => self.fallback(
                ServiceError::Rejected(format!("service reached {}", reply.new_position)),
                effects,
            ),
            Err(e) => self.fallback(e, effects),
        };
        *state = next;
        Ok(answer)
    }

    /// Computer move for the side to move, `None` once the game is over.
    pub async fn ai_move(&self, state: &ChessState, rng: &mut GameRng) -> Option<Answer<ChessMove>> {
        if state.is_terminal() {
            return None;
        }
        let fen = state.fen();
        let remote = self
            .remote(|s| s.ai_move(&fen, state.difficulty()))
            .await
            .and_then(|r| checked_move(state, r.from.as_deref(), r.to.as_deref()));
        match remote {
            Ok(mv) => Some(Answer {
                value: mv,
                source: AnswerSource::Remote,
            }),
            Err(e) => state.ai_move(rng).map(|mv| self.fallback(e, mv)),
        }
    }

    /// Suggested move for the side to move.
    pub async fn hint(&self, state: &ChessState) -> Option<Answer<ChessMove>> {
        if state.is_terminal() {
            return None;
        }
        let fen = state.fen();
        let remote = self
            .remote(|s| s.hint(&fen))
            .await
            .and_then(|r| checked_move(state, r.from.as_deref(), r.to.as_deref()));
        match remote {
            Ok(mv) => Some(Answer {
                value: mv,
                source: AnswerSource::Remote,
            }),
            Err(e) => state.one_ply_best().map(|mv| self.fallback(e, mv)),
        }
    }

    async fn remote<'a, T, F>(&'a self, call: impl FnOnce(&'a S) -> F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let service = self.service.as_ref().ok_or(ServiceError::Unavailable)?;
        match tokio::time::timeout(self.timeout, call(service)).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    fn fallback<T>(&self, error: ServiceError, value: T) -> Answer<T> {
        match error {
            ServiceError::Unavailable => debug!("no chess service configured, answering locally"),
            e => warn!(error = %e, "chess service degraded, answering locally"),
        }
        Answer {
            value,
            source: AnswerSource::LocalFallback,
        }
    }
}

/// Turns a remote from/to pair into a move that is legal here.
fn checked_move(state: &ChessState, from: Option<&str>, to: Option<&str>) -> Result<ChessMove, ServiceError> {
    let (Some(from), Some(to)) = (from, to) else {
        return Err(ServiceError::Rejected("answer carries no move".to_string()));
    };
    let mv = format!("{}{}", from, to)
        .parse::<ChessMove>()
        .map_err(ServiceError::Rejected)?;
    let mv = state.normalize(mv);
    if state.is_legal(&mv) {
        Ok(mv)
    } else {
        Err(ServiceError::Rejected(format!("illegal move {}", mv)))
    }
}

/// Compares placement, side to move and castling rights. En passant fields
/// differ between writers that print the target square only when a capture
/// is possible and writers that always print it.
fn same_position(a: &str, b: &str) -> bool {
    a.split_whitespace().take(3).eq(b.split_whitespace().take(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_move_reply() {
        let json = r#"{"newPosition":"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "moveNotation":"e4","isCheck":false,"isCheckmate":false,"isDraw":false,
            "drawReason":null,"winner":null,"from":"e2","to":"e4"}"#;
        let reply: MoveReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.move_notation, "e4");
        assert_eq!(reply.from.as_deref(), Some("e2"));
    }

    #[test]
    fn position_comparison_ignores_en_passant() {
        assert!(same_position(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        ));
        assert!(!same_position(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1",
        ));
    }

    #[test]
    fn remote_moves_are_checked() {
        let state = ChessState::from_fen(super::super::fen::START_FEN).unwrap();
        assert!(checked_move(&state, Some("e2"), Some("e4")).is_ok());
        assert!(checked_move(&state, Some("e2"), Some("e5")).is_err());
        assert!(checked_move(&state, None, Some("e4")).is_err());
    }

    #[tokio::test]
    async fn offline_client_answers_locally() {
        let client: ChessClient<HttpChessService> = ChessClient::offline();
        let mut state = ChessState::from_fen(super::super::fen::START_FEN).unwrap();
        let moves = client.valid_moves(&state, "b1".parse().unwrap()).await;
        assert_eq!(moves.source, AnswerSource::LocalFallback);
        assert_eq!(moves.value.len(), 2);
        let played = client.make_move(&mut state, "e2e4".parse().unwrap()).await.unwrap();
        assert_eq!(played.value.san, "e4");
        assert_eq!(state.get_current_player(), -1);
        assert!(client.status().await.is_none());
    }
}
