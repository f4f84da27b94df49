//! Arena configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "connect4": { "ai_depth": 7 }, "chess_service": { "base_url": "http://localhost:8000" } }
//! ```
//!
//! Sources apply in order: defaults, the JSON file, the environment, then
//! command line flags (applied by the `play` binary).

use crate::error::ConfigError;
use crate::games::battleship::BattleshipConfig;
use crate::games::carrom::CarromConfig;
use crate::games::checkers::CheckersConfig;
use crate::games::chess::ChessConfig;
use crate::games::connect4::Connect4Config;
use crate::games::go::GoConfig;
use crate::games::ludo::LudoConfig;
use crate::games::mancala::MancalaConfig;
use crate::games::monopoly::MonopolyConfig;
use crate::games::reversi::ReversiConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Overrides [`ChessServiceConfig::base_url`].
pub const CHESS_SERVICE_URL_ENV: &str = "ARENA_CHESS_SERVICE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Worker threads for the alpha-beta root search. 0 uses every core.
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { threads: 0 }
    }
}

impl SearchConfig {
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessServiceConfig {
    /// Root URL of the remote move service. Chess runs fully local when unset.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ChessServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 2000,
        }
    }
}

impl ChessServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub search: SearchConfig,
    pub chess_service: ChessServiceConfig,
    pub battleship: BattleshipConfig,
    pub carrom: CarromConfig,
    pub checkers: CheckersConfig,
    pub chess: ChessConfig,
    pub connect4: Connect4Config,
    pub go: GoConfig,
    pub ludo: LudoConfig,
    pub mancala: MancalaConfig,
    pub monopoly: MonopolyConfig,
    pub reversi: ReversiConfig,
}

impl ArenaConfig {
    /// Reads a JSON file and applies the environment on top of it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading arena config");
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        config.apply_env();
        Ok(config)
    }

    /// Parses and validates a JSON document. The environment is not consulted.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus the environment, for runs without a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var(CHESS_SERVICE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                debug!(url, "chess service url from environment");
                self.chess_service.base_url = Some(url.to_string());
            }
        }
    }

    /// Seeds every game that draws from a random source.
    pub fn set_seed(&mut self, seed: u64) {
        self.battleship.seed = seed;
        self.ludo.seed = seed;
        self.monopoly.seed = seed;
    }

    /// Sets the search depth of the alpha-beta games.
    pub fn set_depth(&mut self, depth: u32) {
        self.connect4.ai_depth = depth;
        self.reversi.ai_depth = depth;
        self.checkers.ai_depth = depth;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c4 = &self.connect4;
        if c4.width == 0 || c4.height == 0 {
            return Err(ConfigError::Invalid("connect4 board must not be empty".into()));
        }
        if c4.line_size < 2 || c4.line_size > c4.width.max(c4.height) {
            return Err(ConfigError::Invalid(format!(
                "connect4 line_size {} does not fit a {}x{} board",
                c4.line_size, c4.width, c4.height
            )));
        }
        let r = self.reversi.board_size;
        if r < 4 || r % 2 != 0 {
            return Err(ConfigError::Invalid(format!("reversi board_size {} must be even and at least 4", r)));
        }
        if self.go.board_size < 2 || self.go.board_size > 19 {
            return Err(ConfigError::Invalid(format!("go board_size {} is outside 2..=19", self.go.board_size)));
        }
        if self.ludo.colors().is_none() {
            return Err(ConfigError::Invalid(format!("ludo needs 2 to 4 players, got {}", self.ludo.num_players)));
        }
        if self.go.history_limit == 0 {
            return Err(ConfigError::Invalid("go history_limit must keep at least one position for Ko".into()));
        }
        if self.carrom.max_ticks == 0 {
            return Err(ConfigError::Invalid("carrom max_ticks must be positive".into()));
        }
        if self.mancala.stones_per_pit == 0 {
            return Err(ConfigError::Invalid("mancala needs at least one stone per pit".into()));
        }
        if self.monopoly.start_money <= 0 {
            return Err(ConfigError::Invalid("monopoly start_money must be positive".into()));
        }
        if self.chess_service.timeout_ms == 0 {
            return Err(ConfigError::Invalid("chess_service timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
