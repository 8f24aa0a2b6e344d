/*!
 * Errors that can be returned by the store and the admin commands
 */

use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};

use diesel_async::pooled_connection::deadpool::{BuildError, PoolError};
use uuid::Uuid;

use crate::models::{Role, Team};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Db(diesel::result::Error),
    Pool(PoolError),
    PoolBuild(BuildError),
    /// A game needs at least one seated player
    EmptyRoster,
    /// Two participants for the same (team, role) in one game
    DuplicateSeat { team: Team, role: Role },
    /// The same player seated twice in one game
    DuplicatePlayer { player_id: String },
    /// No `player_rating` row backs the (player, role) pair
    MissingRating { player_id: String, role: Role },
    PlayerNotFound { player_id: String },
    /// Non-finite rating, or negative uncertainty
    InvalidRating { mu: f64, sigma: f64 },
    GameNotFound(Uuid),
    ParticipantNotFound { game_id: Uuid, player_id: String },
    ChampionAlreadySet { current: i32 },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Db(e) => write!(f, "database error: {}", e),
            Self::Pool(e) => write!(f, "connection pool error: {}", e),
            Self::PoolBuild(e) => write!(f, "failed to build connection pool: {}", e),
            Self::EmptyRoster => write!(f, "cannot create a game without players"),
            Self::DuplicateSeat { team, role } => {
                write!(f, "seat {} {} is already taken", team, role)
            }
            Self::DuplicatePlayer { player_id } => {
                write!(f, "player {} is already seated in this game", player_id)
            }
            Self::MissingRating { player_id, role } => {
                write!(f, "player {} has no rating for role {}", player_id, role)
            }
            Self::PlayerNotFound { player_id } => write!(f, "player {} not found", player_id),
            Self::InvalidRating { mu, sigma } => {
                write!(f, "invalid rating mu={} sigma={}", mu, sigma)
            }
            Self::GameNotFound(id) => write!(f, "game {} not found", id),
            Self::ParticipantNotFound { game_id, player_id } => {
                write!(f, "player {} did not take part in game {}", player_id, game_id)
            }
            Self::ChampionAlreadySet { current } => {
                write!(f, "champion already reported as {}", current)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Db(e) => Some(e),
            Self::Pool(e) => Some(e),
            Self::PoolBuild(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// Sentence suitable for showing to whoever issued the command
    pub fn as_message(&self) -> String {
        match self {
            Self::Db(_) | Self::Pool(_) | Self::PoolBuild(_) => "Internal error".to_owned(),
            Self::ChampionAlreadySet { current } => {
                format!("You already reported champion {} for this game", current)
            }
            Self::ParticipantNotFound { .. } => "You did not play in this game".to_owned(),
            e => e.to_string(),
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Error {
        Error::Db(e)
    }
}

impl From<PoolError> for Error {
    fn from(e: PoolError) -> Error {
        Error::Pool(e)
    }
}

impl From<BuildError> for Error {
    fn from(e: BuildError) -> Error {
        Error::PoolBuild(e)
    }
}
