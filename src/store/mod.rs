/*!
 * Persistence of players, ratings, games and their participants
 */

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Game, GameParticipant, NewGame, Player, PlayerRating, Role};

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Registers a player, or updates the name of a known one
    async fn add_player(&self, discord_id: &str, name: &str) -> Result<Player>;

    /// Overwrites the live rating of a player for a role. Refuses non-finite values and negative
    /// uncertainty.
    async fn set_rating(
        &self,
        player_id: &str,
        role: Role,
        mu: f64,
        sigma: f64,
    ) -> Result<PlayerRating>;

    /// Rating of a player for a role, created with the TrueSkill defaults if they have none yet
    async fn ensure_rating(&self, player_id: &str, role: Role) -> Result<PlayerRating>;

    async fn rating(&self, player_id: &str, role: Role) -> Result<Option<PlayerRating>>;

    /// Creates the game and one participant per seat of the roster, all or nothing. Each
    /// participant keeps a copy of its player's rating for the role at this point in time.
    async fn create_game(&self, new_game: NewGame) -> Result<(Game, Vec<GameParticipant>)>;

    async fn game(&self, id: Uuid) -> Result<Option<Game>>;

    /// Participants of a game, ordered by team then role
    async fn participants(&self, game_id: Uuid) -> Result<Vec<GameParticipant>>;

    /// Same as `participants`, along with the player behind each seat
    async fn participants_with_players(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<(GameParticipant, Player)>>;

    /// Post-game self report of the champion a player used
    async fn report_champion(
        &self,
        game_id: Uuid,
        player_id: &str,
        champion_id: i32,
    ) -> Result<GameParticipant>;

    /// Deletes a game along with its participants. Returns whether the game existed.
    async fn delete_game(&self, id: Uuid) -> Result<bool>;
}
