/*!
 * DB models for the bot
 */

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::sql_types::Text;
use diesel::deserialize::FromSqlRow;
use diesel::expression::AsExpression;
use diesel::{Insertable, Queryable, Selectable};
use uuid::Uuid;

use crate::error::{Error, Result};
pub use crate::schema::{game, game_participant, player, player_rating};

/// TrueSkill defaults for a role the player never played
pub const DEFAULT_MU: f64 = 25.0;
pub const DEFAULT_SIGMA: f64 = 25.0 / 3.0;

/// Conservative rating shown to players, penalizes uncertainty
pub fn conservative_rating(mu: f64, sigma: f64) -> f64 {
    mu - 3.0 * sigma + 25.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Team {
    Blue,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Bot,
    Support,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Blue => "blue",
            Team::Red => "red",
        }
    }
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Bot, Role::Support];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Top => "top",
            Role::Jungle => "jungle",
            Role::Mid => "mid",
            Role::Bot => "bot",
            Role::Support => "support",
        }
    }
}

impl Display for Team {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Returned when a team or role name does not match any variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "unknown variant {:?}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Team {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Team::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

/// A place in a game, at most one participant per seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seat {
    pub team: Team,
    pub role: Role,
}

impl Seat {
    pub const MIN: Seat = Seat {
        team: Team::Blue,
        role: Role::Top,
    };
    pub const MAX: Seat = Seat {
        team: Team::Red,
        role: Role::Support,
    };
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = player)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Player {
    pub discord_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(discord_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            discord_id: discord_id.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Live rating of a player for one role, overwritten after every game
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = player_rating)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlayerRating {
    pub player_id: String,
    pub role: Role,
    pub trueskill_mu: f64,
    pub trueskill_sigma: f64,
    pub updated_at: DateTime<Utc>,
}

impl PlayerRating {
    pub fn new(player_id: impl Into<String>, role: Role, mu: f64, sigma: f64) -> Self {
        Self {
            player_id: player_id.into(),
            role,
            trueskill_mu: mu,
            trueskill_sigma: sigma,
            updated_at: Utc::now(),
        }
    }

    /// Same as `new`, refusing values the conservative rating cannot be computed from
    pub fn checked(player_id: impl Into<String>, role: Role, mu: f64, sigma: f64) -> Result<Self> {
        if !mu.is_finite() || !sigma.is_finite() || sigma < 0.0 {
            return Err(Error::InvalidRating { mu, sigma });
        }
        Ok(Self::new(player_id, role, mu, sigma))
    }

    pub fn initial(player_id: impl Into<String>, role: Role) -> Self {
        Self::new(player_id, role, DEFAULT_MU, DEFAULT_SIGMA)
    }

    pub fn mmr(&self) -> f64 {
        conservative_rating(self.trueskill_mu, self.trueskill_sigma)
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = game)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Game {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub guild_id: String,
    pub channel_id: String,
}

impl Game {
    /// The id is assigned here, before any participant refers to it
    pub fn new(guild_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// Players of a game to be, keyed by seat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    seats: BTreeMap<Seat, String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats a player, refusing to overwrite a seat or to seat someone twice
    pub fn insert(&mut self, team: Team, role: Role, player_id: impl Into<String>) -> Result<()> {
        let player_id = player_id.into();
        let seat = Seat { team, role };
        if self.seats.contains_key(&seat) {
            return Err(Error::DuplicateSeat { team, role });
        }
        if self.seats.values().any(|p| *p == player_id) {
            return Err(Error::DuplicatePlayer { player_id });
        }
        self.seats.insert(seat, player_id);
        Ok(())
    }

    pub fn with(mut self, team: Team, role: Role, player_id: impl Into<String>) -> Result<Self> {
        self.insert(team, role, player_id)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Seat, &str)> + '_ {
        self.seats.iter().map(|(seat, player)| (*seat, player.as_str()))
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

/// Everything needed to create a game and all its participants at once
#[derive(Debug, Clone)]
pub struct NewGame {
    pub guild_id: String,
    pub channel_id: String,
    pub roster: Roster,
}

/// One player's seat in one game, with their rating as it was when the game was created
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = game_participant)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GameParticipant {
    game_id: Uuid,
    team: Team,
    role: Role,
    player_id: String,
    /// Only filled if the player reports it after the game
    champion_id: Option<i32>,
    trueskill_mu: f64,
    trueskill_sigma: f64,
}

impl GameParticipant {
    /// Only called while creating `game`, the role and player come from the rating itself so the
    /// (player_id, role) pair always points to an existing rating.
    pub(crate) fn new(game: &Game, team: Team, rating: &PlayerRating) -> Self {
        Self {
            game_id: game.id,
            team,
            role: rating.role,
            player_id: rating.player_id.clone(),
            champion_id: None,
            trueskill_mu: rating.trueskill_mu,
            trueskill_sigma: rating.trueskill_sigma,
        }
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn seat(&self) -> Seat {
        Seat {
            team: self.team,
            role: self.role,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn champion_id(&self) -> Option<i32> {
        self.champion_id
    }

    pub fn trueskill_mu(&self) -> f64 {
        self.trueskill_mu
    }

    pub fn trueskill_sigma(&self) -> f64 {
        self.trueskill_sigma
    }

    pub fn mmr(&self) -> f64 {
        conservative_rating(self.trueskill_mu, self.trueskill_sigma)
    }

    /// Write-once: reporting the same champion again is a no-op, a different one is refused.
    /// Returns whether the record changed.
    pub(crate) fn set_champion(&mut self, champion_id: i32) -> Result<bool> {
        match self.champion_id {
            None => {
                self.champion_id = Some(champion_id);
                Ok(true)
            }
            Some(current) if current == champion_id => Ok(false),
            Some(current) => Err(Error::ChampionAlreadySet { current }),
        }
    }
}
