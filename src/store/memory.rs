//! Store kept in process memory, used by tests and for dry runs. Enforces by hand the
//! constraints postgres enforces with keys.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Game, GameParticipant, NewGame, Player, PlayerRating, Role, Seat};

use super::Store;

#[derive(Debug, Default)]
struct Tables {
    players: HashMap<String, Player>,
    ratings: HashMap<(String, Role), PlayerRating>,
    games: HashMap<Uuid, Game>,
    participants: BTreeMap<(Uuid, Seat), GameParticipant>,
}

impl Tables {
    /// Same checks as the keys of the `game_participant` table
    fn insert_participant(&mut self, part: GameParticipant) -> Result<()> {
        if !self.games.contains_key(&part.game_id()) {
            return Err(Error::GameNotFound(part.game_id()));
        }
        if !self.ratings.contains_key(&(part.player_id().to_owned(), part.role())) {
            return Err(Error::MissingRating {
                player_id: part.player_id().to_owned(),
                role: part.role(),
            });
        }
        let key = (part.game_id(), part.seat());
        if self.participants.contains_key(&key) {
            return Err(Error::DuplicateSeat {
                team: part.team(),
                role: part.role(),
            });
        }
        if self.game_participants(part.game_id()).any(|p| p.player_id() == part.player_id()) {
            return Err(Error::DuplicatePlayer {
                player_id: part.player_id().to_owned(),
            });
        }
        self.participants.insert(key, part);
        Ok(())
    }

    fn game_participants(&self, game_id: Uuid) -> impl Iterator<Item = &GameParticipant> + '_ {
        self.participants
            .range((game_id, Seat::MIN)..=(game_id, Seat::MAX))
            .map(|(_, part)| part)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    #[instrument(skip(self), err)]
    async fn add_player(&self, discord_id: &str, name: &str) -> Result<Player> {
        let mut tables = self.tables.write().await;
        let player = tables
            .players
            .entry(discord_id.to_owned())
            .and_modify(|p| p.name = name.to_owned())
            .or_insert_with(|| Player::new(discord_id, name));
        Ok(player.clone())
    }

    #[instrument(skip(self), err)]
    async fn set_rating(
        &self,
        player_id: &str,
        role: Role,
        mu: f64,
        sigma: f64,
    ) -> Result<PlayerRating> {
        let rating = PlayerRating::checked(player_id, role, mu, sigma)?;
        let mut tables = self.tables.write().await;
        if !tables.players.contains_key(player_id) {
            return Err(Error::PlayerNotFound {
                player_id: player_id.to_owned(),
            });
        }
        tables.ratings.insert((player_id.to_owned(), role), rating.clone());
        Ok(rating)
    }

    #[instrument(skip(self), err)]
    async fn ensure_rating(&self, player_id: &str, role: Role) -> Result<PlayerRating> {
        let mut tables = self.tables.write().await;
        if !tables.players.contains_key(player_id) {
            return Err(Error::PlayerNotFound {
                player_id: player_id.to_owned(),
            });
        }
        let rating = tables
            .ratings
            .entry((player_id.to_owned(), role))
            .or_insert_with(|| PlayerRating::initial(player_id, role));
        Ok(rating.clone())
    }

    async fn rating(&self, player_id: &str, role: Role) -> Result<Option<PlayerRating>> {
        let tables = self.tables.read().await;
        Ok(tables.ratings.get(&(player_id.to_owned(), role)).cloned())
    }

    #[instrument(skip(self, new_game), fields(seats = new_game.roster.len()), err)]
    async fn create_game(&self, new_game: NewGame) -> Result<(Game, Vec<GameParticipant>)> {
        if new_game.roster.is_empty() {
            return Err(Error::EmptyRoster);
        }

        let mut tables = self.tables.write().await;

        // Resolve every rating before touching anything
        let game = Game::new(new_game.guild_id, new_game.channel_id);
        let participants = new_game
            .roster
            .iter()
            .map(|(seat, player_id)| {
                tables
                    .ratings
                    .get(&(player_id.to_owned(), seat.role))
                    .map(|rating| GameParticipant::new(&game, seat.team, rating))
                    .ok_or_else(|| Error::MissingRating {
                        player_id: player_id.to_owned(),
                        role: seat.role,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        tables.games.insert(game.id, game.clone());
        for part in participants.iter().cloned() {
            if let Err(e) = tables.insert_participant(part) {
                tables.participants.retain(|(id, _), _| *id != game.id);
                tables.games.remove(&game.id);
                return Err(e);
            }
        }

        debug!(game_id = %game.id, "Created game");
        Ok((game, participants))
    }

    async fn game(&self, id: Uuid) -> Result<Option<Game>> {
        Ok(self.tables.read().await.games.get(&id).cloned())
    }

    async fn participants(&self, game_id: Uuid) -> Result<Vec<GameParticipant>> {
        let tables = self.tables.read().await;
        Ok(tables.game_participants(game_id).cloned().collect())
    }

    async fn participants_with_players(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<(GameParticipant, Player)>> {
        let tables = self.tables.read().await;
        tables
            .game_participants(game_id)
            .map(|part| {
                let player = tables.players.get(part.player_id()).ok_or_else(|| {
                    Error::PlayerNotFound {
                        player_id: part.player_id().to_owned(),
                    }
                })?;
                Ok((part.clone(), player.clone()))
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn report_champion(
        &self,
        game_id: Uuid,
        player_id: &str,
        champion_id: i32,
    ) -> Result<GameParticipant> {
        let mut tables = self.tables.write().await;
        let part = tables
            .participants
            .range_mut((game_id, Seat::MIN)..=(game_id, Seat::MAX))
            .map(|(_, part)| part)
            .find(|part| part.player_id() == player_id)
            .ok_or_else(|| Error::ParticipantNotFound {
                game_id,
                player_id: player_id.to_owned(),
            })?;

        if part.set_champion(champion_id)? {
            debug!("Saved champion");
        }
        Ok(part.clone())
    }

    #[instrument(skip(self), err)]
    async fn delete_game(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.participants.retain(|(game_id, _), _| *game_id != id);
        Ok(tables.games.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::models::{Roster, Team, DEFAULT_MU, DEFAULT_SIGMA};

    async fn store_with_players(players: &[(&str, Role, f64, f64)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (id, role, mu, sigma) in players {
            store.add_player(id, &format!("player-{}", id)).await.unwrap();
            store.set_rating(id, *role, *mu, *sigma).await.unwrap();
        }
        store
    }

    fn new_game(roster: Roster) -> NewGame {
        NewGame {
            guild_id: "guild".to_owned(),
            channel_id: "channel".to_owned(),
            roster,
        }
    }

    #[tokio::test]
    async fn create_game_snapshots_ratings() {
        let store =
            store_with_players(&[("1", Role::Jungle, 25.0, 8.3), ("2", Role::Mid, 30.0, 1.0)])
                .await;
        let roster = Roster::new()
            .with(Team::Blue, Role::Jungle, "1")
            .and_then(|r| r.with(Team::Red, Role::Mid, "2"))
            .unwrap();

        let (game, parts) = store.create_game(new_game(roster)).await.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(store.game(game.id).await.unwrap(), Some(game.clone()));

        let stored = store.participants(game.id).await.unwrap();
        assert_eq!(stored, parts);
        assert_eq!(stored[0].player_id(), "1");
        assert_relative_eq!(stored[0].mmr(), 25.1, epsilon = 1e-9);
        assert_relative_eq!(stored[1].mmr(), 52.0);
        assert!(stored.iter().all(|p| p.champion_id().is_none()));
    }

    #[tokio::test]
    async fn rating_changes_do_not_touch_past_games() {
        let store = store_with_players(&[("1", Role::Top, 25.0, 8.0)]).await;
        let roster = Roster::new().with(Team::Blue, Role::Top, "1").unwrap();
        let (game, _) = store.create_game(new_game(roster)).await.unwrap();

        store.set_rating("1", Role::Top, 40.0, 2.0).await.unwrap();

        let part = &store.participants(game.id).await.unwrap()[0];
        assert_relative_eq!(part.trueskill_mu(), 25.0);
        assert_relative_eq!(part.trueskill_sigma(), 8.0);
        assert_relative_eq!(store.rating("1", Role::Top).await.unwrap().unwrap().mmr(), 59.0);
    }

    #[tokio::test]
    async fn missing_rating_writes_nothing() {
        let store = store_with_players(&[("1", Role::Top, 25.0, 8.0)]).await;
        store.add_player("2", "no-rating").await.unwrap();
        let roster = Roster::new()
            .with(Team::Blue, Role::Top, "1")
            .and_then(|r| r.with(Team::Red, Role::Top, "2"))
            .unwrap();

        let err = store.create_game(new_game(roster)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRating {
                ref player_id,
                role: Role::Top,
            } if player_id == "2"
        ));
        assert!(store.tables.read().await.games.is_empty());
        assert!(store.tables.read().await.participants.is_empty());
    }

    #[tokio::test]
    async fn rating_for_another_role_does_not_count() {
        let store = store_with_players(&[("1", Role::Support, 25.0, 8.0)]).await;
        let roster = Roster::new().with(Team::Blue, Role::Bot, "1").unwrap();

        assert!(matches!(
            store.create_game(new_game(roster)).await,
            Err(Error::MissingRating {
                role: Role::Bot,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn empty_roster_is_refused() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create_game(new_game(Roster::new())).await,
            Err(Error::EmptyRoster)
        ));
    }

    #[tokio::test]
    async fn rating_needs_a_player() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set_rating("404", Role::Mid, 25.0, 8.0).await,
            Err(Error::PlayerNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ensure_rating_seeds_defaults_once() {
        let store = MemoryStore::new();
        store.add_player("1", "one").await.unwrap();

        let rating = store.ensure_rating("1", Role::Jungle).await.unwrap();
        assert_relative_eq!(rating.trueskill_mu, DEFAULT_MU);
        assert_relative_eq!(rating.trueskill_sigma, DEFAULT_SIGMA);
        assert_relative_eq!(rating.mmr(), 25.0, epsilon = 1e-9);

        // An existing rating is left alone
        store.set_rating("1", Role::Jungle, 31.0, 3.0).await.unwrap();
        let rating = store.ensure_rating("1", Role::Jungle).await.unwrap();
        assert_relative_eq!(rating.trueskill_mu, 31.0);
        assert_relative_eq!(rating.trueskill_sigma, 3.0);

        assert!(matches!(
            store.ensure_rating("404", Role::Top).await,
            Err(Error::PlayerNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn seeded_rating_is_enough_to_play() {
        let store = MemoryStore::new();
        store.add_player("1", "one").await.unwrap();
        store.ensure_rating("1", Role::Support).await.unwrap();
        let roster = Roster::new().with(Team::Red, Role::Support, "1").unwrap();

        let (_, parts) = store.create_game(new_game(roster)).await.unwrap();
        assert_relative_eq!(parts[0].trueskill_mu(), DEFAULT_MU);
        assert_relative_eq!(parts[0].trueskill_sigma(), DEFAULT_SIGMA);
    }

    #[tokio::test]
    async fn invalid_rating_is_not_stored() {
        let store = store_with_players(&[("1", Role::Mid, 25.0, 8.0)]).await;

        assert!(matches!(
            store.set_rating("1", Role::Mid, f64::NAN, 8.0).await,
            Err(Error::InvalidRating { .. })
        ));
        assert!(matches!(
            store.set_rating("1", Role::Mid, 25.0, -0.5).await,
            Err(Error::InvalidRating { .. })
        ));
        let rating = store.rating("1", Role::Mid).await.unwrap().unwrap();
        assert_relative_eq!(rating.trueskill_mu, 25.0);
        assert_relative_eq!(rating.trueskill_sigma, 8.0);
    }

    #[tokio::test]
    async fn participants_come_with_their_player() {
        let store =
            store_with_players(&[("1", Role::Top, 25.0, 8.0), ("2", Role::Top, 28.0, 6.0)]).await;
        let roster = Roster::new()
            .with(Team::Red, Role::Top, "2")
            .and_then(|r| r.with(Team::Blue, Role::Top, "1"))
            .unwrap();
        let (game, _) = store.create_game(new_game(roster)).await.unwrap();
        store.add_player("2", "renamed").await.unwrap();

        let rows = store.participants_with_players(game.id).await.unwrap();
        let names = rows
            .iter()
            .map(|(part, player)| (part.team(), player.name.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(names, [(Team::Blue, "player-1"), (Team::Red, "renamed")]);
        assert!(rows.iter().all(|(part, player)| part.player_id() == player.discord_id));
    }

    #[tokio::test]
    async fn add_player_updates_name() {
        let store = MemoryStore::new();
        let first = store.add_player("1", "old").await.unwrap();
        let second = store.add_player("1", "new").await.unwrap();
        assert_eq!(second.name, "new");
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn duplicate_seat_is_rejected() {
        let store =
            store_with_players(&[("1", Role::Top, 25.0, 8.0), ("2", Role::Top, 25.0, 8.0)]).await;
        let roster = Roster::new().with(Team::Blue, Role::Top, "1").unwrap();
        let (game, _) = store.create_game(new_game(roster)).await.unwrap();

        let rating = store.rating("2", Role::Top).await.unwrap().unwrap();
        let intruder = GameParticipant::new(&game, Team::Blue, &rating);
        let mut tables = store.tables.write().await;
        assert!(matches!(
            tables.insert_participant(intruder),
            Err(Error::DuplicateSeat {
                team: Team::Blue,
                role: Role::Top
            })
        ));
        assert_eq!(tables.participants.len(), 1);
    }

    #[tokio::test]
    async fn participant_needs_a_game() {
        let store = store_with_players(&[("1", Role::Top, 25.0, 8.0)]).await;
        let rating = store.rating("1", Role::Top).await.unwrap().unwrap();
        let orphan = GameParticipant::new(&Game::new("guild", "channel"), Team::Red, &rating);

        assert!(matches!(
            store.tables.write().await.insert_participant(orphan),
            Err(Error::GameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn champion_report_is_write_once() {
        let store = store_with_players(&[("1", Role::Mid, 25.0, 8.0)]).await;
        let roster = Roster::new().with(Team::Red, Role::Mid, "1").unwrap();
        let (game, _) = store.create_game(new_game(roster)).await.unwrap();

        let part = store.report_champion(game.id, "1", 103).await.unwrap();
        assert_eq!(part.champion_id(), Some(103));

        // Same value again is fine
        let part = store.report_champion(game.id, "1", 103).await.unwrap();
        assert_eq!(part.champion_id(), Some(103));

        assert!(matches!(
            store.report_champion(game.id, "1", 7).await,
            Err(Error::ChampionAlreadySet { current: 103 })
        ));
        assert_eq!(store.participants(game.id).await.unwrap()[0].champion_id(), Some(103));
    }

    #[tokio::test]
    async fn champion_report_from_a_stranger() {
        let store = store_with_players(&[("1", Role::Mid, 25.0, 8.0)]).await;
        let roster = Roster::new().with(Team::Red, Role::Mid, "1").unwrap();
        let (game, _) = store.create_game(new_game(roster)).await.unwrap();

        assert!(matches!(
            store.report_champion(game.id, "2", 1).await,
            Err(Error::ParticipantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_game_cascades() {
        let store =
            store_with_players(&[("1", Role::Mid, 25.0, 8.0), ("2", Role::Mid, 25.0, 8.0)]).await;
        let (kept, _) = store
            .create_game(new_game(Roster::new().with(Team::Red, Role::Mid, "1").unwrap()))
            .await
            .unwrap();
        let (game, _) = store
            .create_game(new_game(Roster::new().with(Team::Blue, Role::Mid, "2").unwrap()))
            .await
            .unwrap();

        assert!(store.delete_game(game.id).await.unwrap());
        assert!(!store.delete_game(game.id).await.unwrap());
        assert!(store.game(game.id).await.unwrap().is_none());
        assert!(store.participants(game.id).await.unwrap().is_empty());
        assert_eq!(store.participants(kept.id).await.unwrap().len(), 1);
    }
}
