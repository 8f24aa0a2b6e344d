//! Postgres backed store. Keys and foreign keys of the tables do the heavy lifting, ratings are
//! still resolved up front so a missing one is reported as such rather than as a raw constraint
//! violation.

use diesel::{upsert::excluded, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager},
    scoped_futures::ScopedFutureExt,
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    game, game_participant, player, player_rating, Game, GameParticipant, NewGame, Player,
    PlayerRating, Role,
};

use super::Store;

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgStore {
    pub fn connect(database_url: &str) -> Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager).build()?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    #[instrument(skip(self), err)]
    async fn add_player(&self, discord_id: &str, name: &str) -> Result<Player> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let player: Player = diesel::insert_into(player::table)
            .values(Player::new(discord_id, name))
            .on_conflict(player::discord_id)
            .do_update()
            .set(player::name.eq(excluded(player::name)))
            .returning(Player::as_returning())
            .get_result(conn)
            .await?;
        Ok(player)
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
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;
        let player_id = player_id.to_owned();

        conn.transaction::<_, Error, _>(|conn| {
            async move {
                let known = player::table
                    .find(&player_id)
                    .select(player::discord_id)
                    .first::<String>(conn)
                    .await
                    .optional()?;
                if known.is_none() {
                    return Err(Error::PlayerNotFound { player_id });
                }

                let rating: PlayerRating = diesel::insert_into(player_rating::table)
                    .values(rating)
                    .on_conflict((player_rating::player_id, player_rating::role))
                    .do_update()
                    .set((
                        player_rating::trueskill_mu.eq(excluded(player_rating::trueskill_mu)),
                        player_rating::trueskill_sigma.eq(excluded(player_rating::trueskill_sigma)),
                        player_rating::updated_at.eq(excluded(player_rating::updated_at)),
                    ))
                    .returning(PlayerRating::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(rating)
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self), err)]
    async fn ensure_rating(&self, player_id: &str, role: Role) -> Result<PlayerRating> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;
        let player_id = player_id.to_owned();

        conn.transaction::<_, Error, _>(|conn| {
            async move {
                let known = player::table
                    .find(&player_id)
                    .select(player::discord_id)
                    .first::<String>(conn)
                    .await
                    .optional()?;
                if known.is_none() {
                    return Err(Error::PlayerNotFound { player_id });
                }

                let created = diesel::insert_into(player_rating::table)
                    .values(PlayerRating::initial(&*player_id, role))
                    .on_conflict((player_rating::player_id, player_rating::role))
                    .do_nothing()
                    .execute(conn)
                    .await?;
                if created > 0 {
                    debug!(%player_id, %role, "Seeded rating");
                }

                let rating: PlayerRating = player_rating::table
                    .find((&player_id, role))
                    .select(PlayerRating::as_select())
                    .first(conn)
                    .await?;
                Ok(rating)
            }
            .scope_boxed()
        })
        .await
    }

    async fn rating(&self, player_id: &str, role: Role) -> Result<Option<PlayerRating>> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let rating: Option<PlayerRating> = player_rating::table
            .filter(player_rating::player_id.eq(player_id))
            .filter(player_rating::role.eq(role))
            .select(PlayerRating::as_select())
            .first(conn)
            .await
            .optional()?;
        Ok(rating)
    }

    #[instrument(skip(self, new_game), fields(seats = new_game.roster.len()), err)]
    async fn create_game(&self, new_game: NewGame) -> Result<(Game, Vec<GameParticipant>)> {
        if new_game.roster.is_empty() {
            return Err(Error::EmptyRoster);
        }

        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let (game, participants) = conn
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let game = Game::new(new_game.guild_id, new_game.channel_id);

                    let mut participants = Vec::with_capacity(new_game.roster.len());
                    for (seat, player_id) in new_game.roster.iter() {
                        let rating: PlayerRating = player_rating::table
                            .filter(player_rating::player_id.eq(player_id))
                            .filter(player_rating::role.eq(seat.role))
                            .select(PlayerRating::as_select())
                            .first(conn)
                            .await
                            .optional()?
                            .ok_or_else(|| Error::MissingRating {
                                player_id: player_id.to_owned(),
                                role: seat.role,
                            })?;
                        participants.push(GameParticipant::new(&game, seat.team, &rating));
                    }

                    diesel::insert_into(game::table).values(&game).execute(conn).await?;
                    diesel::insert_into(game_participant::table)
                        .values(&participants)
                        .execute(conn)
                        .await?;

                    Ok((game, participants))
                }
                .scope_boxed()
            })
            .await?;

        info!(game_id = %game.id, "Created game");
        Ok((game, participants))
    }

    async fn game(&self, id: Uuid) -> Result<Option<Game>> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let game: Option<Game> = game::table
            .find(id)
            .select(Game::as_select())
            .first(conn)
            .await
            .optional()?;
        Ok(game)
    }

    async fn participants(&self, game_id: Uuid) -> Result<Vec<GameParticipant>> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let mut parts: Vec<GameParticipant> = game_participant::table
            .filter(game_participant::game_id.eq(game_id))
            .select(GameParticipant::as_select())
            .load(conn)
            .await?;
        // Roles are stored as text, their alphabetical order is meaningless
        parts.sort_by_key(GameParticipant::seat);
        Ok(parts)
    }

    async fn participants_with_players(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<(GameParticipant, Player)>> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let mut rows: Vec<(GameParticipant, Player)> = game_participant::table
            .inner_join(player::table)
            .filter(game_participant::game_id.eq(game_id))
            .select((GameParticipant::as_select(), Player::as_select()))
            .load(conn)
            .await?;
        rows.sort_by_key(|(part, _)| part.seat());
        Ok(rows)
    }

    #[instrument(skip(self), err)]
    async fn report_champion(
        &self,
        game_id: Uuid,
        player_id: &str,
        champion_id: i32,
    ) -> Result<GameParticipant> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;
        let player_id = player_id.to_owned();

        conn.transaction::<_, Error, _>(|conn| {
            async move {
                let mut part: GameParticipant = game_participant::table
                    .filter(game_participant::game_id.eq(game_id))
                    .filter(game_participant::player_id.eq(&player_id))
                    .select(GameParticipant::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| Error::ParticipantNotFound {
                        game_id,
                        player_id: player_id.clone(),
                    })?;

                if part.set_champion(champion_id)? {
                    diesel::update(game_participant::table)
                        .filter(game_participant::game_id.eq(part.game_id()))
                        .filter(game_participant::team.eq(part.team()))
                        .filter(game_participant::role.eq(part.role()))
                        .set(game_participant::champion_id.eq(champion_id))
                        .execute(conn)
                        .await?;
                    debug!("Saved champion");
                }
                Ok(part)
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self), err)]
    async fn delete_game(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        // game_participant.game_id cascades on delete
        let deleted = diesel::delete(game::table.find(id)).execute(conn).await?;
        Ok(deleted > 0)
    }
}
