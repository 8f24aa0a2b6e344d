/*!
 * Admin command handlers
 */

use itertools::Itertools;
use tracing::info;
use uuid::Uuid;

use crate::error::Error;
use crate::store::Store;
use super::*;

pub async fn show(store: &dyn Store, game_id: Uuid) -> StringResult {
    let game = store.game(game_id).await?.ok_or(Error::GameNotFound(game_id))?;
    let rows = store.participants_with_players(game_id).await?;

    let lines = rows
        .iter()
        .map(|(p, player)| {
            let champion = match p.champion_id() {
                Some(id) => id.to_string(),
                None => "-".to_owned(),
            };
            format!(
                "{:<4} {:<7} {:<20} mmr {:>6.1} (mu {:.2}, sigma {:.2}) champion {}",
                p.team().as_str(),
                p.role().as_str(),
                player.name,
                p.mmr(),
                p.trueskill_mu(),
                p.trueskill_sigma(),
                champion
            )
        })
        .join("\n");

    Ok(Some(format!("Game {} created at {}\n{}", game.id, game.created_at, lines)))
}

pub async fn delete(store: &dyn Store, game_id: Uuid) -> StringResult {
    if !store.delete_game(game_id).await? {
        return Err(Error::GameNotFound(game_id));
    }
    info!(%game_id, "Deleted game");
    Ok(Some(format!("Game {} deleted", game_id)))
}
