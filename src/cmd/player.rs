/*!
 * Regular player command handler
 */

use tracing::info;
use uuid::Uuid;

use crate::store::Store;
use super::*;

/// A player telling which champion they played once the game is over
pub async fn champion(
    store: &dyn Store,
    game_id: Uuid,
    player_id: &str,
    champion_id: i32,
) -> StringResult {
    let part = store.report_champion(game_id, player_id, champion_id).await?;
    info!(%game_id, player_id, champion_id, "Champion reported");

    Ok(Some(format!(
        "Champion {} saved for {} {} in game {}",
        champion_id,
        part.team(),
        part.role(),
        game_id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{NewGame, Role, Roster, Team};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn report_and_refuse_change() {
        let store = MemoryStore::new();
        store.add_player("7", "seven").await.unwrap();
        store.set_rating("7", Role::Support, 20.0, 5.0).await.unwrap();
        let roster = Roster::new().with(Team::Red, Role::Support, "7").unwrap();
        let (game, _) = store
            .create_game(NewGame {
                guild_id: "g".to_owned(),
                channel_id: "c".to_owned(),
                roster,
            })
            .await
            .unwrap();

        let reply = champion(&store, game.id, "7", 412).await.unwrap().unwrap();
        assert_eq!(reply, format!("Champion 412 saved for red support in game {}", game.id));

        let err = champion(&store, game.id, "7", 89).await.unwrap_err();
        assert!(matches!(err, Error::ChampionAlreadySet { current: 412 }));
        assert_eq!(err.as_message(), "You already reported champion 412 for this game");
    }
}
