table! {
    game (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        guild_id -> Text,
        channel_id -> Text,
    }
}

table! {
    game_participant (game_id, team, role) {
        game_id -> Uuid,
        team -> Text,
        role -> Text,
        player_id -> Text,
        champion_id -> Nullable<Int4>,
        trueskill_mu -> Float8,
        trueskill_sigma -> Float8,
    }
}

table! {
    player (discord_id) {
        discord_id -> Text,
        name -> Text,
        created_at -> Timestamptz,
    }
}

table! {
    player_rating (player_id, role) {
        player_id -> Text,
        role -> Text,
        trueskill_mu -> Float8,
        trueskill_sigma -> Float8,
        updated_at -> Timestamptz,
    }
}

joinable!(game_participant -> game (game_id));
joinable!(game_participant -> player (player_id));
joinable!(player_rating -> player (player_id));

allow_tables_to_appear_in_same_query!(game, game_participant, player, player_rating,);
