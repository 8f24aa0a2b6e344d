use barrel::{Migration, Table, types};

/// Handle up migrations
fn up(m: &mut Migration) {
    m.create_table("game_participant", |t: &mut Table| {
        t.add_column("game_id", types::uuid().nullable(false));
        t.add_column("team", types::text().nullable(false));
        t.add_column("role", types::text().nullable(false));
        t.add_column("player_id", types::text().nullable(false).indexed(true));
        // Self reported after the game
        t.add_column("champion_id", types::integer().nullable(true));
        // Rating at game creation, never updated
        t.add_column("trueskill_mu", types::double().nullable(false));
        t.add_column("trueskill_sigma", types::double().nullable(false));
        t.inject_custom("constraint game_participant_pkey primary key (game_id, team, role)");
        t.inject_custom("constraint game_participant_game_id_player_id_key unique (game_id, player_id)");
        t.inject_custom(
            "constraint game_participant_game_id_fkey foreign key (game_id) references game(id) on delete cascade"
        );
        t.inject_custom(
            "constraint game_participant_player_id_fkey foreign key (player_id) references player(discord_id)"
        );
        t.inject_custom(
            "constraint game_participant_player_id_role_fkey foreign key (player_id, role) references player_rating(player_id, role)"
        );
        t.inject_custom("constraint game_participant_team_check check (team in ('blue', 'red'))");
    });
}

/// Handle down migrations
fn down(m: &mut Migration) {
    m.drop_table("game_participant");
}
