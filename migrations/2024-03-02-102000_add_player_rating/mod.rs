use barrel::{Migration, types};

/// Handle up migrations
fn up(m: &mut Migration) {
    m.create_table("player_rating", |t| {
        t.add_column("player_id", types::text().nullable(false));
        t.add_column("role", types::text().nullable(false));
        t.add_column("trueskill_mu", types::double().nullable(false));
        t.add_column("trueskill_sigma", types::double().nullable(false));
        t.inject_custom("updated_at timestamptz default now() not null");
        t.inject_custom("constraint player_rating_pkey primary key (player_id, role)");
        t.inject_custom(
            "constraint player_rating_player_id_fkey foreign key (player_id) references player(discord_id)"
        );
        t.inject_custom(
            "constraint player_rating_role_check check (role in ('top', 'jungle', 'mid', 'bot', 'support'))"
        );
    });
}

/// Handle down migrations
fn down(m: &mut Migration) {
    m.drop_table("player_rating")
}
