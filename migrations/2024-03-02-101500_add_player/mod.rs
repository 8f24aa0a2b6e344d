use barrel::{Migration, types};

/// Handle up migrations
fn up(m: &mut Migration) {
    m.create_table("player", |t| {
        t.add_column("discord_id", types::text().primary(true).nullable(false));
        t.add_column("name", types::text().nullable(false));
        t.inject_custom("created_at timestamptz default now() not null");
    });
}

/// Handle down migrations
fn down(m: &mut Migration) {
    m.drop_table("player")
}
