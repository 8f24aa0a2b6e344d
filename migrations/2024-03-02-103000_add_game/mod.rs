use barrel::{Migration, Table, types};

/// Handle up migrations
fn up(m: &mut Migration) {
    m.create_table("game", |t: &mut Table| {
        t.inject_custom("id uuid primary key not null unique");
        t.inject_custom("created_at timestamptz default now() not null");
        t.add_column("guild_id", types::text().nullable(false));
        t.add_column("channel_id", types::text().nullable(false));
    });
}

/// Handle down migrations
fn down(m: &mut Migration) {
    m.drop_table("game");
}
