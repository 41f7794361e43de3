use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

/// Versioned migrations. Each step runs once and records its version.
///
/// Edge and history rows deliberately carry no foreign keys to the things
/// they point at: deleting a video or a user leaves them dangling, and the
/// aggregation views skip whatever no longer resolves.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                full_name       TEXT NOT NULL,
                avatar          TEXT NOT NULL,
                cover_image     TEXT,
                password        TEXT NOT NULL,
                refresh_token   TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE videos (
                id                  TEXT PRIMARY KEY,
                owner_id            TEXT NOT NULL,
                title               TEXT NOT NULL,
                description         TEXT NOT NULL DEFAULT '',
                video_url           TEXT NOT NULL,
                thumbnail_url       TEXT NOT NULL,
                duration_seconds    REAL NOT NULL DEFAULT 0,
                views               INTEGER NOT NULL DEFAULT 0,
                is_published        INTEGER NOT NULL DEFAULT 1,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_videos_owner ON videos(owner_id, created_at);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                video_id    TEXT NOT NULL,
                owner_id    TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_comments_video ON comments(video_id, created_at);

            CREATE TABLE tweets (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_tweets_owner ON tweets(owner_id, created_at);

            CREATE TABLE playlists (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_playlists_owner ON playlists(owner_id, created_at);

            CREATE TABLE playlist_videos (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
                video_id    TEXT NOT NULL
            );

            CREATE INDEX idx_playlist_videos_playlist ON playlist_videos(playlist_id, seq);

            CREATE TABLE watch_history (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL,
                video_id    TEXT NOT NULL,
                watched_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_watch_history_user ON watch_history(user_id, seq);

            CREATE TABLE subscriptions (
                seq             INTEGER PRIMARY KEY AUTOINCREMENT,
                subscriber_id   TEXT NOT NULL,
                channel_id      TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(subscriber_id, channel_id)
            );

            CREATE INDEX idx_subscriptions_channel ON subscriptions(channel_id, seq);

            CREATE TABLE likes (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                actor_id    TEXT NOT NULL,
                target_kind TEXT NOT NULL CHECK (target_kind IN ('video', 'comment', 'tweet')),
                target_id   TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(actor_id, target_kind, target_id)
            );

            CREATE INDEX idx_likes_target ON likes(target_kind, target_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
