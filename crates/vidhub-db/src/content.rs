use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vidhub_core::StoreResult;
use vidhub_core::store::ContentStore;
use vidhub_types::models::{CommentRecord, PlaylistRecord, TweetRecord, VideoRecord};

use crate::{Database, select_by_ids, timestamp_at, uuid_at};

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, thumbnail_url, \
                             duration_seconds, views, is_published, created_at";

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
    Ok(VideoRecord {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        video_url: row.get(4)?,
        thumbnail_url: row.get(5)?,
        duration_seconds: row.get(6)?,
        views: row.get(7)?,
        is_published: row.get(8)?,
        created_at: timestamp_at(row, 9)?,
    })
}

fn tweet_from_row(row: &Row<'_>) -> rusqlite::Result<TweetRecord> {
    Ok(TweetRecord {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        content: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: uuid_at(row, 0)?,
        video_id: uuid_at(row, 1)?,
        owner_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
    })
}

/// Playlist row without its video list; filled in by `load_playlist_videos`.
fn playlist_from_row(row: &Row<'_>) -> rusqlite::Result<PlaylistRecord> {
    Ok(PlaylistRecord {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        videos: Vec::new(),
        created_at: timestamp_at(row, 4)?,
    })
}

fn load_playlist_videos(conn: &Connection, playlist: &mut PlaylistRecord) -> Result<()> {
    let mut stmt =
        conn.prepare("SELECT video_id FROM playlist_videos WHERE playlist_id = ?1 ORDER BY seq")?;
    playlist.videos = stmt
        .query_map([playlist.id.to_string()], |row| uuid_at(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(())
}

fn delete_by_id(conn: &Connection, table: &str, id: Uuid) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table);
    Ok(conn.execute(&sql, [id.to_string()])? > 0)
}

impl ContentStore for Database {
    // -- Videos --

    fn insert_video(&self, video: &VideoRecord) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO videos (id, owner_id, title, description, video_url, thumbnail_url,
                                     duration_seconds, views, is_published, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    video.id.to_string(),
                    video.owner_id.to_string(),
                    video.title,
                    video.description,
                    video.video_url,
                    video.thumbnail_url,
                    video.duration_seconds,
                    video.views,
                    video.is_published,
                    video.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn video_by_id(&self, id: Uuid) -> StoreResult<Option<VideoRecord>> {
        self.read(|conn| {
            let sql = format!("SELECT {} FROM videos WHERE id = ?1", VIDEO_COLUMNS);
            Ok(conn.query_row(&sql, [id.to_string()], video_from_row).optional()?)
        })
    }

    fn videos_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<VideoRecord>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.read(|conn| select_by_ids(conn, "videos", VIDEO_COLUMNS, ids, video_from_row))
    }

    fn videos_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<VideoRecord>> {
        self.read(|conn| {
            let sql = format!(
                "SELECT {} FROM videos WHERE owner_id = ?1 ORDER BY rowid",
                VIDEO_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let videos = stmt
                .query_map([owner_id.to_string()], video_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(videos)
        })
    }

    fn update_video(&self, video: &VideoRecord) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "UPDATE videos SET title = ?2, description = ?3, thumbnail_url = ?4, is_published = ?5
                 WHERE id = ?1",
                params![
                    video.id.to_string(),
                    video.title,
                    video.description,
                    video.thumbnail_url,
                    video.is_published,
                ],
            )?;
            Ok(())
        })
    }

    fn delete_video(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|conn| delete_by_id(conn, "videos", id))
    }

    fn increment_views(&self, id: Uuid) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute("UPDATE videos SET views = views + 1 WHERE id = ?1", [id.to_string()])?;
            Ok(())
        })
    }

    // -- Playlists --

    fn insert_playlist(&self, playlist: &PlaylistRecord) -> StoreResult<()> {
        self.write(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO playlists (id, owner_id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    playlist.id.to_string(),
                    playlist.owner_id.to_string(),
                    playlist.name,
                    playlist.description,
                    playlist.created_at.to_rfc3339(),
                ],
            )?;
            for video_id in &playlist.videos {
                tx.execute(
                    "INSERT INTO playlist_videos (playlist_id, video_id) VALUES (?1, ?2)",
                    params![playlist.id.to_string(), video_id.to_string()],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn playlist_by_id(&self, id: Uuid) -> StoreResult<Option<PlaylistRecord>> {
        self.read(|conn| {
            let playlist = conn
                .query_row(
                    "SELECT id, owner_id, name, description, created_at FROM playlists WHERE id = ?1",
                    [id.to_string()],
                    playlist_from_row,
                )
                .optional()?;

            match playlist {
                Some(mut playlist) => {
                    load_playlist_videos(conn, &mut playlist)?;
                    Ok(Some(playlist))
                }
                None => Ok(None),
            }
        })
    }

    fn playlists_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<PlaylistRecord>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, description, created_at FROM playlists
                 WHERE owner_id = ?1 ORDER BY rowid",
            )?;
            let mut playlists = stmt
                .query_map([owner_id.to_string()], playlist_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for playlist in &mut playlists {
                load_playlist_videos(conn, playlist)?;
            }
            Ok(playlists)
        })
    }

    fn update_playlist_details(&self, id: Uuid, name: &str, description: &str) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "UPDATE playlists SET name = ?2, description = ?3 WHERE id = ?1",
                params![id.to_string(), name, description],
            )?;
            Ok(())
        })
    }

    fn delete_playlist(&self, id: Uuid) -> StoreResult<bool> {
        // playlist_videos rows cascade
        self.write(|conn| delete_by_id(conn, "playlists", id))
    }

    fn push_playlist_video(&self, id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO playlist_videos (playlist_id, video_id) VALUES (?1, ?2)",
                params![id.to_string(), video_id.to_string()],
            )?;
            Ok(())
        })
    }

    fn pull_playlist_video(&self, id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                params![id.to_string(), video_id.to_string()],
            )?;
            Ok(())
        })
    }

    // -- Tweets --

    fn insert_tweet(&self, tweet: &TweetRecord) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO tweets (id, owner_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    tweet.id.to_string(),
                    tweet.owner_id.to_string(),
                    tweet.content,
                    tweet.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn tweet_by_id(&self, id: Uuid) -> StoreResult<Option<TweetRecord>> {
        self.read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, owner_id, content, created_at FROM tweets WHERE id = ?1",
                    [id.to_string()],
                    tweet_from_row,
                )
                .optional()?)
        })
    }

    fn tweets_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<TweetRecord>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, content, created_at FROM tweets WHERE owner_id = ?1 ORDER BY rowid",
            )?;
            let tweets = stmt
                .query_map([owner_id.to_string()], tweet_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tweets)
        })
    }

    fn update_tweet_content(&self, id: Uuid, content: &str) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "UPDATE tweets SET content = ?2 WHERE id = ?1",
                params![id.to_string(), content],
            )?;
            Ok(())
        })
    }

    fn delete_tweet(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|conn| delete_by_id(conn, "tweets", id))
    }

    // -- Comments --

    fn insert_comment(&self, comment: &CommentRecord) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO comments (id, video_id, owner_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    comment.id.to_string(),
                    comment.video_id.to_string(),
                    comment.owner_id.to_string(),
                    comment.content,
                    comment.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn comment_by_id(&self, id: Uuid) -> StoreResult<Option<CommentRecord>> {
        self.read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, video_id, owner_id, content, created_at FROM comments WHERE id = ?1",
                    [id.to_string()],
                    comment_from_row,
                )
                .optional()?)
        })
    }

    fn comments_for_video(&self, video_id: Uuid) -> StoreResult<Vec<CommentRecord>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, video_id, owner_id, content, created_at FROM comments
                 WHERE video_id = ?1 ORDER BY rowid",
            )?;
            let comments = stmt
                .query_map([video_id.to_string()], comment_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
    }

    fn update_comment_content(&self, id: Uuid, content: &str) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "UPDATE comments SET content = ?2 WHERE id = ?1",
                params![id.to_string(), content],
            )?;
            Ok(())
        })
    }

    fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|conn| delete_by_id(conn, "comments", id))
    }
}
