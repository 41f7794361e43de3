use rusqlite::{params, params_from_iter};
use uuid::Uuid;

use vidhub_core::StoreResult;
use vidhub_core::store::{Edge, EdgePattern, RelationStore};

use crate::{Database, uuid_at};

/// Table, key filter and bound values identifying one edge.
fn edge_key(edge: &Edge) -> (&'static str, &'static str, Vec<String>) {
    match *edge {
        Edge::Subscription { subscriber, channel } => (
            "subscriptions",
            "subscriber_id = ?1 AND channel_id = ?2",
            vec![subscriber.to_string(), channel.to_string()],
        ),
        Edge::Like { actor, kind, target } => (
            "likes",
            "actor_id = ?1 AND target_kind = ?2 AND target_id = ?3",
            vec![actor.to_string(), kind.as_str().to_string(), target.to_string()],
        ),
    }
}

/// Free endpoint column, table, filter and bound values for a pattern.
fn pattern_query(pattern: &EdgePattern) -> (&'static str, &'static str, &'static str, Vec<String>) {
    match *pattern {
        EdgePattern::SubscriptionsBy(user) => (
            "channel_id",
            "subscriptions",
            "subscriber_id = ?1",
            vec![user.to_string()],
        ),
        EdgePattern::SubscribersOf(channel) => (
            "subscriber_id",
            "subscriptions",
            "channel_id = ?1",
            vec![channel.to_string()],
        ),
        EdgePattern::LikesBy { actor, kind } => (
            "target_id",
            "likes",
            "actor_id = ?1 AND target_kind = ?2",
            vec![actor.to_string(), kind.as_str().to_string()],
        ),
        EdgePattern::LikesOn { kind, target } => (
            "actor_id",
            "likes",
            "target_kind = ?1 AND target_id = ?2",
            vec![kind.as_str().to_string(), target.to_string()],
        ),
    }
}

impl RelationStore for Database {
    fn edge_exists(&self, edge: &Edge) -> StoreResult<bool> {
        let (table, filter, values) = edge_key(edge);
        self.read(|conn| {
            let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {})", table, filter);
            let exists: bool = conn.query_row(&sql, params_from_iter(values), |r| r.get(0))?;
            Ok(exists)
        })
    }

    fn insert_edge(&self, edge: &Edge) -> StoreResult<()> {
        self.write(|conn| {
            match *edge {
                Edge::Subscription { subscriber, channel } => conn.execute(
                    "INSERT INTO subscriptions (subscriber_id, channel_id) VALUES (?1, ?2)",
                    params![subscriber.to_string(), channel.to_string()],
                )?,
                Edge::Like { actor, kind, target } => conn.execute(
                    "INSERT INTO likes (actor_id, target_kind, target_id) VALUES (?1, ?2, ?3)",
                    params![actor.to_string(), kind.as_str(), target.to_string()],
                )?,
            };
            Ok(())
        })
    }

    fn delete_edge(&self, edge: &Edge) -> StoreResult<bool> {
        let (table, filter, values) = edge_key(edge);
        self.write(|conn| {
            let sql = format!("DELETE FROM {} WHERE {}", table, filter);
            let removed = conn.execute(&sql, params_from_iter(values))?;
            Ok(removed > 0)
        })
    }

    fn count_edges(&self, pattern: &EdgePattern) -> StoreResult<u64> {
        let (_, table, filter, values) = pattern_query(pattern);
        self.read(|conn| {
            let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", table, filter);
            let count: i64 = conn.query_row(&sql, params_from_iter(values), |r| r.get(0))?;
            Ok(count.max(0) as u64)
        })
    }

    fn edge_endpoints(&self, pattern: &EdgePattern) -> StoreResult<Vec<Uuid>> {
        let (endpoint, table, filter, values) = pattern_query(pattern);
        self.read(|conn| {
            let sql = format!("SELECT {} FROM {} WHERE {} ORDER BY seq", endpoint, table, filter);
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_from_iter(values), |row| uuid_at(row, 0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
    }

    fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.read(|conn| {
            let mut stmt =
                conn.prepare("SELECT video_id FROM watch_history WHERE user_id = ?1 ORDER BY seq")?;
            let ids = stmt
                .query_map([user_id.to_string()], |row| uuid_at(row, 0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
    }

    fn append_watch_history(&self, user_id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO watch_history (user_id, video_id) VALUES (?1, ?2)",
                params![user_id.to_string(), video_id.to_string()],
            )?;
            Ok(())
        })
    }
}
