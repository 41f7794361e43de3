//! Read-only derived views over the stores.
//!
//! Views are built from four primitives: point resolution, ordered set
//! resolution, typed projection and edge counting. Edges and history rows
//! that point at deleted entities are dropped silently.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use vidhub_types::models::{
    ChannelProfile, ChannelSummary, LikeKind, PublicUser, UserRecord, VideoRecord, VideoSummary,
    WatchHistoryEntry,
};

use crate::credentials::normalize_username;
use crate::error::{CoreError, CoreResult, StoreResult};
use crate::session::Identity;
use crate::store::{ContentStore, CredentialStore, Edge, EdgePattern, RelationStore};

/// Entities addressable by id.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for UserRecord {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for VideoRecord {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Narrowing into an allow-listed shape.
pub trait Project<T> {
    fn project(&self) -> T;
}

impl Project<PublicUser> for UserRecord {
    fn project(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            created_at: self.created_at,
        }
    }
}

impl Project<ChannelSummary> for UserRecord {
    fn project(&self) -> ChannelSummary {
        ChannelSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

impl Project<VideoSummary> for VideoRecord {
    fn project(&self) -> VideoSummary {
        VideoSummary {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            duration_seconds: self.duration_seconds,
            views: self.views,
        }
    }
}

pub fn resolve_by_id<T, F>(id: Uuid, fetch: F) -> StoreResult<Option<T>>
where
    F: FnOnce(Uuid) -> StoreResult<Option<T>>,
{
    fetch(id)
}

/// Resolve `ids` with one batch fetch and return entities in input order.
///
/// Absent ids are omitted; repeated ids yield repeated entities.
pub fn resolve_by_set<T, F>(ids: &[Uuid], fetch: F) -> StoreResult<Vec<T>>
where
    T: Keyed + Clone,
    F: FnOnce(&[Uuid]) -> StoreResult<Vec<T>>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::with_capacity(ids.len());
    let distinct: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

    let found: HashMap<Uuid, T> = fetch(&distinct)?
        .into_iter()
        .map(|entity| (entity.key(), entity))
        .collect();

    Ok(ids.iter().filter_map(|id| found.get(id).cloned()).collect())
}

pub fn count_edges<S: RelationStore>(store: &S, pattern: &EdgePattern) -> StoreResult<u64> {
    store.count_edges(pattern)
}

/// Public profile of a channel plus its subscription figures.
///
/// `is_subscribed` is only ever true for an authenticated viewer.
pub fn channel_profile<S>(store: &S, username: &str, viewer: Option<&Identity>) -> CoreResult<ChannelProfile>
where
    S: CredentialStore + RelationStore,
{
    let username = normalize_username(username);
    if username.is_empty() {
        return Err(CoreError::Validation("username is required".into()));
    }

    let channel = store
        .user_by_username(&username)?
        .ok_or(CoreError::NotFound("channel"))?;

    let subscriber_count = count_edges(store, &EdgePattern::SubscribersOf(channel.id))?;
    let subscription_count = count_edges(store, &EdgePattern::SubscriptionsBy(channel.id))?;

    let is_subscribed = match viewer {
        Some(viewer) => store.edge_exists(&Edge::Subscription {
            subscriber: viewer.id,
            channel: channel.id,
        })?,
        None => false,
    };

    Ok(ChannelProfile {
        user: channel.project(),
        subscriber_count,
        subscription_count,
        is_subscribed,
    })
}

/// The user's watch history with each video's uploader attached.
pub fn watch_history<S>(store: &S, user_id: Uuid) -> CoreResult<Vec<WatchHistoryEntry>>
where
    S: CredentialStore + RelationStore + ContentStore,
{
    let user = store.user_by_id(user_id)?.ok_or(CoreError::NotFound("user"))?;

    let history = store.watch_history(user.id)?;
    let videos = resolve_by_set(&history, |ids| store.videos_by_ids(ids))?;

    let owner_ids: Vec<Uuid> = videos.iter().map(|v| v.owner_id).collect();
    let owners: HashMap<Uuid, ChannelSummary> = resolve_by_set(&owner_ids, |ids| store.users_by_ids(ids))?
        .iter()
        .map(|owner| (owner.id, owner.project()))
        .collect();

    Ok(videos
        .iter()
        .map(|video| WatchHistoryEntry {
            video: video.project(),
            owner: owners.get(&video.owner_id).cloned(),
        })
        .collect())
}

/// Channels the subscriber follows, oldest subscription first.
pub fn subscribed_channels<S>(store: &S, subscriber_id: Uuid) -> CoreResult<Vec<ChannelSummary>>
where
    S: CredentialStore + RelationStore,
{
    users_at(store, &EdgePattern::SubscriptionsBy(subscriber_id))
}

/// Users subscribed to the channel, oldest subscription first.
pub fn channel_subscribers<S>(store: &S, channel_id: Uuid) -> CoreResult<Vec<ChannelSummary>>
where
    S: CredentialStore + RelationStore,
{
    users_at(store, &EdgePattern::SubscribersOf(channel_id))
}

/// Videos the actor liked that still exist, oldest like first.
pub fn liked_videos<S>(store: &S, actor_id: Uuid) -> CoreResult<Vec<VideoSummary>>
where
    S: RelationStore + ContentStore,
{
    let targets = store.edge_endpoints(&EdgePattern::LikesBy {
        actor: actor_id,
        kind: LikeKind::Video,
    })?;

    let videos = resolve_by_set(&targets, |ids| store.videos_by_ids(ids))?;
    Ok(videos.iter().map(Project::<VideoSummary>::project).collect())
}

fn users_at<S>(store: &S, pattern: &EdgePattern) -> CoreResult<Vec<ChannelSummary>>
where
    S: CredentialStore + RelationStore,
{
    let ids = store.edge_endpoints(pattern)?;
    let users = resolve_by_set(&ids, |ids| store.users_by_ids(ids))?;
    Ok(users.iter().map(Project::<ChannelSummary>::project).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, sample_user, sample_video};

    #[derive(Debug, Clone, PartialEq)]
    struct Item(Uuid);

    impl Keyed for Item {
        fn key(&self) -> Uuid {
            self.0
        }
    }

    #[test]
    fn resolve_by_set_preserves_order_and_drops_missing() {
        let (a, b, c, gone) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        // Fetch answers in its own order and without the missing id.
        let resolved = resolve_by_set(&[c, gone, a, b, a], |ids| {
            assert_eq!(ids.len(), 4, "fetch sees each id once");
            Ok(vec![Item(a), Item(b), Item(c)])
        })
        .unwrap();

        assert_eq!(resolved, vec![Item(c), Item(a), Item(b), Item(a)]);
    }

    #[test]
    fn resolve_by_set_skips_fetch_for_empty_input() {
        let resolved: Vec<Item> = resolve_by_set(&[], |_| panic!("no fetch expected")).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn resolve_by_id_passes_absence_through() {
        let found: Option<Item> = resolve_by_id(Uuid::new_v4(), |_| Ok(None)).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn watch_history_drops_deleted_video_and_keeps_order() {
        let store = MemoryStore::default();
        let viewer = sample_user(&store, "viewer");
        let owner = sample_user(&store, "owner");
        let v1 = sample_video(&store, owner.id, "one");
        let v2 = sample_video(&store, owner.id, "two");
        let v3 = sample_video(&store, owner.id, "three");

        for v in [&v1, &v2, &v3, &v1] {
            store.append_watch_history(viewer.id, v.id).unwrap();
        }
        let before = watch_history(&store, viewer.id).unwrap();
        assert_eq!(before.len(), 4);

        store.delete_video(v2.id).unwrap();

        let after = watch_history(&store, viewer.id).unwrap();
        let titles: Vec<&str> = after.iter().map(|e| e.video.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "three", "one"]);
        assert_eq!(after[0].owner.as_ref().unwrap().username, "owner");
    }

    #[test]
    fn watch_history_owner_is_none_when_uploader_gone() {
        let store = MemoryStore::default();
        let viewer = sample_user(&store, "viewer");
        let owner = sample_user(&store, "owner");
        let video = sample_video(&store, owner.id, "orphan");
        store.append_watch_history(viewer.id, video.id).unwrap();

        store.remove_user(owner.id);

        let history = watch_history(&store, viewer.id).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].owner.is_none());
    }

    #[test]
    fn channel_profile_counts_and_viewer_flag() {
        let store = MemoryStore::default();
        let channel = sample_user(&store, "channel");
        let fan = sample_user(&store, "fan");
        let other = sample_user(&store, "other");

        store
            .insert_edge(&Edge::Subscription { subscriber: fan.id, channel: channel.id })
            .unwrap();
        store
            .insert_edge(&Edge::Subscription { subscriber: channel.id, channel: other.id })
            .unwrap();

        let fan_identity: Identity = fan.project();
        let profile = channel_profile(&store, "Channel", Some(&fan_identity)).unwrap();
        assert_eq!(profile.subscriber_count, 1);
        assert_eq!(profile.subscription_count, 1);
        assert!(profile.is_subscribed);

        let other_identity: Identity = other.project();
        let profile = channel_profile(&store, "channel", Some(&other_identity)).unwrap();
        assert!(!profile.is_subscribed);
    }

    #[test]
    fn channel_profile_anonymous_is_never_subscribed() {
        let store = MemoryStore::default();
        let channel = sample_user(&store, "channel");
        let fan = sample_user(&store, "fan");
        store
            .insert_edge(&Edge::Subscription { subscriber: fan.id, channel: channel.id })
            .unwrap();

        let profile = channel_profile(&store, "channel", None).unwrap();
        assert_eq!(profile.subscriber_count, 1);
        assert!(!profile.is_subscribed);
    }

    #[test]
    fn channel_profile_unknown_channel_is_not_found() {
        let store = MemoryStore::default();
        let err = channel_profile(&store, "nobody", None).unwrap_err();
        assert!(matches!(err, CoreError::NotFound("channel")));
    }

    #[test]
    fn subscription_listings_resolve_both_directions() {
        let store = MemoryStore::default();
        let fan = sample_user(&store, "fan");
        let a = sample_user(&store, "a");
        let b = sample_user(&store, "b");

        for channel in [&b, &a] {
            store
                .insert_edge(&Edge::Subscription { subscriber: fan.id, channel: channel.id })
                .unwrap();
        }

        let channels = subscribed_channels(&store, fan.id).unwrap();
        let names: Vec<&str> = channels.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);

        let subscribers = channel_subscribers(&store, a.id).unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].id, fan.id);
    }

    #[test]
    fn liked_videos_ignores_other_kinds_and_deleted_videos() {
        let store = MemoryStore::default();
        let actor = sample_user(&store, "actor");
        let kept = sample_video(&store, actor.id, "kept");
        let gone = sample_video(&store, actor.id, "gone");

        for target in [kept.id, gone.id] {
            store
                .insert_edge(&Edge::Like { actor: actor.id, kind: LikeKind::Video, target })
                .unwrap();
        }
        store
            .insert_edge(&Edge::Like { actor: actor.id, kind: LikeKind::Tweet, target: Uuid::new_v4() })
            .unwrap();
        store.delete_video(gone.id).unwrap();

        let liked = liked_videos(&store, actor.id).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].title, "kept");
    }
}
