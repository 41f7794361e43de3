use tracing::debug;
use uuid::Uuid;

use vidhub_types::models::LikeKind;

use crate::error::{CoreError, CoreResult, StoreError};
use crate::session::Identity;
use crate::store::{ContentStore, CredentialStore, Edge, RelationStore};

/// Whether the edge exists once the toggle has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    Present,
    Absent,
}

impl EdgeState {
    pub fn is_present(self) -> bool {
        self == EdgeState::Present
    }
}

/// Remove the edge if it exists, create it otherwise.
///
/// The existence check and the write are not atomic. When two identical
/// toggles race, the store's uniqueness constraint rejects the second
/// insert and that toggle settles on the edge already being there.
pub fn toggle<S: RelationStore>(store: &S, edge: &Edge) -> CoreResult<EdgeState> {
    if store.edge_exists(edge)? {
        store.delete_edge(edge)?;
        debug!("Removed edge {:?}", edge);
        return Ok(EdgeState::Absent);
    }

    match store.insert_edge(edge) {
        Ok(()) => {
            debug!("Created edge {:?}", edge);
            Ok(EdgeState::Present)
        }
        Err(StoreError::Conflict) => {
            debug!("Edge {:?} created concurrently, leaving it in place", edge);
            Ok(EdgeState::Present)
        }
        Err(e) => Err(e.into()),
    }
}

/// Subscribe to or unsubscribe from a channel. Subscribing to yourself is
/// rejected.
pub fn toggle_subscription<S>(store: &S, subscriber: &Identity, channel_id: Uuid) -> CoreResult<EdgeState>
where
    S: CredentialStore + RelationStore,
{
    if subscriber.id == channel_id {
        return Err(CoreError::Validation("cannot subscribe to your own channel".into()));
    }

    let channel = store
        .user_by_id(channel_id)?
        .ok_or(CoreError::NotFound("channel"))?;

    toggle(
        store,
        &Edge::Subscription {
            subscriber: subscriber.id,
            channel: channel.id,
        },
    )
}

/// Like or unlike a video, comment or tweet. The target must exist.
pub fn toggle_like<S>(store: &S, actor: &Identity, kind: LikeKind, target: Uuid) -> CoreResult<EdgeState>
where
    S: RelationStore + ContentStore,
{
    let exists = match kind {
        LikeKind::Video => store.video_by_id(target)?.is_some(),
        LikeKind::Comment => store.comment_by_id(target)?.is_some(),
        LikeKind::Tweet => store.tweet_by_id(target)?.is_some(),
    };
    if !exists {
        return Err(CoreError::NotFound(match kind {
            LikeKind::Video => "video",
            LikeKind::Comment => "comment",
            LikeKind::Tweet => "tweet",
        }));
    }

    toggle(
        store,
        &Edge::Like {
            actor: actor.id,
            kind,
            target,
        },
    )
}
