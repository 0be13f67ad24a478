use std::sync::Arc;

use crate::actor::model::InternalMessage;
use crate::blueprint::model::{Blueprints, RawEntries, Resources, parse_entries};
use crate::store::{DataService, Source};

/// Game data pulled from the CDN (or the cache when the CDN is unreachable).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub blueprints: Option<Blueprints>,
    pub resources: Option<Resources>,
}

pub async fn fetch_remote(store: &DataService) -> RemoteSnapshot {
    let (blueprints, resources) = tokio::join!(
        store.fetch_and_cache::<RawEntries>(Source::Blueprints),
        store.fetch_and_cache::<RawEntries>(Source::Resources),
    );
    RemoteSnapshot {
        blueprints: blueprints.map(|raw| parse_entries("blueprint", raw)),
        resources: resources.map(|raw| parse_entries("resource", raw)),
    }
}

/// Fetches once in the background and hands the result to whoever owns the
/// companion state; nothing here touches that state directly.
pub fn spawn_startup_refresh(
    store: DataService,
    topic: tokio::sync::broadcast::Sender<InternalMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Refreshing game data in the background...");
        let snapshot = fetch_remote(&store).await;
        if let Err(e) = topic.send(InternalMessage::RemoteLoaded(Arc::new(snapshot))) {
            tracing::warn!("No one to apply the refreshed game data: {}", e);
        }
    })
}
