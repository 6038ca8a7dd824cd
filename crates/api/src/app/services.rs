//! Infrastructure wiring for the HTTP layer.
//!
//! `AppServices` wraps the in-process [`Services`] and adds a lossy broadcast
//! channel that fans committed changes out to SSE clients.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use stockyard_auth::WarehouseScope;
use stockyard_core::{DomainResult, WarehouseId};
use stockyard_infra::{ChangeEnvelope, Services, seed};

use crate::app::errors::ApiError;
use crate::config::AppConfig;

const REALTIME_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct RealtimeMessage {
    pub warehouse_id: WarehouseId,
    pub topic: String,
    pub payload: serde_json::Value,
}

impl RealtimeMessage {
    fn from_envelope(env: &ChangeEnvelope) -> Self {
        Self {
            warehouse_id: env.warehouse_id(),
            topic: env.event_type().to_string(),
            payload: serde_json::json!({
                "aggregate_type": env.aggregate_type(),
                "aggregate_id": env.aggregate_id(),
                "sequence_number": env.sequence_number(),
                "occurred_at": env.occurred_at(),
                "data": env.payload(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct AppServices {
    core: Services,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

impl AppServices {
    pub fn core(&self) -> &Services {
        &self.core
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }
}

pub fn build_services(config: &AppConfig) -> DomainResult<AppServices> {
    let core = Services::new(config.lock_timeout);
    if config.seed_demo_data {
        seed::demo(&core)?;
    }

    // Realtime channel (SSE): lossy broadcast, scope-filtered in handlers.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(REALTIME_CAPACITY);

    // Background forwarder: change feed -> broadcast. Ends when the feed is dropped.
    let sub = core.feed.subscribe();
    let tx = realtime_tx.clone();
    let spawned = std::thread::Builder::new()
        .name("change-feed-forwarder".into())
        .spawn(move || {
            while let Ok(env) = sub.recv() {
                // No receivers is fine; SSE clients come and go.
                let _ = tx.send(RealtimeMessage::from_envelope(&env));
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "change feed forwarder not started; /stream will stay silent");
    }

    Ok(AppServices { core, realtime_tx })
}

/// Run a synchronous engine call off the async workers.
///
/// Engine calls may wait on per-key locks for up to the configured timeout.
pub async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError::internal(format!("worker task failed: {e}"))),
    }
}

pub fn warehouse_sse_stream(
    services: Arc<AppServices>,
    scope: WarehouseScope,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if scope.allows(m.warehouse_id) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
