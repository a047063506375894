use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use smartcenter_shared::{DistrictState, DistrictStatus, StatusMap, StatusUpdate};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use crate::config::sse_broadcast_buffer;
use crate::error::ApiError;

/// Status update serialized once and shared by every SSE subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastEvent {
    pub seq: u64,
    pub json: Arc<Bytes>,
}

#[derive(Debug)]
pub struct DistrictStore {
    pub districts: StatusMap,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<DistrictStore>>,
    pub next_seq: Arc<AtomicU64>,
    pub event_tx: broadcast::Sender<BroadcastEvent>,
    pub static_dir: String,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    updates_accepted_total: AtomicU64,
    updates_rejected_total: AtomicU64,
    lagged_events_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub updates_accepted_total: u64,
    pub updates_rejected_total: u64,
    pub lagged_events_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            updates_accepted_total: self.updates_accepted_total.load(Ordering::Relaxed),
            updates_rejected_total: self.updates_rejected_total.load(Ordering::Relaxed),
            lagged_events_total: self.lagged_events_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_update_accepted(&self) {
        self.updates_accepted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_update_rejected(&self) {
        self.updates_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lagged_events(&self, count: u64) {
        self.lagged_events_total.fetch_add(count, Ordering::Relaxed);
    }
}

impl AppState {
    /// All districts start out `normal`.
    pub fn new(district_ids: &[String], static_dir: String) -> Self {
        let (event_tx, _) = broadcast::channel(sse_broadcast_buffer());
        let districts = district_ids
            .iter()
            .map(|id| (id.clone(), DistrictState::new(DistrictStatus::Normal)))
            .collect();
        Self {
            store: Arc::new(RwLock::new(DistrictStore {
                districts,
                last_update: None,
            })),
            next_seq: Arc::new(AtomicU64::new(0)),
            event_tx,
            static_dir,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    pub async fn status_map(&self) -> StatusMap {
        self.store.read().await.districts.clone()
    }

    /// Validate and store a status change, then broadcast it to subscribers.
    /// Updates are broadcast even when the status is unchanged; viewers treat
    /// a repeated color as a no-op.
    pub async fn apply_update(
        &self,
        district: &str,
        status: &str,
    ) -> Result<StatusUpdate, ApiError> {
        let result = self.try_apply_update(district, status).await;
        match &result {
            Ok(_) => self.observability.record_update_accepted(),
            Err(_) => self.observability.record_update_rejected(),
        }
        result
    }

    async fn try_apply_update(
        &self,
        district: &str,
        status: &str,
    ) -> Result<StatusUpdate, ApiError> {
        let status: DistrictStatus = status.parse()?;
        let next = DistrictState::new(status);
        let update = StatusUpdate {
            district: district.to_string(),
            status,
            color: next.color.clone(),
        };
        let json = Arc::new(Bytes::from(serde_json::to_vec(&update)?));

        // Seq assignment and send stay under the write guard so broadcast
        // order always matches store order.
        let mut store = self.store.write().await;
        let Some(entry) = store.districts.get_mut(district) else {
            return Err(ApiError::UnknownDistrict(district.to_string()));
        };
        *entry = next;
        store.last_update = Some(Utc::now());
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        match self.event_tx.send(BroadcastEvent { seq, json }) {
            Ok(receivers) => {
                info!(seq, district, %status, receivers, "district status broadcast")
            }
            Err(_) => debug!(seq, district, %status, "district status updated with no subscribers"),
        }
        drop(store);
        Ok(update)
    }
}
