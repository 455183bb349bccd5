use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::core::domain::ClusterSnapshot;

/// Yayınlanmış son anlık görüntünün tek sahibi. Tek yazar (poller), çok
/// okuyucu; kilit yalnızca işaretçi takası süresince tutulur, dış süreç
/// çağrıları sırasında asla.
pub struct ClusterStateStore {
    current: RwLock<Option<Arc<ClusterSnapshot>>>,
}

impl ClusterStateStore {
    pub fn new() -> Self {
        Self { current: RwLock::new(None) }
    }

    /// Yeni anlık görüntüyü atomik olarak geçerli kılar ve yayınlanan
    /// örneği döner. Saat geriye kaydıysa observed_at önceki değere
    /// sabitlenir; monotonluk bozulmaz.
    pub fn publish(&self, mut snapshot: ClusterSnapshot) -> Arc<ClusterSnapshot> {
        let mut clamped_from = None;
        let published = {
            let mut guard = self.current.write().expect("snapshot store poisoned");
            if let Some(prev) = guard.as_ref() {
                if snapshot.observed_at < prev.observed_at {
                    clamped_from = Some(snapshot.observed_at);
                    snapshot.observed_at = prev.observed_at;
                }
            }
            let published = Arc::new(snapshot);
            *guard = Some(published.clone());
            published
        };

        // Uyarı kilit bırakıldıktan sonra basılır.
        if let Some(incoming) = clamped_from {
            warn!(
                event = "CLOCK_SKEW_CLAMPED",
                previous = %published.observed_at,
                incoming = %incoming,
                "observed_at geriye gitti, önceki değere sabitlendi"
            );
        }
        published
    }

    /// İlk yayından önce None döner.
    pub fn current(&self) -> Option<Arc<ClusterSnapshot>> {
        self.current.read().expect("snapshot store poisoned").clone()
    }
}

impl Default for ClusterStateStore {
    fn default() -> Self {
        Self::new()
    }
}
