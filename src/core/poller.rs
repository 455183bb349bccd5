use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::core::domain::{ClusterSnapshot, ResourceKind};
use crate::AppState;

/// Poll döngüsünü arka plan görevine taşır. İlk tur hemen koşar, sonrası
/// sabit periyottadır. Kapanış sinyali geldiğinde döngü biter; süren tur
/// yarıda kesilmez, komut zaman sınırlarıyla sınırlı kalır.
pub fn spawn_poller(state: Arc<AppState>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Sıfır periyotla interval kurulamaz; alt sınır 1 saniye.
        let mut tick = interval(Duration::from_secs(state.config.poll_interval.max(1)));
        // Tur periyodu aşarsa sonraki tik ertelenir; üst üste tur açılmaz.
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Kapanış kolu önce yoklanır; tikle aynı anda hazırsa yeni tur açılmaz.
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(event = "POLLER_STOPPED", "Poll döngüsü kapanış sinyaliyle durdu");
                        break;
                    }
                }
                _ = tick.tick() => {
                    if let Err(e) = refresh_once(&state).await {
                        error!(event = "POLL_CYCLE_FAILED", error = %e, "Tur boşa gitti, önceki anlık görüntü korunuyor");
                    }
                }
            }
        }
    })
}

/// Tek yenileme turu: dört kategori eşzamanlı sorgulanır, tek anlık
/// görüntü yayınlanır. Dördü birden başarısızsa hiçbir şey yayınlanmaz.
async fn refresh_once(state: &AppState) -> anyhow::Result<()> {
    let started = Instant::now();

    let categories = join_all(ResourceKind::ALL.map(|kind| state.kubectl.fetch(kind))).await;

    if categories.iter().all(|s| !s.is_ready()) {
        anyhow::bail!("dört kategorinin tamamı alınamadı, kontrol düzlemi erişilemez görünüyor");
    }

    let failed: Vec<&'static str> = categories
        .iter()
        .filter(|s| !s.is_ready())
        .map(|s| s.kind.plural())
        .collect();

    let snapshot = ClusterSnapshot {
        resources: categories.into_iter().map(|s| (s.kind, s)).collect(),
        observed_at: Utc::now(),
    };
    let published = state.store.publish(snapshot);

    if failed.is_empty() {
        info!(
            event = "SNAPSHOT_PUBLISHED",
            elapsed_ms = started.elapsed().as_millis() as u64,
            observed_at = %published.observed_at,
            "Küme anlık görüntüsü yenilendi"
        );
    } else {
        warn!(
            event = "SNAPSHOT_PARTIAL",
            failed = ?failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Anlık görüntü eksik kategorilerle yayınlandı"
        );
    }

    let _ = state.tx.send(
        serde_json::json!({ "type": "cluster_update", "data": &*published }).to_string(),
    );

    Ok(())
}
