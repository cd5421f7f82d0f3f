/*!
Utilitaires de test pour le relais

- Init du logging tracing capturé par le harness de test
- Attente active bornée d'une condition (poller, tâches async)
*/

use std::time::{Duration, Instant};

/// Init logging pour tests (idempotent)
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Attend que `condition` devienne vraie, au plus `timeout`. Retourne le dernier état observé.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let reached = condition();
    if !reached {
        tracing::warn!("⏰ condition not reached after {:?}", timeout);
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_wait_until_sees_background_progress() {
        init_test_logging();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            c.store(3, Ordering::SeqCst);
        });

        assert!(wait_until(Duration::from_secs(2), || counter.load(Ordering::SeqCst) == 3).await);
    }

    #[tokio::test]
    async fn test_wait_until_gives_up() {
        assert!(!wait_until(Duration::from_millis(50), || false).await);
    }
}
