//! Per-portfolio mutual exclusion for ledger and fund mutations.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of per-portfolio async locks, shared by every service that mutates
/// cash or unit state of a portfolio.
#[derive(Default)]
pub struct PortfolioLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Proof that the caller holds the lock for `portfolio_id`. Released on drop.
pub struct PortfolioGuard {
    portfolio_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl PortfolioGuard {
    pub fn portfolio_id(&self) -> &str {
        &self.portfolio_id
    }
}

impl PortfolioLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a portfolio.
    pub async fn acquire(&self, portfolio_id: &str) -> PortfolioGuard {
        // Clone the Arc out so the DashMap shard lock is not held across the await.
        let lock = self
            .locks
            .entry(portfolio_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        PortfolioGuard {
            portfolio_id: portfolio_id.to_string(),
            _guard: guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_portfolio_is_serialized() {
        let locks = Arc::new(PortfolioLocks::new());
        let in_section = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let in_section = in_section.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("p1").await;
                let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_portfolios_do_not_block() {
        let locks = PortfolioLocks::new();
        let guard_a = locks.acquire("a").await;
        let guard_b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b"))
            .await
            .expect("lock for a different portfolio should be free");
        assert_eq!(guard_a.portfolio_id(), "a");
        assert_eq!(guard_b.portfolio_id(), "b");
    }
}
