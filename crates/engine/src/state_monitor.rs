//! State-Hash Monitor (spec §4.7): periodically digests the portfolio
//! state and emits `StateChanged` through the bus whenever it moves,
//! kicking off the recommendation pipeline via the triggers wired in
//! `crate::triggers`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sentinel_adapters::domain::PortfolioState;
use sentinel_adapters::PortfolioRepository;
use sentinel_core::{canonical_hash, Clock, Event, StateHash, StateMonitorConfig};

use crate::bus::EventBus;

pub struct StateMonitor<C: Clock> {
    repo: Arc<dyn PortfolioRepository>,
    bus: Arc<EventBus>,
    clock: C,
    config: StateMonitorConfig,
    last_hash: Mutex<StateHash>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock> StateMonitor<C> {
    pub fn new(
        repo: Arc<dyn PortfolioRepository>,
        bus: Arc<EventBus>,
        clock: C,
        config: StateMonitorConfig,
    ) -> Self {
        Self {
            repo,
            bus,
            clock,
            config,
            last_hash: Mutex::new(StateHash::empty()),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    pub fn last_hash(&self) -> StateHash {
        self.last_hash.lock().clone()
    }

    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.handle.lock() = Some(handle);
    }

    async fn run_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.cancel.cancelled() => break,
            }
            if self.cancel.is_cancelled() {
                break;
            }
            self.check_once().await;
        }
    }

    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Computes the current digest; emits `StateChanged` and updates the
    /// last-observed hash if it differs (or this is the first observation).
    /// Returns whether it changed.
    pub async fn check_once(&self) -> bool {
        let state = match self.gather_state().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "state monitor: failed to gather portfolio state");
                return false;
            }
        };
        let new_hash = canonical_hash(&state);
        let old_hash = self.last_hash.lock().clone();

        if new_hash == old_hash {
            return false;
        }

        *self.last_hash.lock() = new_hash.clone();
        tracing::info!(%old_hash, new_hash = %new_hash, "portfolio state changed");
        self.bus.emit(Event::StateChanged {
            module: "state_monitor".to_string(),
            timestamp: self.clock.epoch_secs(),
            old_hash,
            new_hash,
        });
        true
    }

    async fn gather_state(&self) -> Result<PortfolioState, sentinel_adapters::AdapterError> {
        Ok(PortfolioState {
            positions: self.repo.positions().await?,
            active_securities: self.repo.active_securities().await?,
            cash_balances: self.repo.cash_balances().await?,
            pending_orders: self.repo.pending_orders().await?,
            scores: self.repo.scores().await?,
            exchange_rates: self.repo.exchange_rates().await?,
            settings: self.repo.settings().await?,
            allocations: self.repo.allocations().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_adapters::domain::Security;
    use sentinel_adapters::fakes::FakePortfolioRepository;
    use sentinel_core::FakeClock;

    fn monitor(repo: Arc<FakePortfolioRepository>) -> StateMonitor<FakeClock> {
        StateMonitor::new(repo, Arc::new(EventBus::new()), FakeClock::new(), StateMonitorConfig::default())
    }

    #[tokio::test]
    async fn first_observation_always_changes() {
        let repo = Arc::new(FakePortfolioRepository::default());
        let m = monitor(repo);
        assert!(m.check_once().await);
        assert!(!m.last_hash().is_empty());
    }

    #[tokio::test]
    async fn unchanged_state_does_not_fire_twice() {
        let repo = Arc::new(FakePortfolioRepository::default());
        let m = monitor(Arc::clone(&repo));
        assert!(m.check_once().await);
        assert!(!m.check_once().await);
    }

    #[tokio::test]
    async fn changed_state_fires_again_and_updates_hash() {
        let repo = Arc::new(FakePortfolioRepository::default());
        let m = monitor(Arc::clone(&repo));
        assert!(m.check_once().await);
        let first = m.last_hash();

        repo.set_state(PortfolioState {
            active_securities: vec![Security {
                isin: "IT0000000001".to_string(),
                symbol: "ENI".to_string(),
                exchange: "XMIL".to_string(),
                active: true,
            }],
            ..Default::default()
        });

        assert!(m.check_once().await);
        assert_ne!(m.last_hash(), first);
    }
}
