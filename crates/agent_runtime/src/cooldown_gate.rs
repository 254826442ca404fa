//! Tracks when the character's next action is permitted (§4.1). Armed
//! from each action response's cooldown; waited on before every
//! subsequent action.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::sleep;

/// Sleep chunk size while waiting out a cooldown, so the wait stays
/// cancellable (§4.1, §5 suspension point 1).
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Monotonic cooldown tracker: `arm` never shortens an active cooldown,
/// and the gate starts reset so the first action after process boot
/// re-reads cooldown from the server rather than assuming readiness.
pub struct CooldownGate {
    ready_at_millis: AtomicU64,
    buffer: Duration,
}

impl CooldownGate {
    pub fn new(buffer: Duration) -> Self {
        Self { ready_at_millis: AtomicU64::new(0), buffer }
    }

    /// Records a cooldown reported by the most recent action, as
    /// `now + seconds + buffer`. Monotonic: a shorter computed deadline
    /// than the one already armed is ignored.
    pub fn arm(&self, seconds: f64) {
        let delay_millis = ((seconds.max(0.0) * 1000.0) as u64) + self.buffer.as_millis() as u64;
        let candidate = now_millis() + delay_millis;
        self.ready_at_millis.fetch_max(candidate, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        now_millis() >= self.ready_at_millis.load(Ordering::SeqCst)
    }

    /// Resets the gate to immediately-ready, for process boot (§4.1:
    /// "reset-on-start").
    pub fn reset(&self) {
        self.ready_at_millis.store(0, Ordering::SeqCst);
    }

    /// Blocks in `POLL_INTERVAL` chunks until ready, or until `cancel`
    /// resolves (cooperative cancellation per §5).
    pub async fn wait_until_ready(&self, mut cancel: impl FnMut() -> bool) {
        loop {
            if self.is_ready() || cancel() {
                return;
            }
            let remaining = self.ready_at_millis.load(Ordering::SeqCst).saturating_sub(now_millis());
            let chunk = Duration::from_millis(remaining).min(POLL_INTERVAL);
            sleep(chunk).await;
        }
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
