//! Debounced push-button handling on top of the key-status register.
//!
//! The module latches a key edge in its key-status register every time the
//! button changes state. [`ButtonDebouncer`] counts those edges: an odd count
//! means the button is down. Polls are rate limited, and a press with no
//! matching release within the stuck timeout is forced back up so a missed
//! release edge cannot leave the button logically held forever.

use crate::clock::Clock;
use crate::consts;
use crate::device::VisualRotaryEncoder;
use crate::error::Result;
use crate::i2c::RegisterBus;
use log::{debug, info, warn};
use std::time::Duration;

/// Timing parameters for [`ButtonDebouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Minimum time between effective polls. More frequent polls are no-ops.
    pub poll_interval: Duration,
    /// Time after a press edge beyond which a missing release is forced.
    pub stuck_timeout: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        DebounceConfig {
            poll_interval: Duration::from_millis(consts::DEFAULT_POLL_INTERVAL_MS),
            stuck_timeout: Duration::from_millis(consts::DEFAULT_STUCK_TIMEOUT_MS),
        }
    }
}

/// What a single call to `poll` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Called before the poll interval elapsed; nothing was read.
    RateLimited,
    /// Key status was read and no edge was pending.
    Idle,
    /// An edge moved the button from up to down.
    Pressed,
    /// An edge moved the button from down to up.
    Released,
    /// The button was forced up after the stuck timeout.
    StuckReleased,
}

/// Edge-counting button state machine, independent of any bus.
///
/// Feed it the current time and whether an edge was observed with
/// [`record`](Self::record); gate calls with [`is_due`](Self::is_due).
#[derive(Debug, Clone)]
pub struct ButtonDebouncer {
    config: DebounceConfig,
    // Only the parity is meaningful: odd = down.
    press_count: u32,
    last_edge_time: Duration,
    last_poll_time: Option<Duration>,
    down_pending: bool,
    up_pending: bool,
}

impl ButtonDebouncer {
    /// Creates a debouncer in the up state.
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            press_count: 0,
            last_edge_time: Duration::ZERO,
            last_poll_time: None,
            down_pending: false,
            up_pending: false,
        }
    }

    /// The timing parameters in use.
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// Whether enough time has passed since the last effective poll.
    /// The first poll is always due.
    pub fn is_due(&self, now: Duration) -> bool {
        match self.last_poll_time {
            Some(last) => now.saturating_sub(last) >= self.config.poll_interval,
            None => true,
        }
    }

    /// Marks `now` as the start of an effective poll.
    pub fn mark_polled(&mut self, now: Duration) {
        self.last_poll_time = Some(now);
    }

    /// Applies the outcome of one key-status read taken at `now`.
    pub fn record(&mut self, now: Duration, edge: bool) -> PollStatus {
        let was_down = self.is_down();
        let mut status = PollStatus::Idle;

        if edge {
            self.press_count = self.press_count.wrapping_add(1);
            if was_down {
                self.up_pending = true;
                status = PollStatus::Released;
            } else {
                self.last_edge_time = now;
                status = PollStatus::Pressed;
            }
        }

        // Forced recovery wins over anything observed in this poll.
        if self.is_down() && now.saturating_sub(self.last_edge_time) > self.config.stuck_timeout {
            warn!(
                "Button held for more than {:?} without a release edge, forcing it up",
                self.config.stuck_timeout
            );
            self.press_count = 0;
            self.down_pending = false;
            return PollStatus::StuckReleased;
        }

        if !was_down && self.is_down() && !self.down_pending {
            self.down_pending = true;
        }
        status
    }

    /// Whether the button is currently down. Does not consume anything.
    #[inline]
    pub fn is_down(&self) -> bool {
        self.press_count % 2 == 1
    }

    /// Returns `true` once per press, clearing the latch.
    pub fn take_down_pending(&mut self) -> bool {
        std::mem::take(&mut self.down_pending)
    }

    /// Returns `true` once per genuine release, clearing the latch.
    /// A forced stuck-timeout recovery never sets it.
    pub fn take_up_pending(&mut self) -> bool {
        std::mem::take(&mut self.up_pending)
    }
}

impl<B: RegisterBus, C: Clock> VisualRotaryEncoder<B, C> {
    // --- Button Handling ---

    /// Runs one debounce cycle, rate limited to the configured poll interval.
    ///
    /// Reads (and acknowledges) the key-status register, then updates the
    /// button state. If the bus fails, the error is returned and the button
    /// state is left exactly as it was; only the poll timestamp advances.
    pub fn poll(&mut self) -> Result<PollStatus> {
        let now = self.clock.now();
        if !self.button.is_due(now) {
            return Ok(PollStatus::RateLimited);
        }
        self.button.mark_polled(now);

        let edge = self.read_key_status().inspect_err(|e| {
            debug!("Key status read from {} failed: {}", self.address, e);
        })?;
        let status = self.button.record(now, edge);
        match status {
            PollStatus::Pressed | PollStatus::Released => {
                info!("Button on {}: {:?}", self.address, status)
            }
            _ => {}
        }
        Ok(status)
    }

    /// Returns `true` exactly once for each press detected by [`poll`](Self::poll).
    pub fn take_down_pending(&mut self) -> bool {
        self.button.take_down_pending()
    }

    /// Returns `true` exactly once for each genuine release detected by
    /// [`poll`](Self::poll).
    pub fn take_up_pending(&mut self) -> bool {
        self.button.take_up_pending()
    }

    /// Whether the button is currently held down.
    pub fn is_down(&self) -> bool {
        self.button.is_down()
    }
}
