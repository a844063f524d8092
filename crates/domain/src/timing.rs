//! Timing gate: holds a submission until its window opens.
//!
//! The window opens `safety_margin` before the proposal deadline. In
//! [`TimingMode::Blocking`] the gate sleeps until then; in
//! [`TimingMode::Immediate`] it only checks and reports.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use crate::deadline::MarketTimestamp;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// How the gate reacts to a window that is not open yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// Check once, log, and carry on regardless.
    Immediate,
    /// Sleep until the window opens.
    #[default]
    Blocking,
}

impl TimingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingMode::Immediate => "immediate",
            TimingMode::Blocking => "blocking",
        }
    }
}

impl std::fmt::Display for TimingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(TimingMode::Immediate),
            "blocking" => Ok(TimingMode::Blocking),
            other => Err(format!("unknown timing mode '{other}'")),
        }
    }
}

/// When submission is allowed relative to the proposal deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingPolicy {
    pub safety_margin: Duration,
    pub mode: TimingMode,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            safety_margin: Duration::from_secs(120),
            mode: TimingMode::Blocking,
        }
    }
}

/// What the gate did before letting the attempt through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The window was already open.
    Open,
    /// The gate slept this long for the window to open.
    Waited(Duration),
    /// The window was not open, but the policy let the attempt through.
    Bypassed { remaining: Duration },
}

/// First instant at which submission is allowed.
///
/// `None` when the margin reaches back past the representable range, which
/// means the window has always been open.
pub fn window_opens_at(
    deadline: DateTime<FixedOffset>,
    margin: Duration,
) -> Option<DateTime<FixedOffset>> {
    let margin = TimeDelta::from_std(margin).ok()?;
    deadline.checked_sub_signed(margin)
}

/// Returns true if `now` is at or after the window opening.
pub fn is_window_open(
    deadline: DateTime<FixedOffset>,
    margin: Duration,
    now: DateTime<Utc>,
) -> bool {
    window_opens_at(deadline, margin)
        .is_none_or(|opens_at| now >= opens_at.with_timezone(&Utc))
}

/// Time left until the window opens; zero once it is open.
pub fn wait_duration(
    deadline: DateTime<FixedOffset>,
    margin: Duration,
    now: DateTime<Utc>,
) -> Duration {
    window_opens_at(deadline, margin)
        .and_then(|opens_at| (opens_at.with_timezone(&Utc) - now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// Applies a [`TimingPolicy`] to a marketplace deadline.
pub struct TimingGate<C: Clock> {
    clock: C,
    offset: FixedOffset,
}

impl<C: Clock> TimingGate<C> {
    /// Creates a gate reading marketplace times at `offset`.
    pub fn new(clock: C, offset: FixedOffset) -> Self {
        Self { clock, offset }
    }

    /// Returns the gate's clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the offset marketplace wall-clock times are read at.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Holds the caller according to `policy` and reports what happened.
    #[tracing::instrument(skip(self), fields(%deadline, mode = %policy.mode))]
    pub async fn pass(&self, deadline: MarketTimestamp, policy: &TimingPolicy) -> GateDecision {
        let Some(deadline) = deadline.at_offset(self.offset) else {
            tracing::warn!("deadline cannot be pinned to an instant, treating window as open");
            return GateDecision::Open;
        };
        let now = self.clock.now();
        let wait = wait_duration(deadline, policy.safety_margin, now);

        if wait.is_zero() {
            tracing::info!("submission window is open");
            return GateDecision::Open;
        }

        match policy.mode {
            TimingMode::Immediate => {
                tracing::warn!(
                    remaining_secs = wait.as_secs(),
                    "submission window not open yet, proceeding anyway"
                );
                GateDecision::Bypassed { remaining: wait }
            }
            TimingMode::Blocking => {
                let secs = wait.as_secs();
                tracing::info!(
                    minutes = secs / 60,
                    seconds = secs % 60,
                    "waiting for submission window"
                );
                tokio::time::sleep(wait).await;
                tracing::info!("submission window reached");
                GateDecision::Waited(wait)
            }
        }
    }
}
