//! Heartbeat due-policy and ack bookkeeping for the control plane.

use std::time::{Duration, Instant};

/// Tracks the announced heartbeat interval and the liveness of the last
/// round trip.
#[derive(Debug)]
pub struct HeartbeatState {
    interval: Duration,
    last_sent_at: Instant,
    last_ack_at: Instant,
    last_sent_nonce: Option<u64>,
    last_received_nonce: Option<u64>,
}

impl HeartbeatState {
    /// Starts a state as if a heartbeat had just been acked, so the first
    /// send is governed purely by `interval`.
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            last_sent_at: now,
            last_ack_at: now,
            last_sent_nonce: None,
            last_received_nonce: None,
        }
    }

    /// A heartbeat is due once `now - last_sent_at >= interval - margin`.
    pub fn is_due(&self, safety_margin: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_sent_at) >= self.interval.saturating_sub(safety_margin)
    }

    /// How long until the next heartbeat becomes due, zero if already due.
    pub fn time_until_due(&self, safety_margin: Duration, now: Instant) -> Duration {
        let effective = self.interval.saturating_sub(safety_margin);
        effective.saturating_sub(now.saturating_duration_since(self.last_sent_at))
    }

    /// The pre-send invariant: the previous heartbeat must already be
    /// acked before another is sent.
    pub fn is_acked(&self) -> bool {
        self.last_ack_at >= self.last_sent_at
    }

    pub fn record_send(&mut self, nonce: u64, now: Instant) {
        self.last_sent_at = now;
        self.last_sent_nonce = Some(nonce);
    }

    /// Records a `HeartbeatAck`. A peer echoing a zero nonce is accepted
    /// unconditionally regardless of what was last sent; strict
    /// nonce-matching is left to a caller who wants to layer it on top of
    /// `last_sent_nonce`/`last_received_nonce`.
    pub fn record_ack(&mut self, nonce: u64, now: Instant) {
        self.last_ack_at = now;
        self.last_received_nonce = Some(nonce);
    }

    pub fn last_sent_nonce(&self) -> Option<u64> {
        self.last_sent_nonce
    }

    pub fn last_received_nonce(&self) -> Option<u64> {
        self.last_received_nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_due_immediately_after_construction() {
        let state = HeartbeatState::new(Duration::from_secs(10));
        assert!(!state.is_due(Duration::from_secs(1), Instant::now()));
    }

    #[test]
    fn due_once_interval_minus_margin_elapses() {
        let mut state = HeartbeatState::new(Duration::from_millis(50));
        let sent_at = Instant::now();
        state.last_sent_at = sent_at;
        let later = sent_at + Duration::from_millis(40);
        assert!(state.is_due(Duration::from_millis(5), later));
    }

    #[test]
    fn unacked_heartbeat_is_detected() {
        let mut state = HeartbeatState::new(Duration::from_secs(10));
        let now = Instant::now();
        state.record_send(7, now + Duration::from_millis(1));
        assert!(!state.is_acked());
        state.record_ack(7, now + Duration::from_millis(2));
        assert!(state.is_acked());
    }
}
