//! `SingleFlight` — at most one in-flight request, newest input wins.
//!
//! # Semantics
//!
//! Callers [`submit`][SingleFlight::submit] inputs as they arrive.  An input
//! starts a request immediately when nothing is in flight and the rate window
//! since the previous start has elapsed; otherwise it replaces whatever input
//! was already waiting (coalescing, not queuing).  When the in-flight request
//! resolves the caller reports it with [`complete`][SingleFlight::complete]
//! and later calls [`poll`][SingleFlight::poll] (typically on the next event
//! or timer tick) to flush the waiting input once the window allows.
//!
//! There are no timers inside: the owner supplies `now` on every call, so the
//! gate behaves identically under a real or a manual clock.

use crate::{RequestId, Timestamp};

/// Single-flight, rate-limited request gate holding at most one waiting input.
#[derive(Debug)]
pub struct SingleFlight<T> {
    /// Minimum spacing between two request starts.
    window_ms:    i64,
    in_flight:    Option<RequestId>,
    waiting:      Option<T>,
    last_started: Option<Timestamp>,
    next_id:      RequestId,
}

impl<T> SingleFlight<T> {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms:    window_ms.max(0),
            in_flight:    None,
            waiting:      None,
            last_started: None,
            next_id:      RequestId(0),
        }
    }

    /// Offer `input`; returns the request to start now, if any.
    ///
    /// A returned request carries the newest input, never an older one that
    /// was superseded while waiting.
    pub fn submit(&mut self, input: T, now: Timestamp) -> Option<(RequestId, T)> {
        self.waiting = Some(input);
        self.poll(now)
    }

    /// Start the waiting input if the gate is open at `now`.
    pub fn poll(&mut self, now: Timestamp) -> Option<(RequestId, T)> {
        if self.in_flight.is_some() || !self.window_elapsed(now) {
            return None;
        }
        let input = self.waiting.take()?;
        let id = self.next_id;
        self.next_id = id.next();
        self.in_flight = Some(id);
        self.last_started = Some(now);
        Some((id, input))
    }

    /// Mark request `id` as resolved.
    ///
    /// Returns `false` for an id that is not the one in flight; such results
    /// are stale and must be discarded by the caller.
    pub fn complete(&mut self, id: RequestId) -> bool {
        if self.in_flight == Some(id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// `true` while a request is outstanding.
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// `true` when an input is waiting for the gate to open.
    #[inline]
    pub fn has_waiting(&self) -> bool {
        self.waiting.is_some()
    }

    /// The input waiting for the gate, if any.
    #[inline]
    pub fn waiting(&self) -> Option<&T> {
        self.waiting.as_ref()
    }

    /// Drop the waiting input without starting it.
    pub fn discard_waiting(&mut self) -> Option<T> {
        self.waiting.take()
    }

    /// Forget the waiting input and any in-flight request.  A result for the
    /// forgotten request will be rejected by `complete`.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.waiting = None;
        self.last_started = None;
    }

    fn window_elapsed(&self, now: Timestamp) -> bool {
        match self.last_started {
            None       => true,
            Some(last) => now.millis_since(last) >= self.window_ms,
        }
    }
}
