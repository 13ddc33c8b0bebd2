// ── Single-flight refresh harness ──
//
// Each cache component owns one `SingleFlight`. A refresh that finds
// the flag already raised returns `Refresh::Skipped` immediately
// instead of queueing a second store query.

use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of a guarded refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Refresh<T> {
    /// This call ran the refresh.
    Done(T),
    /// Another refresh was already in flight; nothing was done.
    Skipped,
}

impl<T> Refresh<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Skipped => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Refresh<U> {
        match self {
            Self::Done(value) => Refresh::Done(f(value)),
            Self::Skipped => Refresh::Skipped,
        }
    }
}

/// At most one holder at a time; non-blocking acquire.
#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: AtomicBool,
}

impl SingleFlight {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Raise the flag, or `None` if it is already raised.
    pub fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Lowers the flag on drop, including when the refresh future is
/// cancelled mid-query.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_guard_drops() {
        let flight = SingleFlight::new();
        let guard = flight.try_begin();
        assert!(guard.is_some());
        assert!(flight.is_busy());
        assert!(flight.try_begin().is_none());
        drop(guard);
        assert!(!flight.is_busy());
        assert!(flight.try_begin().is_some());
    }

    #[test]
    fn refresh_helpers() {
        assert_eq!(Refresh::Done(2).map(|n| n * 2), Refresh::Done(4));
        assert!(Refresh::<()>::Skipped.is_skipped());
        assert_eq!(Refresh::<u8>::Skipped.done(), None);
    }
}
