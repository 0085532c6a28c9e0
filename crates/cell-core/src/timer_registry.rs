use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// Opaque identifier of one arming of a timer. Never reused by a registry.
pub type TimerHandle = u64;

/// External scheduler that delivers a timer expiry back to the owning entity
/// after the requested delay. Cancellation is best effort: the registry also
/// ignores expiries for handles it no longer knows.
pub trait TimerScheduler {
    fn schedule_timer(&mut self, handle: TimerHandle, delay: Duration);
    fn cancel_timer(&mut self, handle: TimerHandle);
}

#[derive(Debug)]
struct ActiveTimer<O, T, P> {
    owner: O,
    timer: T,
    payload: P,
}

/// A timer that fired while still registered
#[derive(Debug, PartialEq, Eq)]
pub struct Expired<O, T, P> {
    pub owner: O,
    pub timer: T,
    pub payload: P,
}

/// Per-entity registry of pending timers, keyed by (owner, timer type).
///
/// Setting a timer that is already pending for the same owner and type replaces it;
/// the replaced arming never fires. Cancelling an absent timer is a no-op. An expiry
/// for a handle that was replaced or cancelled is dropped silently.
#[derive(Debug)]
pub struct TimerRegistry<O, T, P = ()> {
    by_handle: HashMap<TimerHandle, ActiveTimer<O, T, P>>,
    by_key: HashMap<(O, T), TimerHandle>,
    next_handle: TimerHandle,
}

impl<O, T, P> Default for TimerRegistry<O, T, P>
where
    O: Copy + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<O, T, P> TimerRegistry<O, T, P>
where
    O: Copy + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self {
            by_handle: HashMap::new(),
            by_key: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Arms `timer` for `owner`, replacing any pending arming of the same type
    pub fn set<S: TimerScheduler + ?Sized>(
        &mut self,
        sched: &mut S,
        owner: O,
        timer: T,
        delay: Duration,
        payload: P,
    ) -> TimerHandle {
        if let Some(old) = self.by_key.remove(&(owner, timer)) {
            tracing::trace!("timer {:?} for {:?} replaced (handle {})", timer, owner, old);
            self.by_handle.remove(&old);
            sched.cancel_timer(old);
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        self.by_key.insert((owner, timer), handle);
        self.by_handle.insert(handle, ActiveTimer { owner, timer, payload });
        sched.schedule_timer(handle, delay);
        tracing::trace!("timer {:?} for {:?} set to {:?} (handle {})", timer, owner, delay, handle);
        handle
    }

    /// Cancels a pending timer. Returns true if one was pending
    pub fn cancel<S: TimerScheduler + ?Sized>(&mut self, sched: &mut S, owner: O, timer: T) -> bool {
        match self.by_key.remove(&(owner, timer)) {
            Some(handle) => {
                self.by_handle.remove(&handle);
                sched.cancel_timer(handle);
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer of `owner`, returning how many were pending
    pub fn cancel_owner<S: TimerScheduler + ?Sized>(&mut self, sched: &mut S, owner: O) -> usize {
        let keys: Vec<(O, T)> = self.by_key.keys().filter(|(o, _)| *o == owner).copied().collect();
        for key in keys.iter() {
            if let Some(handle) = self.by_key.remove(key) {
                self.by_handle.remove(&handle);
                sched.cancel_timer(handle);
            }
        }
        keys.len()
    }

    /// Resolves a fired handle. Returns None for stale handles, which callers must ignore
    pub fn on_expiry(&mut self, handle: TimerHandle) -> Option<Expired<O, T, P>> {
        let Some(active) = self.by_handle.remove(&handle) else {
            tracing::trace!("dropping stale timer handle {}", handle);
            return None;
        };
        self.by_key.remove(&(active.owner, active.timer));
        Some(Expired {
            owner: active.owner,
            timer: active.timer,
            payload: active.payload,
        })
    }

    pub fn is_active(&self, owner: O, timer: T) -> bool {
        self.by_key.contains_key(&(owner, timer))
    }

    pub fn num_active(&self) -> usize {
        self.by_handle.len()
    }

    /// Timer types pending for `owner`, in no particular order
    pub fn active_for_owner(&self, owner: O) -> Vec<T> {
        self.by_key.keys().filter(|(o, _)| *o == owner).map(|(_, t)| *t).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeScheduler {
        scheduled: Vec<(TimerHandle, Duration)>,
        cancelled: Vec<TimerHandle>,
    }

    impl TimerScheduler for FakeScheduler {
        fn schedule_timer(&mut self, handle: TimerHandle, delay: Duration) {
            self.scheduled.push((handle, delay));
        }
        fn cancel_timer(&mut self, handle: TimerHandle) {
            self.cancelled.push(handle);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum T {
        A,
        B,
    }

    #[test]
    fn test_set_replaces_pending_timer() {
        let mut sched = FakeScheduler::default();
        let mut reg: TimerRegistry<u16, T, u8> = TimerRegistry::new();

        let h1 = reg.set(&mut sched, 1, T::A, Duration::from_secs(10), 1);
        let h2 = reg.set(&mut sched, 1, T::A, Duration::from_secs(20), 2);
        assert_ne!(h1, h2);
        assert_eq!(reg.num_active(), 1);
        assert_eq!(sched.cancelled, vec![h1]);

        // The replaced arming never fires
        assert_eq!(reg.on_expiry(h1), None);
        assert_eq!(reg.on_expiry(h2), Some(Expired { owner: 1, timer: T::A, payload: 2 }));
        assert!(!reg.is_active(1, T::A));
    }

    #[test]
    fn test_cancel_is_idempotent_and_stale_fire_dropped() {
        let mut sched = FakeScheduler::default();
        let mut reg: TimerRegistry<u16, T> = TimerRegistry::new();

        let h = reg.set(&mut sched, 3, T::B, Duration::from_secs(1), ());
        assert!(reg.cancel(&mut sched, 3, T::B));
        assert!(!reg.cancel(&mut sched, 3, T::B));
        assert!(!reg.cancel(&mut sched, 9, T::A));
        assert_eq!(reg.on_expiry(h), None);
    }

    #[test]
    fn test_cancel_owner_only_touches_owner() {
        let mut sched = FakeScheduler::default();
        let mut reg: TimerRegistry<u16, T> = TimerRegistry::new();

        reg.set(&mut sched, 1, T::A, Duration::from_secs(1), ());
        reg.set(&mut sched, 1, T::B, Duration::from_secs(1), ());
        let other = reg.set(&mut sched, 2, T::A, Duration::from_secs(1), ());

        assert_eq!(reg.cancel_owner(&mut sched, 1), 2);
        assert_eq!(reg.num_active(), 1);
        assert!(reg.active_for_owner(1).is_empty());
        assert_eq!(reg.active_for_owner(2), vec![T::A]);
        assert!(reg.on_expiry(other).is_some());
    }
}
