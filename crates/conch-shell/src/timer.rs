//! Virtual millisecond clock and sleep futures.
//!
//! The clock never reads the OS. The owning shell advances it from
//! `Shell::tick`, waking every sleep whose deadline has passed in deadline
//! order. Sleeps registered with the same deadline wake in the order they
//! were first polled.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context as TaskContext, Poll, Waker};

type TimerKey = (u64, u64);

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Cell<u64>,
    next_seq: Cell<u64>,
    wakers: RefCell<BTreeMap<TimerKey, Waker>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds elapsed on the virtual clock.
    pub fn now_ms(&self) -> u64 {
        self.now.get()
    }

    /// Future that completes `ms` milliseconds from now.
    pub fn sleep(self: &Rc<Self>, ms: u64) -> Sleep {
        self.sleep_until(self.now_ms().saturating_add(ms))
    }

    /// Future that completes once the clock reaches `deadline`.
    pub fn sleep_until(self: &Rc<Self>, deadline: u64) -> Sleep {
        Sleep {
            timers: Rc::clone(self),
            deadline,
            key: None,
        }
    }

    /// Earliest deadline of a sleep that is still waiting.
    pub fn next_deadline(&self) -> Option<u64> {
        self.wakers.borrow().keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of sleeps still waiting.
    pub fn pending(&self) -> usize {
        self.wakers.borrow().len()
    }

    /// Move the clock forward. The clock never runs backwards.
    pub(crate) fn advance_to(&self, ms: u64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }

    /// Wake every sleep whose deadline has been reached.
    pub(crate) fn wake_expired(&self) -> usize {
        let expired = {
            let mut wakers = self.wakers.borrow_mut();
            let later = wakers.split_off(&(self.now.get().saturating_add(1), 0));
            std::mem::replace(&mut *wakers, later)
        };
        let count = expired.len();
        for waker in expired.into_values() {
            waker.wake();
        }
        count
    }

    fn register(&self, key: TimerKey, waker: &Waker) {
        self.wakers.borrow_mut().insert(key, waker.clone());
    }

    fn cancel(&self, key: &TimerKey) {
        self.wakers.borrow_mut().remove(key);
    }

    fn allocate_seq(&self) -> u64 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        seq
    }
}

/// Completes once the virtual clock reaches its deadline.
///
/// Dropping an unfinished `Sleep` unregisters it.
#[derive(Debug)]
pub struct Sleep {
    timers: Rc<TimerQueue>,
    deadline: u64,
    key: Option<TimerKey>,
}

impl Sleep {
    pub fn deadline(&self) -> u64 {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<()> {
        if self.timers.now_ms() >= self.deadline {
            if let Some(key) = self.key.take() {
                self.timers.cancel(&key);
            }
            return Poll::Ready(());
        }
        let key = match self.key {
            Some(key) => key,
            None => {
                let key = (self.deadline, self.timers.allocate_seq());
                self.key = Some(key);
                key
            },
        };
        self.timers.register(key, cx.waker());
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.timers.cancel(&key);
        }
    }
}
