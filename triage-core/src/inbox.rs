//! Interrupt-safe radio inbox
//!
//! The radio stack delivers characteristic writes from its interrupt
//! handler. [`Inbox::on_write`] queues them under a critical section and
//! arms a wake; [`Inbox::get_message`] is the single async consumer.
//!
//! The queue is bounded. When it is full the oldest message is evicted so
//! the most recent writes are always kept.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::{Deque, String};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Longest message kept; longer writes are truncated
pub const MAX_MESSAGE_LEN: usize = 128;

/// Default inbox capacity
pub const DEFAULT_CAPACITY: usize = 16;

/// A queued radio message
pub type Message = String<MAX_MESSAGE_LEN>;

/// Bounded drop-oldest message queue shared with interrupt context
pub struct Inbox<const N: usize = DEFAULT_CAPACITY> {
    queue: Mutex<RefCell<Deque<Message, N>>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
    /// Set by the producer when a wake is armed, cleared by the consumer
    wake_pending: AtomicBool,
    dropped: AtomicU32,
}

impl<const N: usize> Inbox<N> {
    /// Create an empty inbox (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Deque::new())),
            wake: Signal::new(),
            wake_pending: AtomicBool::new(false),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue a message; safe to call from interrupt context
    ///
    /// Never blocks. Rapid writes coalesce into one wake.
    pub fn on_write(&self, message: &str) {
        let message = truncate(message);
        let evicted = critical_section::with(|cs| {
            let mut queue = self.queue.borrow_ref_mut(cs);
            let evicted = queue.is_full() && queue.pop_front().is_some();
            let _ = queue.push_back(message);
            evicted
        });

        if evicted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }

        if !self.wake_pending.swap(true, Ordering::AcqRel) {
            self.wake.signal(());
        }
    }

    /// Take the oldest message without waiting
    pub fn try_pop(&self) -> Option<Message> {
        critical_section::with(|cs| self.queue.borrow_ref_mut(cs).pop_front())
    }

    /// Wait for the next message
    pub async fn get_message(&self) -> Message {
        loop {
            if let Some(message) = self.try_pop() {
                return message;
            }
            // The signal latches, so a wake armed before this point is not lost
            self.wake.wait().await;
            self.wake_pending.store(false, Ordering::Release);
        }
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.queue.borrow_ref(cs).len())
    }

    /// Whether no message is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Messages evicted since start-up
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for Inbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(s: &str) -> Message {
    let mut out = Message::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_futures::select::{select, Either};
    use embassy_futures::yield_now;
    use proptest::prelude::*;

    #[test]
    fn test_fifo_order() {
        let inbox: Inbox<4> = Inbox::new();
        inbox.on_write("a");
        inbox.on_write("b");
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.try_pop().unwrap().as_str(), "a");
        assert_eq!(inbox.try_pop().unwrap().as_str(), "b");
        assert!(inbox.try_pop().is_none());
    }

    #[test]
    fn test_full_inbox_drops_oldest() {
        let inbox: Inbox<2> = Inbox::new();
        inbox.on_write("1");
        inbox.on_write("2");
        inbox.on_write("3");
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.dropped(), 1);
        assert_eq!(inbox.try_pop().unwrap().as_str(), "2");
        assert_eq!(inbox.try_pop().unwrap().as_str(), "3");
    }

    #[test]
    fn test_long_message_truncated() {
        let inbox: Inbox<1> = Inbox::new();
        let long: std::string::String = core::iter::repeat('x').take(200).collect();
        inbox.on_write(&long);
        assert_eq!(inbox.try_pop().unwrap().len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn test_wake_before_wait_is_not_lost() {
        let inbox: Inbox<4> = Inbox::new();
        inbox.on_write("early");
        // Drain without waiting so only the armed wake remains
        assert!(inbox.try_pop().is_some());
        inbox.on_write("late");

        let message = block_on(inbox.get_message());
        assert_eq!(message.as_str(), "late");
    }

    #[test]
    fn test_consumer_wakes_on_later_write() {
        let inbox: Inbox<4> = Inbox::new();
        let producer = async {
            for _ in 0..5 {
                yield_now().await;
            }
            inbox.on_write("42-Kim-ER");
            // Keep the producer alive until the consumer finishes
            loop {
                yield_now().await;
            }
        };

        match block_on(select(inbox.get_message(), producer)) {
            Either::First(message) => assert_eq!(message.as_str(), "42-Kim-ER"),
            Either::Second(()) => panic!("producer finished first"),
        }
    }

    #[test]
    fn test_stale_wake_does_not_fabricate_messages() {
        let inbox: Inbox<4> = Inbox::new();
        inbox.on_write("only");
        assert_eq!(block_on(inbox.get_message()).as_str(), "only");

        let poller = async {
            for _ in 0..10 {
                yield_now().await;
            }
        };
        assert!(matches!(
            block_on(select(inbox.get_message(), poller)),
            Either::Second(())
        ));
    }

    proptest! {
        #[test]
        fn prop_overflow_keeps_newest(k in 1usize..40) {
            let inbox: Inbox<DEFAULT_CAPACITY> = Inbox::new();
            let total = DEFAULT_CAPACITY + k;
            for i in 0..total {
                inbox.on_write(&std::format!("{}", i));
            }

            prop_assert_eq!(inbox.len(), DEFAULT_CAPACITY);
            prop_assert_eq!(inbox.dropped() as usize, k);
            for i in k..total {
                let expected = std::format!("{}", i);
                let popped = inbox.try_pop().unwrap();
                prop_assert_eq!(popped.as_str(), expected.as_str());
            }
        }
    }
}
