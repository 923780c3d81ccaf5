//! Interrupt-to-task wake primitive for completed scans.
//!
//! A counting notification: the DMA completion interrupt calls
//! [`ScanWake::give_from_isr`], the scheduler task awaits [`ScanWake::take`].
//! No payload crosses the boundary; the result buffer is already in memory
//! when the count is observed. `give_from_isr` is O(1), never blocks and
//! never allocates.

use core::future::poll_fn;
use core::sync::atomic::{AtomicU32, Ordering};
use core::task::Poll;

use embassy_sync::waitqueue::AtomicWaker;

/// Counting wake signal shared between interrupt handlers and one task.
pub struct ScanWake {
    pending: AtomicU32,
    waker: AtomicWaker,
}

impl ScanWake {
    /// Create a signal with no pending gives.
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
            waker: AtomicWaker::new(),
        }
    }

    /// Signal one completion. Safe to call from interrupt context.
    pub fn give_from_isr(&self) {
        self.pending.fetch_add(1, Ordering::Release);
        self.waker.wake();
    }

    /// Consume all pending gives without waiting. Returns how many there were.
    pub fn try_take(&self) -> u32 {
        self.pending.swap(0, Ordering::Acquire)
    }

    /// Wait until at least one give is pending, then consume them all.
    ///
    /// Only one task may wait at a time: a second waiter displaces the first.
    pub async fn take(&self) -> u32 {
        poll_fn(|cx| {
            let taken = self.try_take();
            if taken > 0 {
                return Poll::Ready(taken);
            }
            self.waker.register(cx.waker());
            // A give may have landed between the first check and registering.
            match self.try_take() {
                0 => Poll::Pending,
                taken => Poll::Ready(taken),
            }
        })
        .await
    }
}

impl Default for ScanWake {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn gives_accumulate_until_taken() {
        let wake = ScanWake::new();
        wake.give_from_isr();
        wake.give_from_isr();
        assert_eq!(block_on(wake.take()), 2);
        assert_eq!(wake.try_take(), 0);
    }

    #[tokio::test]
    async fn take_waits_for_give() {
        static WAKE: ScanWake = ScanWake::new();
        let waiter = tokio::spawn(WAKE.take());
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        WAKE.give_from_isr();
        assert_eq!(waiter.await.ok(), Some(1));
    }
}
