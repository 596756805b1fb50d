//! Completion wait policies
//!
//! A blocking bus primitive polls the hardware completion flag until it is
//! set. The policy decides how long that may take. [`Forever`] keeps the
//! plain hardware behaviour: a bus that never completes hangs the caller.

use embedded_hal::delay::DelayNs;

/// How long a blocking primitive keeps polling
pub trait CompletionWait {
    /// A new wait is starting
    fn begin(&mut self);

    /// The flag was still clear after a poll
    ///
    /// Return `false` to give up; the primitive then fails with
    /// [`TwiError::Timeout`](crate::TwiError::Timeout).
    fn keep_waiting(&mut self) -> bool;
}

/// Wait indefinitely
#[derive(Debug, Clone, Copy, Default)]
pub struct Forever;

impl CompletionWait for Forever {
    fn begin(&mut self) {}

    fn keep_waiting(&mut self) -> bool {
        true
    }
}

/// Give up after a fixed number of polls
#[derive(Debug, Clone, Copy)]
pub struct SpinBudget {
    limit: u32,
    remaining: u32,
}

impl SpinBudget {
    /// Allow `limit` unsuccessful polls per wait
    pub const fn new(limit: u32) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }
}

impl CompletionWait for SpinBudget {
    fn begin(&mut self) {
        self.remaining = self.limit;
    }

    fn keep_waiting(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Give up after a time budget, sleeping between polls
pub struct DelayBudget<D> {
    delay: D,
    step_us: u32,
    budget_us: u32,
    elapsed_us: u32,
}

impl<D: DelayNs> DelayBudget<D> {
    /// Poll every `step_us` microseconds for at most `budget_us`
    pub fn new(delay: D, step_us: u32, budget_us: u32) -> Self {
        Self {
            delay,
            step_us: step_us.max(1),
            budget_us,
            elapsed_us: 0,
        }
    }

    /// Release the delay provider
    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> CompletionWait for DelayBudget<D> {
    fn begin(&mut self) {
        self.elapsed_us = 0;
    }

    fn keep_waiting(&mut self) -> bool {
        if self.elapsed_us >= self.budget_us {
            return false;
        }
        self.delay.delay_us(self.step_us);
        self.elapsed_us = self.elapsed_us.saturating_add(self.step_us);
        true
    }
}
