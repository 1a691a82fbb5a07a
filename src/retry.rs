//! Bounded polling with an injected sleep primitive.
//!
//! The power-up path must never block on a single long wait. Instead it
//! polls a condition, sleeping a small fixed interval between attempts, and
//! gives up once the budget is spent.

use embedded_hal_async::delay::DelayNs;

/// Fixed iteration count and per-iteration delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub delay_ms: u32,
}

impl RetryPolicy {
    pub const fn new(max_tries: u32, delay_ms: u32) -> Self {
        Self {
            max_tries,
            delay_ms,
        }
    }

    /// Longest time a budget created from this policy can sleep.
    pub const fn max_duration_ms(&self) -> u32 {
        self.max_tries.saturating_mul(self.delay_ms)
    }

    pub const fn budget(&self) -> RetryBudget {
        RetryBudget {
            policy: *self,
            tries: 0,
        }
    }
}

/// Outcome of one poll of the awaited condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attempt {
    Ready,
    Pending,
    /// Stop immediately; waiting longer cannot help.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryError {
    Exhausted { tries: u32 },
    Aborted { tries: u32 },
}

/// Per-call retry counter. Never persisted across invocations.
#[derive(Debug)]
pub struct RetryBudget {
    policy: RetryPolicy,
    tries: u32,
}

impl RetryBudget {
    /// Number of sleeps taken so far.
    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn is_exhausted(&self) -> bool {
        self.tries >= self.policy.max_tries
    }

    /// Spend one sleep from the budget, or fail if none are left.
    pub async fn sleep<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), RetryError> {
        if self.is_exhausted() {
            return Err(RetryError::Exhausted { tries: self.tries });
        }

        self.tries += 1;
        delay.delay_ms(self.policy.delay_ms).await;
        Ok(())
    }

    /// Poll `check` until it reports ready, aborts, or the budget runs out.
    ///
    /// The condition is checked once up front and once after every sleep, so
    /// a condition that is already true costs no delay at all.
    pub async fn poll<D, F>(&mut self, delay: &mut D, mut check: F) -> Result<u32, RetryError>
    where
        D: DelayNs,
        F: FnMut() -> Attempt,
    {
        loop {
            match check() {
                Attempt::Ready => return Ok(self.tries),
                Attempt::Abort => return Err(RetryError::Aborted { tries: self.tries }),
                Attempt::Pending => {}
            }

            self.sleep(delay).await?;
        }
    }
}
