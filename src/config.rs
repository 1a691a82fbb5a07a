use crate::retry::RetryPolicy;
use crate::signal::SignalTransport;

// Allow up to 1s for the charger to initialize, in case we're trying to boot
// the AP with no battery.
pub const CHARGER_INITIALIZED_DELAY_MS: u32 = 100; // ms
pub const CHARGER_INITIALIZED_TRIES: u32 = 10;

// Default timeout and poll interval when waiting for power signals.
pub const DEFAULT_SIGNAL_TIMEOUT_MS: u32 = 1_000; // ms
pub const SIGNAL_POLL_INTERVAL_MS: u32 = 10; // ms

// Wait at least 10ms between power signals going high and deasserting RSMRST
// to the PCH.
pub const RSMRST_SETTLE_MS: u32 = 10; // ms

// SYS_RESET_L is debounced for 16 ms by the PCH.
pub const COLD_RESET_PULSE_MS: u32 = 20; // ms
// RCIN_L must be at least 16 PCI clocks long = 500 ns.
pub const WARM_RESET_PULSE_US: u32 = 10; // us

// How long to stay in S5 with nothing happening before dropping to G3.
pub const DEFAULT_S5_INACTIVITY_TIMEOUT_MS: u32 = 10_000; // ms

// How long to wait in S5 for SLP_S4 to deassert before attempting an RTC
// reset, how many resets to try before staying off, and how long to let the
// RTC well settle after each one.
pub const RTC_RESET_WAIT_MS: u32 = 4_000; // ms
pub const RTC_RESET_ATTEMPTS: u8 = 5;
pub const RTC_RESET_SETTLE_MS: u32 = 10; // ms

/// Feature and timing selection for one chipset instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipsetConfig {
    /// Low-power idle (S0ix) is supported by the platform.
    pub s0ix: bool,
    /// How SLP_S3/SLP_S4 are carried from the PCH.
    pub sleep_signal_transport: SignalTransport,
    /// The board can reset the RTC to recover a PCH stuck in S5.
    pub rtc_reset: bool,
    pub charger_retry: RetryPolicy,
    pub signal_timeout_ms: u32,
    /// `None` keeps the chipset in S5 indefinitely.
    pub s5_inactivity_timeout_ms: Option<u32>,
    pub rsmrst_settle_ms: u32,
}

impl ChipsetConfig {
    pub const fn new() -> Self {
        Self {
            s0ix: false,
            sleep_signal_transport: SignalTransport::Gpio,
            rtc_reset: false,
            charger_retry: RetryPolicy::new(CHARGER_INITIALIZED_TRIES, CHARGER_INITIALIZED_DELAY_MS),
            signal_timeout_ms: DEFAULT_SIGNAL_TIMEOUT_MS,
            s5_inactivity_timeout_ms: Some(DEFAULT_S5_INACTIVITY_TIMEOUT_MS),
            rsmrst_settle_ms: RSMRST_SETTLE_MS,
        }
    }

    pub const fn with_s0ix(mut self, enabled: bool) -> Self {
        self.s0ix = enabled;
        self
    }

    pub const fn with_sleep_signal_transport(mut self, transport: SignalTransport) -> Self {
        self.sleep_signal_transport = transport;
        self
    }

    pub const fn with_rtc_reset(mut self, enabled: bool) -> Self {
        self.rtc_reset = enabled;
        self
    }

    pub const fn with_charger_retry(mut self, policy: RetryPolicy) -> Self {
        self.charger_retry = policy;
        self
    }

    pub const fn with_s5_inactivity_timeout_ms(mut self, timeout_ms: Option<u32>) -> Self {
        self.s5_inactivity_timeout_ms = timeout_ms;
        self
    }

    /// Poll attempts used by [`crate::sequencer::PowerSequencer::wait_signals`].
    pub const fn signal_wait_policy(&self, timeout_ms: u32) -> RetryPolicy {
        RetryPolicy::new(timeout_ms / SIGNAL_POLL_INTERVAL_MS, SIGNAL_POLL_INTERVAL_MS)
    }
}

impl Default for ChipsetConfig {
    fn default() -> Self {
        Self::new()
    }
}
