//! The chipset power-sequencing state machine.
//!
//! [`PowerSequencer`] owns the collaborators and evaluates one state at a
//! time. The state itself lives in [`SequencerState`], which the caller owns
//! and passes back in on every call, so nothing here is a process-wide
//! static.

use embedded_hal::digital::{InputPin, StatefulOutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::chipset::{ChipsetHooks, Platform, WirelessState};
use crate::config::{ChipsetConfig, RTC_RESET_ATTEMPTS, RTC_RESET_SETTLE_MS, RTC_RESET_WAIT_MS};
use crate::hooks::{HookEvent, LifecycleNotifier};
use crate::passthrough::{RailPassThrough, mirror_suspend_line};
use crate::reset::{self, ResetError, ResetKind};
use crate::retry::{Attempt, RetryError};
use crate::shutdown::ShutdownLatch;
use crate::signal::{SignalError, SignalGate, SignalSnapshot, SignalSource, Signals};
use crate::state::{ChipsetStateMask, HostSleepEvent, PowerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootKind {
    /// Power-on reset of the controller.
    Cold,
    /// The controller jumped to a new image with the chipset possibly running.
    WarmRestart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalWaitError {
    Timeout { missing: Signals },
}

/// Any failure the sequencer reports to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    Signal(SignalError),
    Retry(RetryError),
    Wait(SignalWaitError),
    Reset(ResetError),
}

impl From<SignalError> for Error {
    fn from(e: SignalError) -> Self {
        Error::Signal(e)
    }
}

impl From<RetryError> for Error {
    fn from(e: RetryError) -> Self {
        Error::Retry(e)
    }
}

impl From<SignalWaitError> for Error {
    fn from(e: SignalWaitError) -> Self {
        Error::Wait(e)
    }
}

impl From<ResetError> for Error {
    fn from(e: ResetError) -> Self {
        Error::Reset(e)
    }
}

/// Initial levels for the controller-driven lines, before
/// [`PowerSequencer::init`] takes them over.
///
/// A cold boot starts with everything released. A warm restart keeps the
/// lines where the running chipset has them, so claiming the pins does not
/// drop RSMRST or the PMIC suspend line under the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootLevels {
    pub rsmrst_l: bool,
    pub pmic_slp_sus_l: bool,
    /// Backlight and wireless enables.
    pub host_on: bool,
}

impl BootLevels {
    pub fn new(boot: BootKind, signals: Signals) -> Self {
        match boot {
            BootKind::Cold => Self {
                rsmrst_l: false,
                pmic_slp_sus_l: false,
                host_on: false,
            },
            BootKind::WarmRestart => Self {
                rsmrst_l: signals.has(Signals::RSMRST_L_PGOOD),
                pmic_slp_sus_l: signals.has(Signals::PCH_SLP_SUS_DEASSERTED),
                host_on: signals.has(Signals::ALL_S0),
            },
        }
    }
}

/// Everything that must survive between evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerState {
    state: PowerState,
    latch: ShutdownLatch,
    /// The current visit to S5 is part of a power-up sequence.
    power_s5_up: bool,
    want_g3_exit: bool,
    want_g3_entry: bool,
    host_sleep: HostSleepEvent,
    s5_entered_ms: Option<u64>,
    rtc_reset_tries: u8,
}

impl SequencerState {
    pub const fn new() -> Self {
        Self::in_state(PowerState::G3)
    }

    const fn in_state(state: PowerState) -> Self {
        Self {
            state,
            latch: ShutdownLatch::new(),
            power_s5_up: false,
            want_g3_exit: false,
            want_g3_entry: false,
            host_sleep: HostSleepEvent::S0ixResume,
            s5_entered_ms: None,
            rtc_reset_tries: 0,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn forcing_shutdown(&self) -> bool {
        self.latch.is_engaged()
    }

    pub fn power_s5_up(&self) -> bool {
        self.power_s5_up
    }

    pub fn host_sleep_event(&self) -> HostSleepEvent {
        self.host_sleep
    }

    pub fn set_host_sleep_event(&mut self, event: HostSleepEvent) {
        debug!("Host sleep event {:?}", event);
        self.host_sleep = event;
    }

    /// Ask the machine to leave G3 on its next evaluation.
    ///
    /// In S5 this restarts the inactivity timer instead. Returns false if the
    /// chipset is already on its way up.
    pub fn request_power_on(&mut self) -> bool {
        match self.state {
            PowerState::G3 | PowerState::S5G3 => {
                self.want_g3_exit = true;
                true
            }
            PowerState::S5 => {
                self.s5_entered_ms = None;
                self.want_g3_entry = false;
                true
            }
            _ => false,
        }
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PowerSequencer<S, H, P, N, D, I, O> {
    config: ChipsetConfig,
    gate: SignalGate<S>,
    rsmrst: RailPassThrough<I, O>,
    chipset: H,
    platform: P,
    notifier: N,
    delay: D,
}

impl<S, H, P, N, D, I, O> PowerSequencer<S, H, P, N, D, I, O>
where
    S: SignalSource,
    H: ChipsetHooks,
    P: Platform,
    N: LifecycleNotifier,
    D: DelayNs,
    I: InputPin,
    O: StatefulOutputPin,
{
    pub fn new(
        config: ChipsetConfig,
        gate: SignalGate<S>,
        rsmrst: RailPassThrough<I, O>,
        chipset: H,
        platform: P,
        notifier: N,
        delay: D,
    ) -> Self {
        Self {
            config,
            gate,
            rsmrst,
            chipset,
            platform,
            notifier,
            delay,
        }
    }

    pub fn config(&self) -> &ChipsetConfig {
        &self.config
    }

    pub fn signals(&self) -> SignalSnapshot {
        self.gate.last()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn chipset_mut(&mut self) -> &mut H {
        &mut self.chipset
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn gate_mut(&mut self) -> &mut SignalGate<S> {
        &mut self.gate
    }

    /// Reconstruct the initial state from the hardware.
    ///
    /// After a warm restart the chipset may already be running. If so, the
    /// machine resumes in S0 without re-driving anything that is already in
    /// place; otherwise the chipset is forced into G3.
    pub fn init(&mut self, boot: BootKind) -> SequencerState {
        let signals = self.gate.init();

        if boot == BootKind::WarmRestart {
            if signals.has(Signals::ALL_S0) {
                info!("Warm restart with chipset in S0");
                // Keep the controller out of deep sleep while the AP is on.
                self.platform.set_deep_sleep_allowed(false);
                return SequencerState::in_state(PowerState::S0);
            }

            info!("Warm restart with chipset not in S0, forcing G3");
            self.chipset.force_g3();
        }

        SequencerState::new()
    }

    /// Run one evaluation of the current state.
    pub async fn step(&mut self, mut st: SequencerState) -> SequencerState {
        self.rsmrst
            .handle(st.state, &mut self.delay, &mut self.chipset)
            .await;

        let signals = self.gate.sample();
        let next = self.evaluate(&mut st, signals).await;

        if next != st.state {
            info!("{} -> {}", st.state.name(), next.name());
            self.entering(&mut st, next);
        }
        st.state = next;

        mirror_suspend_line(st.state, self.gate.last(), &mut self.chipset);
        st
    }

    /// Evaluate the current state, then any transitional state that
    /// produces, so the caller only ever holds a stable state.
    pub async fn advance(&mut self, st: SequencerState) -> SequencerState {
        let mut st = self.step(st).await;
        while st.state.is_transitional() {
            st = self.step(st).await;
        }
        st
    }

    /// Begin a forced shutdown by holding the power button.
    ///
    /// Does not change the state; later evaluations observe the chipset
    /// going down.
    pub fn force_shutdown(&mut self, st: &mut SequencerState) -> bool {
        let engaged = st.latch.engage(st.state, &mut self.platform);
        if engaged {
            info!("Forcing shutdown from {}", st.state.name());
        }
        engaged
    }

    /// Shut down and continue to G3 once S5 is reached.
    pub fn request_hard_off(&mut self, st: &mut SequencerState) {
        if st.state == PowerState::G3 {
            return;
        }
        st.want_g3_exit = false;
        st.want_g3_entry = true;
        self.force_shutdown(st);
    }

    /// Poll until every signal in `want` is present or `timeout_ms` passes.
    ///
    /// The rail pass-through keeps running while waiting.
    pub async fn wait_signals(
        &mut self,
        state: PowerState,
        want: Signals,
        timeout_ms: u32,
    ) -> Result<(), SignalWaitError> {
        let mut budget = self.config.signal_wait_policy(timeout_ms).budget();

        loop {
            let signals = self.gate.sample();
            if signals.has(want) {
                return Ok(());
            }

            if budget.sleep(&mut self.delay).await.is_err() {
                let missing = want.difference(signals);
                for name in self.gate.names(missing) {
                    warn!("Timeout waiting for {}", name);
                }
                return Err(SignalWaitError::Timeout { missing });
            }

            self.rsmrst
                .handle(state, &mut self.delay, &mut self.chipset)
                .await;
        }
    }

    pub async fn chipset_reset(&mut self, st: &SequencerState, kind: ResetKind) -> Result<(), ResetError> {
        reset::chipset_reset(
            kind,
            st.state,
            self.config.sleep_signal_transport,
            &mut self.chipset,
            &mut self.delay,
        )
        .await
    }

    /// Assert PROCHOT. Ignored unless the chipset is on.
    pub fn throttle_cpu(&mut self, st: &SequencerState, throttle: bool) -> bool {
        if !st.state.in_chipset_state(ChipsetStateMask::ON) {
            return false;
        }
        self.platform.set_prochot(throttle);
        true
    }

    /// Bookkeeping that applies to an edge regardless of where it came from.
    fn entering(&mut self, st: &mut SequencerState, next: PowerState) {
        if st.state == PowerState::S5 {
            st.s5_entered_ms = None;
        }

        match next {
            PowerState::G3 => {
                st.latch.release(&mut self.platform);
                st.power_s5_up = false;
                st.want_g3_entry = false;
                st.rtc_reset_tries = 0;
            }
            PowerState::S5 => {
                st.s5_entered_ms = Some(self.platform.now_ms());
            }
            _ => {}
        }
    }

    async fn evaluate(&mut self, st: &mut SequencerState, signals: SignalSnapshot) -> PowerState {
        let rails_good = signals.has(Signals::PGOOD_ALL_CORE);

        match st.state {
            PowerState::G3 => {
                if st.want_g3_exit {
                    st.want_g3_exit = false;
                    return PowerState::G3S5;
                }
                PowerState::G3
            }

            PowerState::S5 => self.evaluate_s5(st, signals).await,

            PowerState::S3 => {
                if !rails_good {
                    // Required rail went away
                    self.force_shutdown(st);
                    PowerState::S3S5
                } else if signals.has(Signals::SLP_S3_DEASSERTED) {
                    PowerState::S3S0
                } else if !signals.has(Signals::SLP_S4_DEASSERTED) {
                    PowerState::S3S5
                } else {
                    PowerState::S3
                }
            }

            PowerState::S0 => {
                if !rails_good {
                    self.force_shutdown(st);
                    PowerState::S0S3
                } else if self.config.s0ix
                    && st.host_sleep == HostSleepEvent::S0ixSuspend
                    && !signals.has(Signals::SLP_S0_DEASSERTED)
                {
                    PowerState::S0S0ix
                } else if !signals.has(Signals::SLP_S3_DEASSERTED) {
                    PowerState::S0S3
                } else {
                    PowerState::S0
                }
            }

            PowerState::S0ix => {
                if !rails_good {
                    self.force_shutdown(st);
                    PowerState::S0ixS3
                } else if !signals.has(Signals::SLP_S3_DEASSERTED) {
                    PowerState::S0ixS3
                } else if st.host_sleep == HostSleepEvent::S0ixResume {
                    // SLP_S0 blips without a host resume keep us in S0ix.
                    PowerState::S0ixS0
                } else {
                    PowerState::S0ix
                }
            }

            PowerState::G3S5 => self.power_up_to_s5(st).await,

            PowerState::S5S3 => {
                if !rails_good {
                    self.force_shutdown(st);
                    return PowerState::S5G3;
                }

                // Call hooks now that rails are up
                self.notifier.notify(HookEvent::Startup);
                st.host_sleep = HostSleepEvent::S0ixResume;
                PowerState::S3
            }

            PowerState::S3S0 => {
                if !rails_good {
                    self.force_shutdown(st);
                    return PowerState::S3S5;
                }

                self.platform.set_backlight(true);
                self.platform.set_wireless(WirelessState::On);
                self.notifier.notify(HookEvent::Resume);
                self.platform.set_deep_sleep_allowed(false);
                self.platform.set_prochot(false);
                PowerState::S0
            }

            PowerState::S0S3 => {
                self.notifier.notify(HookEvent::Suspend);
                self.platform.set_backlight(false);
                self.platform.set_wireless(WirelessState::Suspend);
                self.platform.set_deep_sleep_allowed(true);
                st.host_sleep = HostSleepEvent::S0ixResume;
                PowerState::S3
            }

            PowerState::S0S0ix => {
                self.notifier.notify(HookEvent::Suspend);
                self.platform.set_lid_wake_mask(true);
                self.platform.set_deep_sleep_allowed(true);
                PowerState::S0ix
            }

            PowerState::S0ixS0 => {
                self.platform.set_lid_wake_mask(false);
                self.notifier.notify(HookEvent::Resume);
                self.platform.set_deep_sleep_allowed(false);
                PowerState::S0
            }

            PowerState::S0ixS3 => {
                // Suspend was already announced on the way into S0ix.
                self.platform.set_lid_wake_mask(false);
                self.platform.set_backlight(false);
                self.platform.set_wireless(WirelessState::Suspend);
                st.host_sleep = HostSleepEvent::S0ixResume;
                PowerState::S3
            }

            PowerState::S3S5 => {
                self.notifier.notify(HookEvent::Shutdown);
                self.platform.set_wireless(WirelessState::Off);
                // Always pass through S5 so global resets, which briefly
                // assert the SLP_Sx lines, are handled.
                st.power_s5_up = false;
                PowerState::S5
            }

            PowerState::S5G3 => {
                self.chipset.force_g3();
                PowerState::G3
            }
        }
    }

    async fn evaluate_s5(&mut self, st: &mut SequencerState, signals: SignalSnapshot) -> PowerState {
        if st.latch.release(&mut self.platform) {
            debug!("Released forced shutdown");
        }

        if st.want_g3_entry {
            return PowerState::S5G3;
        }

        if self.config.rtc_reset && st.power_s5_up {
            return self.wait_s5_exit_or_rtc_reset(st).await;
        }

        if signals.has(Signals::SLP_S4_DEASSERTED) {
            return PowerState::S5S3;
        }

        if let Some(timeout_ms) = self.config.s5_inactivity_timeout_ms {
            let now = self.platform.now_ms();
            let entered = *st.s5_entered_ms.get_or_insert(now);
            if now.saturating_sub(entered) >= u64::from(timeout_ms) {
                info!("S5 inactivity timeout");
                return PowerState::S5G3;
            }
        }

        PowerState::S5
    }

    /// Wait for the PCH to leave S5; if it never does, reset the RTC and
    /// power up again, giving up after a few attempts.
    async fn wait_s5_exit_or_rtc_reset(&mut self, st: &mut SequencerState) -> PowerState {
        if self
            .wait_signals(PowerState::S5, Signals::SLP_S4_DEASSERTED, RTC_RESET_WAIT_MS)
            .await
            .is_ok()
        {
            st.rtc_reset_tries = 0;
            return PowerState::S5S3;
        }

        warn!("Timeout waiting for S5 exit");
        self.chipset.force_g3();
        self.chipset.rtc_reset();
        st.rtc_reset_tries += 1;
        if st.rtc_reset_tries >= RTC_RESET_ATTEMPTS {
            error!("RTC reset did not recover the PCH, staying off");
            return PowerState::S5G3;
        }

        self.delay.delay_ms(RTC_RESET_SETTLE_MS).await;
        PowerState::G3S5
    }

    async fn power_up_to_s5(&mut self, st: &mut SequencerState) -> PowerState {
        // Call hooks to initialize PMIC
        self.notifier.notify(HookEvent::PreInit);

        if let Err(e) = self.wait_for_charger().await {
            info!("Power-up inhibited: {:?}", e);
            self.force_shutdown(st);
            return PowerState::G3;
        }

        // Wait for all supplies to come up
        if self
            .wait_signals(PowerState::G3S5, Signals::PCH_SLP_SUS_DEASSERTED, self.config.signal_timeout_ms)
            .await
            .is_err()
        {
            self.force_shutdown(st);
            return PowerState::G3;
        }

        st.power_s5_up = true;
        PowerState::S5
    }

    /// Allow the charger some time to initialize, in case the AP is booting
    /// with no battery.
    ///
    /// Rails that were good when the wait began and then drop are treated
    /// like the charger refusing power-on.
    async fn wait_for_charger(&mut self) -> Result<u32, RetryError> {
        let rails_at_start = self.gate.last().has(Signals::PGOOD_ALL_CORE);
        let mut budget = self.config.charger_retry.budget();
        let mut first = true;

        let platform = &mut self.platform;
        let gate = &mut self.gate;
        budget
            .poll(&mut self.delay, || {
                if platform.refuses_power_on() {
                    return Attempt::Abort;
                }

                let rails_good = if first {
                    first = false;
                    rails_at_start
                } else {
                    gate.sample().has(Signals::PGOOD_ALL_CORE)
                };
                if rails_at_start && !rails_good {
                    warn!("Rails lost while waiting for charger");
                    return Attempt::Abort;
                }

                if platform.charger_ready() {
                    Attempt::Ready
                } else {
                    Attempt::Pending
                }
            })
            .await
    }
}
