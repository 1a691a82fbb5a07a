#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use chipset_power::signal::{LatchedSignal, intel_x86_signals};
use chipset_power::{
    Board, Charger, ChipsetConfig, ChipsetHooks, Clock, HookEvent, LifecycleNotifier, PowerButton, PowerSequencer,
    PowerSignal, RailPassThrough, SignalGate, SignalLatch, WirelessState,
};
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use embedded_hal_async::delay::DelayNs;

/// Simulated time shared by the delay and the platform clock.
#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.set(self.0.get() + ms * 1_000_000);
    }
}

pub struct SimDelay {
    clock: SimClock,
    pub sleeps: u32,
}

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.0.set(self.clock.0.get() + u64::from(ns));
        self.sleeps += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Backlight(bool),
    Wireless(WirelessState),
    Prochot(bool),
    DeepSleep(bool),
    LidWakeMask(bool),
    ButtonPress,
    ButtonRelease,
}

pub struct FakePlatform<'a> {
    latch: &'a SignalLatch,
    clock: SimClock,
    pub calls: Vec<Call>,
    /// Charger becomes ready on this poll (1-based); `None` never.
    pub charger_ready_on_poll: Option<u32>,
    pub refuses_power_on: bool,
    /// Drop the rail-good signal on this charger poll (1-based).
    pub drop_rails_on_poll: Option<u32>,
    pub charger_polls: u32,
}

impl FakePlatform<'_> {
    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl Charger for FakePlatform<'_> {
    fn charger_ready(&mut self) -> bool {
        self.charger_polls += 1;
        if self.drop_rails_on_poll == Some(self.charger_polls) {
            self.latch.set(PowerSignal::RsmrstPgood, false);
        }
        self.charger_ready_on_poll.is_some_and(|poll| self.charger_polls >= poll)
    }

    fn refuses_power_on(&mut self) -> bool {
        self.refuses_power_on
    }
}

impl Board for FakePlatform<'_> {
    fn set_backlight(&mut self, enabled: bool) {
        self.calls.push(Call::Backlight(enabled));
    }

    fn set_wireless(&mut self, state: WirelessState) {
        self.calls.push(Call::Wireless(state));
    }

    fn set_prochot(&mut self, throttle: bool) {
        self.calls.push(Call::Prochot(throttle));
    }

    fn set_deep_sleep_allowed(&mut self, allowed: bool) {
        self.calls.push(Call::DeepSleep(allowed));
    }

    fn set_lid_wake_mask(&mut self, enabled: bool) {
        self.calls.push(Call::LidWakeMask(enabled));
    }
}

impl PowerButton for FakePlatform<'_> {
    fn assert_long_press(&mut self) {
        self.calls.push(Call::ButtonPress);
    }

    fn release_press(&mut self) {
        self.calls.push(Call::ButtonRelease);
    }
}

impl Clock for FakePlatform<'_> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

#[derive(Default)]
pub struct FakeChipset {
    pub pmic_slp_sus: Vec<bool>,
    pub force_g3: u32,
    pub rtc_resets: u32,
    pub rsmrst_edges: Vec<bool>,
    pub sys_reset: Vec<bool>,
    pub rcin: Vec<bool>,
}

impl ChipsetHooks for FakeChipset {
    fn set_pmic_slp_sus(&mut self, level: bool) {
        self.pmic_slp_sus.push(level);
    }

    fn force_g3(&mut self) {
        self.force_g3 += 1;
        self.set_pmic_slp_sus(false);
    }

    fn before_rsmrst(&mut self, level: bool) {
        self.rsmrst_edges.push(level);
    }

    fn rtc_reset(&mut self) {
        self.rtc_resets += 1;
    }

    fn sys_reset_asserted(&mut self) -> bool {
        self.sys_reset.last().copied().unwrap_or(false)
    }

    fn set_sys_reset(&mut self, asserted: bool) {
        self.sys_reset.push(asserted);
    }

    fn set_rcin(&mut self, asserted: bool) {
        self.rcin.push(asserted);
    }
}

#[derive(Default)]
pub struct HookLog {
    pub events: Vec<HookEvent>,
}

impl HookLog {
    pub fn count(&self, event: HookEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl LifecycleNotifier for HookLog {
    fn notify(&mut self, event: HookEvent) {
        self.events.push(event);
    }
}

#[derive(Default)]
pub struct FakePin {
    pub high: bool,
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for FakePin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

pub type TestSequencer<'a> =
    PowerSequencer<&'a SignalLatch, FakeChipset, FakePlatform<'a>, HookLog, SimDelay, LatchedSignal<'a>, FakePin>;

pub struct Rig<'a> {
    pub seq: TestSequencer<'a>,
    pub clock: SimClock,
}

/// A sequencer over `latch` whose charger is ready on the first poll.
pub fn rig(latch: &SignalLatch, config: ChipsetConfig) -> Rig<'_> {
    let clock = SimClock::default();
    let gate = SignalGate::new(latch, intel_x86_signals(config.sleep_signal_transport));
    let rsmrst = RailPassThrough::new(
        latch.input(PowerSignal::RsmrstPgood),
        FakePin::default(),
        config.rsmrst_settle_ms,
    );
    let platform = FakePlatform {
        latch,
        clock: clock.clone(),
        calls: Vec::new(),
        charger_ready_on_poll: Some(1),
        refuses_power_on: false,
        drop_rails_on_poll: None,
        charger_polls: 0,
    };
    let delay = SimDelay {
        clock: clock.clone(),
        sleeps: 0,
    };

    Rig {
        seq: PowerSequencer::new(
            config,
            gate,
            rsmrst,
            FakeChipset::default(),
            platform,
            HookLog::default(),
            delay,
        ),
        clock,
    }
}
