use core::cell::RefCell;

use chipset_power::chipset::{Board, Charger, Clock};
use chipset_power::config::CHARGER_INITIALIZED_DELAY_MS;
use chipset_power::hooks::HOOK_PRIO_DEFAULT;
use chipset_power::signal::{LatchedSignal, intel_x86_signals};
use chipset_power::{
    BootKind, BootLevels, ChipsetConfig, HookEvent, HookRegistry, HookSubscriber, HostSleepEvent,
    IntelX86Chipset, PowerButton, PowerSequencer, PowerSignal, PowerState, RailPassThrough,
    ResetKind, RetryPolicy, SequencerState, SignalGate, SignalLatch, WirelessState,
};
use defmt::*;
use embassy_executor::task;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Instant, Ticker};
use portable_atomic::{AtomicBool, Ordering};

use crate::config::CHIPSET_TICK_MS;
use crate::config_resources::{ChargerResources, ChipsetOutputResources, StatusLedResources};
use crate::tasks::config_manager::{
    get_auto_power_on, get_charger_tries, get_s0ix, get_s5_inactivity_timeout_ms,
};
use crate::tasks::power_button::{PowerButtonEvents, send_power_button_event};
use crate::tasks::signal_monitor::{POWER_SIGNALS, POWER_SIGNALS_READY};

#[derive(defmt::Format)]
pub enum ChipsetEvents {
    PowerOn,
    HardOff,
    HostSleep(HostSleepEvent),
    Reset(ResetKind),
    Throttle(bool),
}

pub type ChipsetChannelType = channel::Channel<CriticalSectionRawMutex, ChipsetEvents, 8>;
pub static CHIPSET_EVENT_CHANNEL: ChipsetChannelType = channel::Channel::new();

/// Last stable power state reached by the sequencer.
pub static CHIPSET_STATE: Mutex<CriticalSectionRawMutex, PowerState> = Mutex::new(PowerState::G3);

/// Whether the controller may enter deep sleep.
pub static DEEP_SLEEP_ALLOWED: AtomicBool = AtomicBool::new(true);

pub async fn get_chipset_state() -> PowerState {
    *CHIPSET_STATE.lock().await
}

/// Board lines and subsystems the sequencer drives as side effects.
pub struct FirmwarePlatform {
    chg_ok: Input<'static>,
    batt_low_l: Input<'static>,
    prochot_l: Output<'static>,
    bl_en: Output<'static>,
    wlan_en: Output<'static>,
}

impl Charger for FirmwarePlatform {
    fn charger_ready(&mut self) -> bool {
        self.chg_ok.is_high()
    }

    fn refuses_power_on(&mut self) -> bool {
        self.batt_low_l.is_low()
    }
}

impl Board for FirmwarePlatform {
    fn set_backlight(&mut self, enabled: bool) {
        self.bl_en.set_level(Level::from(enabled));
    }

    fn set_wireless(&mut self, state: WirelessState) {
        debug!("Wireless: {:?}", state);
        // The module keeps its own suspend state as long as it is powered.
        self.wlan_en
            .set_level(Level::from(state != WirelessState::Off));
    }

    fn set_prochot(&mut self, throttle: bool) {
        info!("PROCHOT: {}", throttle);
        self.prochot_l.set_level(Level::from(!throttle));
    }

    fn set_deep_sleep_allowed(&mut self, allowed: bool) {
        DEEP_SLEEP_ALLOWED.store(allowed, Ordering::Relaxed);
    }
}

impl PowerButton for FirmwarePlatform {
    fn assert_long_press(&mut self) {
        send_power_button_event(PowerButtonEvents::Press);
    }

    fn release_press(&mut self) {
        send_power_button_event(PowerButtonEvents::Release);
    }
}

impl Clock for FirmwarePlatform {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Power LED follows the host: lit in S0, dark otherwise.
struct StatusLed {
    led: RefCell<Output<'static>>,
}

impl HookSubscriber for StatusLed {
    fn on_hook(&self, event: HookEvent) {
        let mut led = self.led.borrow_mut();
        match event {
            HookEvent::Resume => led.set_high(),
            HookEvent::Suspend | HookEvent::Shutdown => led.set_low(),
            HookEvent::PreInit | HookEvent::Startup => {}
        }
    }
}

type Sequencer<'a> = PowerSequencer<
    &'static SignalLatch,
    IntelX86Chipset<Output<'static>, Output<'static>, Output<'static>>,
    FirmwarePlatform,
    HookRegistry<'a>,
    Delay,
    LatchedSignal<'static>,
    Output<'static>,
>;

/// Build the sequencer configuration from the persisted values. Changes made
/// at runtime apply from the next controller boot.
async fn load_chipset_config() -> ChipsetConfig {
    let s5_timeout_ms = match get_s5_inactivity_timeout_ms().await {
        0 => None,
        ms => Some(ms),
    };

    ChipsetConfig::new()
        .with_s0ix(get_s0ix().await)
        .with_charger_retry(RetryPolicy::new(
            get_charger_tries().await,
            CHARGER_INITIALIZED_DELAY_MS,
        ))
        .with_s5_inactivity_timeout_ms(s5_timeout_ms)
}

async fn handle_event(sequencer: &mut Sequencer<'_>, st: &mut SequencerState, event: ChipsetEvents) {
    debug!("Chipset event: {:?}", event);
    match event {
        ChipsetEvents::PowerOn => {
            if st.request_power_on() {
                info!("Power-on requested in {}", st.state().name());
            }
        }
        ChipsetEvents::HardOff => {
            sequencer.request_hard_off(st);
            if !st.forcing_shutdown() {
                // Already off: nothing will release a physically held button.
                send_power_button_event(PowerButtonEvents::Release);
            }
        }
        ChipsetEvents::HostSleep(event) => st.set_host_sleep_event(event),
        ChipsetEvents::Reset(kind) => {
            if let Err(e) = sequencer.chipset_reset(st, kind).await {
                warn!("{:?} reset rejected: {:?}", kind, e);
            }
        }
        ChipsetEvents::Throttle(throttle) => {
            if !sequencer.throttle_cpu(st, throttle) {
                debug!("Throttle ignored in {}", st.state().name());
            }
        }
    }
}

#[task]
pub async fn chipset_task(
    outputs: ChipsetOutputResources,
    charger: ChargerResources,
    status_led: StatusLedResources,
    boot: BootKind,
) {
    info!("Starting chipset task");

    let config = load_chipset_config().await;
    info!("Chipset config: {:?}", config);

    // Outputs are claimed only once the monitor has published real levels,
    // so a warm restart can keep a running chipset's lines where they are.
    POWER_SIGNALS_READY.wait().await;
    // Every line in the Intel table is active high: raw levels are logical.
    let levels = BootLevels::new(boot, POWER_SIGNALS.load());
    debug!("Boot levels: {:?}", levels);

    let platform = FirmwarePlatform {
        chg_ok: Input::new(charger.chg_ok, Pull::Down),
        batt_low_l: Input::new(charger.batt_low_l, Pull::Up),
        prochot_l: Output::new(outputs.prochot_l, Level::High),
        bl_en: Output::new(outputs.bl_en, Level::from(levels.host_on)),
        wlan_en: Output::new(outputs.wlan_en, Level::from(levels.host_on)),
    };
    let chipset = IntelX86Chipset::new(
        Output::new(outputs.pmic_slp_sus_l, Level::from(levels.pmic_slp_sus_l)),
        Output::new(outputs.sys_reset_l, Level::High),
        Output::new(outputs.rcin_l, Level::High),
    );
    let rsmrst = RailPassThrough::new(
        POWER_SIGNALS.input(PowerSignal::RsmrstPgood),
        Output::new(outputs.rsmrst_l, Level::from(levels.rsmrst_l)),
        config.rsmrst_settle_ms,
    );

    let status_led = StatusLed {
        led: RefCell::new(Output::new(status_led.pin, Level::Low)),
    };
    let mut hooks = HookRegistry::new();
    hooks.register(HookEvent::Resume, HOOK_PRIO_DEFAULT, &status_led);
    hooks.register(HookEvent::Suspend, HOOK_PRIO_DEFAULT, &status_led);
    hooks.register(HookEvent::Shutdown, HOOK_PRIO_DEFAULT, &status_led);

    let gate = SignalGate::new(
        &POWER_SIGNALS,
        intel_x86_signals(config.sleep_signal_transport),
    );

    let mut sequencer: Sequencer<'_> =
        PowerSequencer::new(config, gate, rsmrst, chipset, platform, hooks, Delay);

    let mut st = sequencer.init(boot);
    if st.state() == PowerState::S0 {
        // Resumed without a Resume hook.
        status_led.led.borrow_mut().set_high();
    }
    if boot == BootKind::Cold && get_auto_power_on().await {
        info!("Auto power-on");
        st.request_power_on();
    }
    *CHIPSET_STATE.lock().await = st.state();

    let mut ticker = Ticker::every(Duration::from_millis(CHIPSET_TICK_MS));
    let receiver = CHIPSET_EVENT_CHANNEL.receiver();

    info!("Chipset task initialized in {}", st.state().name());

    loop {
        ticker.next().await;

        while let Ok(event) = receiver.try_receive() {
            handle_event(&mut sequencer, &mut st, event).await;
        }

        let previous = st.state();
        st = sequencer.advance(st).await;
        if st.state() != previous {
            *CHIPSET_STATE.lock().await = st.state();
        }
    }
}
