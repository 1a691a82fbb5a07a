use chipset_power::{PowerSignal, SignalLatch, Signals};
use defmt::*;
use embassy_executor::task;
use embassy_rp::gpio::{Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use crate::config::SIGNAL_MONITOR_INTERVAL_MS;
use crate::config_resources::ChipsetSignalResources;

/// Raw electrical levels of the chipset power signals. Polarity is applied by
/// the sequencer's signal gate.
pub static POWER_SIGNALS: SignalLatch = SignalLatch::new();

/// Raised once the first full sample has been published.
pub static POWER_SIGNALS_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[task]
pub async fn signal_monitor_task(r: ChipsetSignalResources) {
    info!("Starting signal monitor task");

    // Sleep lines idle high through the PCH pull-ups; rail-good lines are
    // held low until the PMIC drives them.
    let inputs = [
        (PowerSignal::RsmrstPgood, Input::new(r.rsmrst_pgood, Pull::Down)),
        (PowerSignal::SlpS0, Input::new(r.slp_s0_l, Pull::None)),
        (PowerSignal::SlpS3, Input::new(r.slp_s3_l, Pull::None)),
        (PowerSignal::SlpS4, Input::new(r.slp_s4_l, Pull::None)),
        (PowerSignal::SlpSus, Input::new(r.slp_sus_l, Pull::None)),
        (PowerSignal::PmicDpwrok, Input::new(r.pmic_dpwrok, Pull::Down)),
    ];

    let mut ticker = Ticker::every(Duration::from_millis(SIGNAL_MONITOR_INTERVAL_MS));
    let mut first = true;

    info!("Signal monitor task initialized");

    loop {
        let mut levels = Signals::empty();
        for (signal, input) in inputs.iter() {
            if input.is_high() {
                levels |= signal.mask();
            }
        }
        POWER_SIGNALS.store(levels);
        trace!("Power signals: {=u32:#x}", levels.bits());

        if first {
            POWER_SIGNALS_READY.signal(());
            first = false;
        }

        ticker.next().await;
    }
}
