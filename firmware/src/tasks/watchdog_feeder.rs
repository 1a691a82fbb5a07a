use defmt::debug;
use embassy_time::{Duration, Timer};
use portable_atomic::Ordering;

use crate::OM_WATCHDOG;
use crate::config::WATCHDOG_FEED_INTERVAL_MS;
use crate::tasks::chipset::{DEEP_SLEEP_ALLOWED, get_chipset_state};
use crate::tasks::signal_monitor::POWER_SIGNALS;

#[embassy_executor::task]
pub async fn watchdog_feeder_task() {
    loop {
        Timer::after(Duration::from_millis(WATCHDOG_FEED_INTERVAL_MS)).await;
        OM_WATCHDOG.get().await.lock().await.feed();

        debug!(
            "state: {} | signals: {=u32:#x} | deep sleep: {}",
            get_chipset_state().await.name(),
            POWER_SIGNALS.load().bits(),
            DEEP_SLEEP_ALLOWED.load(Ordering::Relaxed)
        );
    }
}
