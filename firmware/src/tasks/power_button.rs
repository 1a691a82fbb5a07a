use defmt::{debug, info, warn};
use embassy_executor::task;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel};
use embassy_time::{Duration, Timer, with_timeout};

use crate::config::{POWER_BUTTON_DEBOUNCE_MS, POWER_BUTTON_HARD_OFF_MS};
use crate::config_resources::{PowerButtonInputResources, PowerButtonResources};
use crate::tasks::chipset::{CHIPSET_EVENT_CHANNEL, ChipsetEvents};

#[derive(defmt::Format)]
pub enum PowerButtonEvents {
    Press,
    Release,
}

pub type PowerButtonChannelType = channel::Channel<CriticalSectionRawMutex, PowerButtonEvents, 8>;
pub static POWER_BUTTON_EVENT_CHANNEL: PowerButtonChannelType = channel::Channel::new();

/// Queue a button event without blocking the caller.
pub fn send_power_button_event(event: PowerButtonEvents) {
    if let Err(channel::TrySendError::Full(event)) = POWER_BUTTON_EVENT_CHANNEL.try_send(event) {
        warn!("Power button channel full, dropping {:?}", event);
    }
}

#[task]
pub async fn power_button_output_task(r: PowerButtonResources) {
    info!("Initializing power button output task");
    let mut button = Output::new(r.pin, Level::High);

    let receiver = POWER_BUTTON_EVENT_CHANNEL.receiver();

    info!("Power button output task initialized");

    loop {
        let event = receiver.receive().await;
        debug!("Received event: {:?}", event);
        match event {
            PowerButtonEvents::Press => {
                button.set_low();
            }
            PowerButtonEvents::Release => {
                button.set_high();
            }
        }
    }
}

#[task]
pub async fn power_button_input_task(r: PowerButtonInputResources) {
    info!("Starting power button input task");

    let mut button = Input::new(r.pin, Pull::Up);

    info!("Power button input task initialized");

    loop {
        button.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(POWER_BUTTON_DEBOUNCE_MS)).await;
        if button.is_high() {
            continue;
        }

        debug!("Power button pressed");
        send_power_button_event(PowerButtonEvents::Press);
        CHIPSET_EVENT_CHANNEL.send(ChipsetEvents::PowerOn).await;

        let held = with_timeout(
            Duration::from_millis(POWER_BUTTON_HARD_OFF_MS),
            button.wait_for_high(),
        )
        .await
        .is_err();

        if held {
            // The forced-shutdown latch keeps PWRBTN asserted and releases it
            // once the chipset reaches S5.
            info!("Power button held, requesting hard off");
            CHIPSET_EVENT_CHANNEL.send(ChipsetEvents::HardOff).await;
            button.wait_for_high().await;
            continue;
        }

        debug!("Power button released");
        send_power_button_event(PowerButtonEvents::Release);
    }
}
