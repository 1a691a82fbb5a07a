#![no_std]
#![no_main]

extern crate alloc;

use chipset_power::BootKind;
use config::FLASH_SIZE;
use embassy_rp::{flash::Async, watchdog::Watchdog};
use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex},
    mutex::Mutex,
    once_lock::OnceLock,
};
use embedded_alloc::LlffHeap as Heap;

#[global_allocator]
static HEAP: Heap = Heap::empty();
const HEAP_SIZE: usize = 16384; // 16kB

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_time::Duration;
use {defmt_rtt as _, panic_probe as _};

mod config;
mod config_resources;
mod flash_layout;
mod tasks;

use crate::config_resources::{
    AssignedResources, ChargerResources, ChipsetOutputResources, ChipsetSignalResources,
    HostInterfaceResources, PowerButtonInputResources, PowerButtonResources, StatusLedResources,
};
use crate::tasks::config_manager::init_config_manager;

pub type FlashType<'a> =
    embassy_rp::flash::Flash<'a, embassy_rp::peripherals::FLASH, Async, FLASH_SIZE>;
pub type MFlashType<'a> = Mutex<NoopRawMutex, FlashType<'a>>;
pub static OM_FLASH: OnceLock<MFlashType<'static>> = OnceLock::new();

pub static OM_WATCHDOG: OnceLock<Mutex<CriticalSectionRawMutex, Watchdog>> = OnceLock::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // Initialize the allocator BEFORE you use it
    {
        use core::mem::MaybeUninit;
        static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
        unsafe { HEAP.init(&raw mut HEAP_MEM as usize, HEAP_SIZE) }
    }

    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    info!("Starting up...");

    let mut watchdog = Watchdog::new(p.WATCHDOG);

    // A watchdog or forced reset restarts the controller with the host
    // possibly still running.
    let boot = match watchdog.reset_reason() {
        Some(_) => {
            info!("Restarted by watchdog");
            BootKind::WarmRestart
        }
        None => BootKind::Cold,
    };

    watchdog.start(Duration::from_millis(config::WATCHDOG_TIMEOUT_MS));
    if OM_WATCHDOG.init(Mutex::new(watchdog)).is_err() {
        error!("Failed to initialize watchdog");
        return;
    }

    // Initialize the config manager
    let flash = embassy_rp::flash::Flash::<embassy_rp::peripherals::FLASH, Async, FLASH_SIZE>::new(
        p.FLASH, p.DMA_CH1,
    );
    let flash: MFlashType = Mutex::<NoopRawMutex, _>::new(flash);

    if OM_FLASH.init(flash).is_err() {
        error!("Failed to initialize flash");
        return;
    }

    info!("Initializing config manager...");

    let config_manager = init_config_manager(OM_FLASH.get().await).await;

    info!("Config manager initialized.");

    // Spawn the async tasks
    spawner
        .spawn(tasks::watchdog_feeder::watchdog_feeder_task())
        .unwrap();

    spawner
        .spawn(tasks::config_manager::config_manager_task(config_manager))
        .unwrap();

    spawner
        .spawn(tasks::signal_monitor::signal_monitor_task(r.chipset_signals))
        .unwrap();

    spawner
        .spawn(tasks::power_button::power_button_output_task(
            r.power_button,
        ))
        .unwrap();

    spawner
        .spawn(tasks::power_button::power_button_input_task(
            r.power_button_input,
        ))
        .unwrap();

    spawner
        .spawn(tasks::chipset::chipset_task(
            r.chipset_outputs,
            r.charger,
            r.status_led,
            boot,
        ))
        .unwrap();

    spawner
        .spawn(tasks::host_interface::host_interface_task(r.host_interface))
        .unwrap();
}
