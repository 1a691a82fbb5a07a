use alloc::vec::Vec;

use chipset_power::{HostSleepEvent, PowerState, ResetKind};
use defmt::{debug, error, info};
use embassy_executor::task;
use embassy_rp::peripherals::I2C1;
use embassy_rp::{bind_interrupts, i2c, i2c_slave};
use portable_atomic::Ordering;

use crate::config::FW_VERSION;
use crate::config_resources::HostInterfaceResources;
use crate::tasks::chipset::{
    CHIPSET_EVENT_CHANNEL, ChipsetEvents, DEEP_SLEEP_ALLOWED, get_chipset_state,
};
use crate::tasks::config_manager::{
    get_auto_power_on, get_charger_tries, get_s0ix, get_s5_inactivity_timeout_ms,
    set_auto_power_on, set_charger_tries, set_s0ix, set_s5_inactivity_timeout_ms,
};
use crate::tasks::signal_monitor::POWER_SIGNALS;

// Following commands are supported by the host interface:
// - Read 0x01: Query firmware version
// - Read 0x10: Query power state
// - Write 0x10 0x00: Hard off, continuing to G3
// - Write 0x10 0x01: Power on
// - Write 0x11 [NN]: Report host sleep event (0 S3 suspend, 1 S3 resume,
//   2 S0ix suspend, 3 S0ix resume)
// - Write 0x12 [NN]: Reset the chipset (0 cold, 1 warm)
// - Write 0x13 [NN]: Throttle the CPU (0 off, 1 on)
// - Read 0x14: Query raw power signal levels, 32 bits
// - Read 0x15: Query whether the controller may deep sleep
// - Read 0x20: Query S0ix support
// - Write 0x20 [NN]: Enable S0ix support
// - Read 0x21: Query charger retry count
// - Write 0x21 [NNNN]: Set charger retry count
// - Read 0x22: Query S5 inactivity timeout in ms
// - Write 0x22 [NNNNNNNN]: Set S5 inactivity timeout in ms, 0 disables
// - Read 0x23: Query auto power-on
// - Write 0x23 [NN]: Enable auto power-on
// - Read 0x50 [...]: Ping, returns the payload reversed
//
// Configuration writes are persisted and take effect from the next
// controller boot. Multi-byte values are big endian.

const I2C_ADDR: u8 = 0x6e;

bind_interrupts!(struct Irqs {
    I2C1_IRQ => i2c::InterruptHandler<I2C1>;
});

/// Wire encoding of a power state: its position in `PowerState::ALL`.
fn state_code(state: PowerState) -> u8 {
    PowerState::ALL
        .iter()
        .position(|s| *s == state)
        .map_or(0xff, |i| i as u8)
}

fn host_sleep_event(code: u8) -> Option<HostSleepEvent> {
    match code {
        0x00 => Some(HostSleepEvent::S3Suspend),
        0x01 => Some(HostSleepEvent::S3Resume),
        0x02 => Some(HostSleepEvent::S0ixSuspend),
        0x03 => Some(HostSleepEvent::S0ixResume),
        _ => None,
    }
}

async fn respond(device: &mut i2c_slave::I2cSlave<'_, I2C1>, data: &[u8]) {
    if let Err(e) = device.respond_and_fill(data, 0x00).await {
        error!("error while responding {}", e)
    }
}

async fn handle_write(buf: &[u8]) {
    match buf[0] {
        // Power on or hard off
        0x10 => match buf[1] {
            0x00 => {
                info!("Host requested hard off");
                CHIPSET_EVENT_CHANNEL.send(ChipsetEvents::HardOff).await;
            }
            0x01 => {
                info!("Host requested power on");
                CHIPSET_EVENT_CHANNEL.send(ChipsetEvents::PowerOn).await;
            }
            x => error!("Invalid power state: {}", x),
        },
        // Host sleep event
        0x11 => match host_sleep_event(buf[1]) {
            Some(event) => {
                CHIPSET_EVENT_CHANNEL
                    .send(ChipsetEvents::HostSleep(event))
                    .await
            }
            None => error!("Invalid host sleep event: {}", buf[1]),
        },
        // Chipset reset
        0x12 => {
            let kind = match buf[1] {
                0x00 => ResetKind::Cold,
                0x01 => ResetKind::Warm,
                x => {
                    error!("Invalid reset kind: {}", x);
                    return;
                }
            };
            info!("Host requested {:?} reset", kind);
            CHIPSET_EVENT_CHANNEL.send(ChipsetEvents::Reset(kind)).await;
        }
        // CPU throttle
        0x13 => {
            CHIPSET_EVENT_CHANNEL
                .send(ChipsetEvents::Throttle(buf[1] != 0))
                .await
        }
        0x20 => {
            info!("Setting S0ix support to {}", buf[1] != 0);
            set_s0ix(buf[1] != 0).await;
        }
        0x21 => {
            if buf.len() != 3 {
                error!("Invalid charger retry command length");
                return;
            }
            let tries = u16::from_be_bytes([buf[1], buf[2]]);
            info!("Setting charger retry count to {}", tries);
            set_charger_tries(tries as u32).await;
        }
        0x22 => {
            if buf.len() != 5 {
                error!("Invalid S5 timeout command length");
                return;
            }
            let timeout = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
            info!("Setting S5 inactivity timeout to {} ms", timeout);
            set_s5_inactivity_timeout_ms(timeout).await;
        }
        0x23 => {
            info!("Setting auto power-on to {}", buf[1] != 0);
            set_auto_power_on(buf[1] != 0).await;
        }
        x => error!("Invalid Write command: {:02x}", x),
    }
}

#[task]
pub async fn host_interface_task(r: HostInterfaceResources) {
    info!("Starting host interface task");
    let mut config = i2c_slave::Config::default();
    config.addr = I2C_ADDR as u16;
    let mut device = i2c_slave::I2cSlave::new(r.i2c, r.scl, r.sda, Irqs, config);

    info!("Host interface task initialized");

    loop {
        let mut buf = [0u8; 16];
        match device.listen(&mut buf).await {
            Ok(i2c_slave::Command::GeneralCall(len)) => {
                error!("General call write received: {}", buf[..len]);
            }
            Ok(i2c_slave::Command::Read) => {
                let state = state_code(get_chipset_state().await);
                respond(&mut device, &[state]).await
            }
            Ok(i2c_slave::Command::Write(len)) => {
                if len < 2 {
                    error!("Write command too short");
                    continue;
                }
                handle_write(&buf[..len]).await;
            }
            Ok(i2c_slave::Command::WriteRead(len)) => match buf[0] {
                0x01 => respond(&mut device, &FW_VERSION).await,
                0x10 => {
                    let state = state_code(get_chipset_state().await);
                    respond(&mut device, &[state]).await
                }
                0x14 => {
                    let levels = POWER_SIGNALS.load().bits();
                    respond(&mut device, &levels.to_be_bytes()).await
                }
                0x15 => {
                    let allowed = DEEP_SLEEP_ALLOWED.load(Ordering::Relaxed);
                    respond(&mut device, &[allowed as u8]).await
                }
                0x20 => respond(&mut device, &[get_s0ix().await as u8]).await,
                0x21 => {
                    let tries = get_charger_tries().await.min(u16::MAX as u32) as u16;
                    respond(&mut device, &tries.to_be_bytes()).await
                }
                0x22 => {
                    let timeout = get_s5_inactivity_timeout_ms().await;
                    respond(&mut device, &timeout.to_be_bytes()).await
                }
                0x23 => respond(&mut device, &[get_auto_power_on().await as u8]).await,
                // Multi-byte ping
                0x50 => {
                    debug!("Received ping command: {:02x}", buf[1..len]);
                    let response: Vec<u8> = buf[1..len].iter().rev().cloned().collect();
                    respond(&mut device, &response).await;
                }
                x => error!("Invalid Write Read command: 0x{:02x}", x),
            },
            Err(e) => error!("{}", e),
        }
    }
}
