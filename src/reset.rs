//! Host reset entry points.
//!
//! Cold and warm resets are separate operations, not states. A cold reset
//! holds SYS_RESET_L long enough to get through the PCH debounce; a warm
//! reset only pulses RCIN_L (or asks over virtual wire).

use embedded_hal_async::delay::DelayNs;

use crate::chipset::ChipsetHooks;
use crate::config::{COLD_RESET_PULSE_MS, WARM_RESET_PULSE_US};
use crate::signal::SignalTransport;
use crate::state::{ChipsetStateMask, PowerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetKind {
    Cold,
    Warm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetError {
    /// Nothing to reset.
    ChipsetOff,
    /// SYS_RESET_L is already held.
    InProgress,
}

pub async fn chipset_reset<H, D>(
    kind: ResetKind,
    state: PowerState,
    transport: SignalTransport,
    hooks: &mut H,
    delay: &mut D,
) -> Result<(), ResetError>
where
    H: ChipsetHooks + ?Sized,
    D: DelayNs,
{
    if state.in_chipset_state(ChipsetStateMask::ANY_OFF) {
        warn!("Reset requested with chipset off");
        return Err(ResetError::ChipsetOff);
    }

    match kind {
        ResetKind::Cold => {
            if hooks.sys_reset_asserted() {
                warn!("SYS_RESET_L is already asserted");
                return Err(ResetError::InProgress);
            }

            info!("Cold reset");
            hooks.set_sys_reset(true);
            delay.delay_ms(COLD_RESET_PULSE_MS).await;
            hooks.set_sys_reset(false);
        }
        ResetKind::Warm => {
            info!("Warm reset");
            if transport == SignalTransport::VirtualWire {
                if hooks.host_reset_virtual_wire() {
                    return Ok(());
                }
                warn!("Virtual-wire host reset unavailable, pulsing RCIN_L");
            }

            hooks.set_rcin(true);
            delay.delay_us(WARM_RESET_PULSE_US).await;
            hooks.set_rcin(false);
        }
    }

    Ok(())
}
