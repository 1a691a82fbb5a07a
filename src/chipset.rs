//! Collaborator contracts consumed by the sequencer, and the Intel x86
//! implementation of the chipset-specific capabilities.

use embedded_hal::digital::{OutputPin, PinState, StatefulOutputPin};

use crate::shutdown::PowerButton;

/// Charger subsystem readiness as seen from the power-up path.
pub trait Charger {
    /// The charger is initialized and no longer prevents power-on.
    fn charger_ready(&mut self) -> bool;
    /// Battery is too low (or similar): power-on must not proceed.
    fn refuses_power_on(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WirelessState {
    Off,
    Suspend,
    On,
}

/// Downstream subsystems toggled as transition side effects.
pub trait Board {
    fn set_backlight(&mut self, enabled: bool);
    fn set_wireless(&mut self, state: WirelessState);
    /// Assert PROCHOT to throttle the CPU.
    fn set_prochot(&mut self, throttle: bool);
    /// Whether the EC idle task may enter deep sleep.
    fn set_deep_sleep_allowed(&mut self, allowed: bool);
    fn set_lid_wake_mask(&mut self, _enabled: bool) {}
}

/// Monotonic millisecond time.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Everything the sequencer needs from the board besides the chipset
/// capabilities and the signal source.
pub trait Platform: Charger + Board + PowerButton + Clock {}

impl<T: Charger + Board + PowerButton + Clock> Platform for T {}

/// Chipset-family capabilities, one implementation per family.
pub trait ChipsetHooks {
    /// Mirror the PCH's SLP_SUS request to the PMIC.
    fn set_pmic_slp_sus(&mut self, level: bool);

    /// Drop the chipset into a fake G3 by cutting the PMIC suspend rails.
    fn force_g3(&mut self) {
        self.set_pmic_slp_sus(false);
    }

    /// Called just before the RSMRST pass-through drives a new level.
    fn before_rsmrst(&mut self, _level: bool) {}

    /// Reset the RTC well so a PCH stuck in S5 can boot again.
    fn rtc_reset(&mut self) {}

    fn sys_reset_asserted(&mut self) -> bool;
    fn set_sys_reset(&mut self, asserted: bool);
    fn set_rcin(&mut self, asserted: bool);

    /// Warm reset over the virtual-wire link. Returns false if unsupported.
    fn host_reset_virtual_wire(&mut self) -> bool {
        false
    }
}

impl<H: ChipsetHooks + ?Sized> ChipsetHooks for &mut H {
    fn set_pmic_slp_sus(&mut self, level: bool) {
        (**self).set_pmic_slp_sus(level)
    }

    fn force_g3(&mut self) {
        (**self).force_g3()
    }

    fn before_rsmrst(&mut self, level: bool) {
        (**self).before_rsmrst(level)
    }

    fn rtc_reset(&mut self) {
        (**self).rtc_reset()
    }

    fn sys_reset_asserted(&mut self) -> bool {
        (**self).sys_reset_asserted()
    }

    fn set_sys_reset(&mut self, asserted: bool) {
        (**self).set_sys_reset(asserted)
    }

    fn set_rcin(&mut self, asserted: bool) {
        (**self).set_rcin(asserted)
    }

    fn host_reset_virtual_wire(&mut self) -> bool {
        (**self).host_reset_virtual_wire()
    }
}

/// Intel x86 (Skylake-style) chipset lines driven from GPIOs.
///
/// `SYS_RESET_L` and `RCIN_L` are active low.
pub struct IntelX86Chipset<SUS, RST, RCIN> {
    pmic_slp_sus_l: SUS,
    sys_reset_l: RST,
    rcin_l: RCIN,
}

impl<SUS, RST, RCIN> IntelX86Chipset<SUS, RST, RCIN>
where
    SUS: OutputPin,
    RST: StatefulOutputPin,
    RCIN: OutputPin,
{
    pub fn new(pmic_slp_sus_l: SUS, sys_reset_l: RST, rcin_l: RCIN) -> Self {
        Self {
            pmic_slp_sus_l,
            sys_reset_l,
            rcin_l,
        }
    }

    pub fn release(self) -> (SUS, RST, RCIN) {
        (self.pmic_slp_sus_l, self.sys_reset_l, self.rcin_l)
    }
}

impl<SUS, RST, RCIN> ChipsetHooks for IntelX86Chipset<SUS, RST, RCIN>
where
    SUS: OutputPin,
    RST: StatefulOutputPin,
    RCIN: OutputPin,
{
    fn set_pmic_slp_sus(&mut self, level: bool) {
        if self.pmic_slp_sus_l.set_state(PinState::from(level)).is_err() {
            warn!("Failed to drive PMIC_SLP_SUS_L");
        }
    }

    fn sys_reset_asserted(&mut self) -> bool {
        // An unreadable line is treated as released so a reset is still attempted.
        self.sys_reset_l.is_set_low().unwrap_or(false)
    }

    fn set_sys_reset(&mut self, asserted: bool) {
        if self.sys_reset_l.set_state(PinState::from(!asserted)).is_err() {
            warn!("Failed to drive SYS_RESET_L");
        }
    }

    fn set_rcin(&mut self, asserted: bool) {
        if self.rcin_l.set_state(PinState::from(!asserted)).is_err() {
            warn!("Failed to drive RCIN_L");
        }
    }
}
