//! Signal pass-through from the power rails to the PCH and PMIC.

use embedded_hal::digital::{InputPin, PinState, StatefulOutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::chipset::ChipsetHooks;
use crate::signal::Signals;
use crate::state::PowerState;

fn going_down(state: PowerState) -> bool {
    matches!(state, PowerState::G3 | PowerState::S5G3)
}

/// Mirrors the rail power-good input onto the PCH's RSMRST_L.
///
/// The PCH may not react immediately to power changes, so this is evaluated
/// around every state-machine step rather than on transitions only.
///
/// Reads the raw rail-good pin, bypassing the [`SignalGate`](crate::signal::SignalGate)
/// debounce, so RSMRST_L can move a sample before the gate's snapshot does.
pub struct RailPassThrough<I, O> {
    rail_good: I,
    rsmrst_l: O,
    settle_ms: u32,
}

impl<I: InputPin, O: StatefulOutputPin> RailPassThrough<I, O> {
    pub fn new(rail_good: I, rsmrst_l: O, settle_ms: u32) -> Self {
        Self {
            rail_good,
            rsmrst_l,
            settle_ms,
        }
    }

    /// Drive the output to match the input if they disagree.
    ///
    /// Returns the new output level if it changed.
    pub async fn handle<D, H>(&mut self, state: PowerState, delay: &mut D, hooks: &mut H) -> Option<bool>
    where
        D: DelayNs,
        H: ChipsetHooks + ?Sized,
    {
        if going_down(state) {
            return None;
        }

        let Ok(level_in) = self.rail_good.is_high() else {
            warn!("Failed to read RSMRST_L_PGOOD");
            return None;
        };
        let Ok(level_out) = self.rsmrst_l.is_set_high() else {
            warn!("Failed to read back RSMRST_L");
            return None;
        };

        if level_in == level_out {
            return None;
        }

        hooks.before_rsmrst(level_in);

        // Power signals must be high for a while before RSMRST is released.
        if level_in {
            delay.delay_ms(self.settle_ms).await;
        }

        if self.rsmrst_l.set_state(PinState::from(level_in)).is_err() {
            warn!("Failed to drive RSMRST_L");
            return None;
        }
        info!("RSMRST: {}", level_in);
        Some(level_in)
    }

    pub fn output_level(&mut self) -> Option<bool> {
        self.rsmrst_l.is_set_high().ok()
    }
}

/// Mimic the PCH's SLP_SUS request on the PMIC line for all states except
/// when the chipset is down or going down.
pub fn mirror_suspend_line<H>(state: PowerState, signals: Signals, hooks: &mut H) -> Option<bool>
where
    H: ChipsetHooks + ?Sized,
{
    if going_down(state) {
        return None;
    }

    let level = signals.has(Signals::PCH_SLP_SUS_DEASSERTED);
    hooks.set_pmic_slp_sus(level);
    Some(level)
}
