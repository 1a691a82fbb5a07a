//! Forced shutdown by simulated power-button press.
//!
//! Sending a reset command to the PMIC would power off the EC as well, so the
//! chipset is forced off by holding the power button instead. The press is
//! latched until the state machine reaches S5 (or G3) and releases it.

use crate::state::{ChipsetStateMask, PowerState};

/// Button subsystem used to fake a long power-button press to the PCH.
pub trait PowerButton {
    fn assert_long_press(&mut self);
    fn release_press(&mut self);
}

/// `forcing_shutdown`: a forced shutdown is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShutdownLatch {
    engaged: bool,
}

impl ShutdownLatch {
    pub const fn new() -> Self {
        Self { engaged: false }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Start holding the button unless the chipset is already hard off.
    ///
    /// Does not change the power state; the next evaluation observes the
    /// chipset dropping and performs the downward transition. Returns true if
    /// this call engaged the latch.
    pub fn engage<B: PowerButton + ?Sized>(&mut self, state: PowerState, button: &mut B) -> bool {
        if state.in_chipset_state(ChipsetStateMask::HARD_OFF) {
            return false;
        }
        if self.engaged {
            return false;
        }

        self.engaged = true;
        button.assert_long_press();
        true
    }

    /// Let go of the button if it is held. Returns true if it was.
    pub fn release<B: PowerButton + ?Sized>(&mut self, button: &mut B) -> bool {
        if !self.engaged {
            return false;
        }

        self.engaged = false;
        button.release_press();
        true
    }
}
