//! Chipset power states.

use bitflags::bitflags;

/// Stable states and the transitional states between them.
///
/// A transitional state carries the one-shot side effects of crossing an
/// edge. It has exactly one successor computed unconditionally on its single
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Mechanically off.
    G3,
    S5,
    S3,
    S0,
    /// Low-power idle.
    S0ix,

    G3S5,
    S5S3,
    S3S0,
    S0S3,
    S3S5,
    S5G3,
    S0S0ix,
    S0ixS0,
    /// Rail loss while in low-power idle.
    S0ixS3,
}

impl PowerState {
    pub const STABLE: [PowerState; 5] = [
        PowerState::G3,
        PowerState::S5,
        PowerState::S3,
        PowerState::S0,
        PowerState::S0ix,
    ];

    pub const ALL: [PowerState; 14] = [
        PowerState::G3,
        PowerState::S5,
        PowerState::S3,
        PowerState::S0,
        PowerState::S0ix,
        PowerState::G3S5,
        PowerState::S5S3,
        PowerState::S3S0,
        PowerState::S0S3,
        PowerState::S3S5,
        PowerState::S5G3,
        PowerState::S0S0ix,
        PowerState::S0ixS0,
        PowerState::S0ixS3,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PowerState::G3 => "G3",
            PowerState::S5 => "S5",
            PowerState::S3 => "S3",
            PowerState::S0 => "S0",
            PowerState::S0ix => "S0ix",
            PowerState::G3S5 => "G3->S5",
            PowerState::S5S3 => "S5->S3",
            PowerState::S3S0 => "S3->S0",
            PowerState::S0S3 => "S0->S3",
            PowerState::S3S5 => "S3->S5",
            PowerState::S5G3 => "S5->G3",
            PowerState::S0S0ix => "S0->S0ix",
            PowerState::S0ixS0 => "S0ix->S0",
            PowerState::S0ixS3 => "S0ix->S3",
        }
    }

    pub const fn is_transitional(self) -> bool {
        !matches!(
            self,
            PowerState::G3 | PowerState::S5 | PowerState::S3 | PowerState::S0 | PowerState::S0ix
        )
    }

    /// States a single evaluation of `self` may produce.
    ///
    /// Stable states list themselves first. Transitional states never list
    /// themselves.
    pub const fn successors(self) -> &'static [PowerState] {
        use PowerState::*;
        match self {
            G3 => &[G3, G3S5],
            S5 => &[S5, S5S3, S5G3, G3S5],
            S3 => &[S3, S3S0, S3S5],
            S0 => &[S0, S0S3, S0S0ix],
            S0ix => &[S0ix, S0ixS0, S0ixS3],
            G3S5 => &[S5, G3],
            S5S3 => &[S3, S5G3],
            S3S0 => &[S0, S3S5],
            S0S3 => &[S3],
            S3S5 => &[S5],
            S5G3 => &[G3],
            S0S0ix => &[S0ix],
            S0ixS0 => &[S0],
            S0ixS3 => &[S3],
        }
    }

    pub fn may_step_to(self, next: PowerState) -> bool {
        self.successors().contains(&next)
    }

    /// Depth of the state on the power ladder; higher is more powered.
    ///
    /// Transitional states rank with the lower of their two endpoints.
    pub const fn rank(self) -> u8 {
        match self {
            PowerState::G3 | PowerState::G3S5 | PowerState::S5G3 => 0,
            PowerState::S5 | PowerState::S5S3 | PowerState::S3S5 => 1,
            PowerState::S3
            | PowerState::S3S0
            | PowerState::S0S3
            | PowerState::S0ixS3 => 2,
            PowerState::S0ix | PowerState::S0S0ix | PowerState::S0ixS0 => 3,
            PowerState::S0 => 4,
        }
    }

    /// Chipset-state bits that all must be accepted for `self` to match.
    pub const fn chipset_mask(self) -> ChipsetStateMask {
        use PowerState::*;
        match self {
            G3 => ChipsetStateMask::HARD_OFF,
            // In between hard and soft off; match only if the caller accepts both.
            G3S5 | S5G3 => ChipsetStateMask::HARD_OFF.union(ChipsetStateMask::SOFT_OFF),
            S5 => ChipsetStateMask::SOFT_OFF,
            S5S3 | S3S5 => ChipsetStateMask::SOFT_OFF.union(ChipsetStateMask::SUSPEND),
            S3 => ChipsetStateMask::SUSPEND,
            S3S0 | S0S3 => ChipsetStateMask::SUSPEND.union(ChipsetStateMask::ON),
            S0 => ChipsetStateMask::ON,
            S0ix => ChipsetStateMask::STANDBY,
            S0S0ix | S0ixS0 => ChipsetStateMask::ON.union(ChipsetStateMask::STANDBY),
            S0ixS3 => ChipsetStateMask::STANDBY.union(ChipsetStateMask::SUSPEND),
        }
    }

    /// True if `self` is within the chipset states accepted by `accept`.
    pub fn in_chipset_state(self, accept: ChipsetStateMask) -> bool {
        accept.contains(self.chipset_mask())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChipsetStateMask: u8 {
        const HARD_OFF = 1 << 0;
        const SOFT_OFF = 1 << 1;
        const SUSPEND = 1 << 2;
        const ON = 1 << 3;
        const STANDBY = 1 << 4;

        const ANY_OFF = Self::HARD_OFF.bits() | Self::SOFT_OFF.bits();
        const ANY_SUSPEND = Self::SUSPEND.bits() | Self::STANDBY.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChipsetStateMask {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ChipsetStateMask({=u8:#x})", self.bits())
    }
}

/// Host-reported sleep intent, used to gate low-power idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostSleepEvent {
    S3Suspend,
    S3Resume,
    S0ixSuspend,
    #[default]
    S0ixResume,
}
