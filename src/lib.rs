//! Chipset power sequencing for an embedded controller.
//!
//! The [`PowerSequencer`] walks the host through `G3 -> S5 -> S3 -> S0` (and
//! `S0ix` where supported) in lock-step with the rail-good and sleep signals
//! it samples, mirrors reset and suspend lines to the PCH and PMIC, and tells
//! dependent subsystems about each transition.
//!
//! The crate is `no_std` and hardware agnostic. Pins come in through
//! `embedded-hal`, sleeping through `embedded-hal-async`, and everything else
//! through the traits in [`chipset`], [`hooks`] and [`shutdown`].
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod chipset;
pub mod config;
pub mod hooks;
pub mod passthrough;
pub mod reset;
pub mod retry;
pub mod sequencer;
pub mod shutdown;
pub mod signal;
pub mod state;

pub use chipset::{Board, Charger, ChipsetHooks, Clock, IntelX86Chipset, Platform, WirelessState};
pub use config::ChipsetConfig;
pub use hooks::{HookEvent, HookRegistry, HookSubscriber, LifecycleNotifier};
pub use passthrough::RailPassThrough;
pub use reset::{ResetError, ResetKind};
pub use retry::{RetryError, RetryPolicy};
pub use sequencer::{BootKind, BootLevels, Error, PowerSequencer, SequencerState, SignalWaitError};
pub use shutdown::{PowerButton, ShutdownLatch};
pub use signal::{PowerSignal, SignalGate, SignalLatch, SignalSnapshot, SignalSource, Signals};
pub use state::{ChipsetStateMask, HostSleepEvent, PowerState};
