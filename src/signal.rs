//! Power signal sampling.
//!
//! The [`SignalGate`] reads every configured power signal exactly once per
//! evaluation and hands the state machine a stable [`SignalSnapshot`]. Reads
//! that fail keep the last known-stable level; a power sequencer must never
//! stall on a transient bus error.

use core::convert::Infallible;
use core::sync::atomic::Ordering;

use bitflags::bitflags;
use portable_atomic::AtomicU32;

/// Power signals observed by the sequencer, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSignal {
    RsmrstPgood,
    SlpS0,
    SlpS3,
    SlpS4,
    SlpSus,
    PmicDpwrok,
}

pub const SIGNAL_COUNT: usize = 6;

impl PowerSignal {
    pub const ALL: [PowerSignal; SIGNAL_COUNT] = [
        PowerSignal::RsmrstPgood,
        PowerSignal::SlpS0,
        PowerSignal::SlpS3,
        PowerSignal::SlpS4,
        PowerSignal::SlpSus,
        PowerSignal::PmicDpwrok,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn mask(self) -> Signals {
        Signals::from_bits_retain(1 << self.index())
    }
}

bitflags! {
    /// Asserted-ness of every power signal at one instant.
    ///
    /// Bits are logical: a set bit means the condition in the name holds,
    /// after polarity has been applied.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Signals: u32 {
        const RSMRST_L_PGOOD = 1 << 0;
        const SLP_S0_DEASSERTED = 1 << 1;
        const SLP_S3_DEASSERTED = 1 << 2;
        const SLP_S4_DEASSERTED = 1 << 3;
        const SLP_SUS_DEASSERTED = 1 << 4;
        const PMIC_DPWROK = 1 << 5;

        const PGOOD_ALL_CORE = Self::RSMRST_L_PGOOD.bits();
        const ALL_PM_SLP = Self::SLP_S3_DEASSERTED.bits()
            | Self::SLP_S4_DEASSERTED.bits()
            | Self::SLP_SUS_DEASSERTED.bits();
        const ALL_S0 = Self::PGOOD_ALL_CORE.bits() | Self::ALL_PM_SLP.bits();
        const PCH_SLP_SUS_DEASSERTED = Self::SLP_SUS_DEASSERTED.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Signals {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Signals({=u32:#x})", self.bits())
    }
}

pub type SignalSnapshot = Signals;

impl Signals {
    pub fn has(&self, want: Signals) -> bool {
        self.contains(want)
    }

    pub fn level(&self, signal: PowerSignal) -> bool {
        self.contains(signal.mask())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalTransport {
    Gpio,
    VirtualWire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalInfo {
    pub signal: PowerSignal,
    pub polarity: Polarity,
    pub transport: SignalTransport,
    pub name: &'static str,
    /// Consecutive identical samples required before a change is accepted.
    /// Zero and one both mean "accept immediately".
    pub debounce: u8,
}

impl SignalInfo {
    pub const fn new(signal: PowerSignal, name: &'static str) -> Self {
        Self {
            signal,
            polarity: Polarity::ActiveHigh,
            transport: SignalTransport::Gpio,
            name,
            debounce: 0,
        }
    }

    pub const fn active_low(mut self) -> Self {
        self.polarity = Polarity::ActiveLow;
        self
    }

    pub const fn over(mut self, transport: SignalTransport) -> Self {
        self.transport = transport;
        self
    }

    pub const fn debounced(mut self, samples: u8) -> Self {
        self.debounce = samples;
        self
    }

    fn apply_polarity(&self, raw: bool) -> bool {
        match self.polarity {
            Polarity::ActiveHigh => raw,
            Polarity::ActiveLow => !raw,
        }
    }
}

pub type SignalTable = [SignalInfo; SIGNAL_COUNT];

/// Signal table for the Intel x86 family. Must match the order of
/// [`PowerSignal::ALL`].
pub const fn intel_x86_signals(sleep_transport: SignalTransport) -> SignalTable {
    [
        SignalInfo::new(PowerSignal::RsmrstPgood, "RSMRST_L_PGOOD"),
        SignalInfo::new(PowerSignal::SlpS0, "SLP_S0_DEASSERTED"),
        SignalInfo::new(PowerSignal::SlpS3, "SLP_S3_DEASSERTED").over(sleep_transport),
        SignalInfo::new(PowerSignal::SlpS4, "SLP_S4_DEASSERTED").over(sleep_transport),
        SignalInfo::new(PowerSignal::SlpSus, "SLP_SUS_DEASSERTED"),
        SignalInfo::new(PowerSignal::PmicDpwrok, "PMIC_DPWROK"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalError {
    /// The transport failed to deliver a level this time.
    Bus,
    /// The source cannot carry this signal over the requested transport.
    Unsupported,
}

/// Raw access to signal levels, GPIO or virtual wire.
pub trait SignalSource {
    /// Electrical level of `info`, before polarity is applied.
    fn read_signal(&mut self, info: &SignalInfo) -> Result<bool, SignalError>;

    fn enable_signal_interrupt(&mut self, _info: &SignalInfo) -> Result<(), SignalError> {
        Ok(())
    }
}

/// Raw signal levels published by interrupt or monitor tasks.
///
/// All levels live in one word, so a reader never observes half of an update.
pub struct SignalLatch {
    levels: AtomicU32,
}

impl SignalLatch {
    pub const fn new() -> Self {
        Self {
            levels: AtomicU32::new(0),
        }
    }

    pub fn set(&self, signal: PowerSignal, level: bool) {
        let bit = 1 << signal.index();
        if level {
            self.levels.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.levels.fetch_and(!bit, Ordering::AcqRel);
        }
    }

    pub fn get(&self, signal: PowerSignal) -> bool {
        self.levels.load(Ordering::Acquire) & (1 << signal.index()) != 0
    }

    pub fn store(&self, levels: Signals) {
        self.levels.store(levels.bits(), Ordering::Release);
    }

    pub fn load(&self) -> Signals {
        Signals::from_bits_retain(self.levels.load(Ordering::Acquire))
    }

    /// An embedded-hal input view of one latched signal.
    pub fn input(&self, signal: PowerSignal) -> LatchedSignal<'_> {
        LatchedSignal {
            latch: self,
            signal,
        }
    }
}

impl Default for SignalLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for &SignalLatch {
    fn read_signal(&mut self, info: &SignalInfo) -> Result<bool, SignalError> {
        Ok(self.get(info.signal))
    }
}

pub struct LatchedSignal<'a> {
    latch: &'a SignalLatch,
    signal: PowerSignal,
}

impl embedded_hal::digital::ErrorType for LatchedSignal<'_> {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for LatchedSignal<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.latch.get(self.signal))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.latch.get(self.signal))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Debounce {
    candidate: bool,
    count: u8,
}

/// Reads and debounces power signals into snapshots.
pub struct SignalGate<S> {
    source: S,
    table: SignalTable,
    debounce: [Debounce; SIGNAL_COUNT],
    stable: Signals,
}

impl<S: SignalSource> SignalGate<S> {
    pub fn new(source: S, table: SignalTable) -> Self {
        Self {
            source,
            table,
            debounce: [Debounce::default(); SIGNAL_COUNT],
            stable: Signals::empty(),
        }
    }

    /// Enable edge interrupts and seed the stable levels, bypassing debounce.
    pub fn init(&mut self) -> Signals {
        for info in self.table.iter() {
            if let Err(e) = self.source.enable_signal_interrupt(info) {
                warn!("Failed to enable interrupt for {}: {:?}", info.name, e);
            }
            match self.source.read_signal(info) {
                Ok(raw) => self.stable.set(info.signal.mask(), info.apply_polarity(raw)),
                Err(e) => warn!("Failed to read {} at init: {:?}", info.name, e),
            }
        }
        debug!("Initial power signals: {:#x}", self.stable.bits());
        self.stable
    }

    /// Read every signal once and return the resulting stable snapshot.
    pub fn sample(&mut self) -> SignalSnapshot {
        let previous = self.stable;

        for (info, debounce) in self.table.iter().zip(self.debounce.iter_mut()) {
            let mask = info.signal.mask();
            let level = match self.source.read_signal(info) {
                Ok(raw) => info.apply_polarity(raw),
                Err(e) => {
                    warn!(
                        "Failed to read {}: {:?}, holding {}",
                        info.name,
                        e,
                        previous.contains(mask)
                    );
                    continue;
                }
            };

            if level == self.stable.contains(mask) {
                debounce.count = 0;
                continue;
            }

            if debounce.count > 0 && debounce.candidate == level {
                debounce.count = debounce.count.saturating_add(1);
            } else {
                debounce.candidate = level;
                debounce.count = 1;
            }

            if debounce.count >= info.debounce.max(1) {
                self.stable.set(mask, level);
                debounce.count = 0;
            }
        }

        for info in self.table.iter() {
            let mask = info.signal.mask();
            if previous.contains(mask) != self.stable.contains(mask) {
                info!("{}: {}", info.name, self.stable.contains(mask));
            }
        }

        self.stable
    }

    /// The snapshot produced by the most recent sample, without reading.
    pub fn last(&self) -> SignalSnapshot {
        self.stable
    }

    pub fn info(&self, signal: PowerSignal) -> &SignalInfo {
        &self.table[signal.index()]
    }

    /// Names of the signals in `mask`, in table order.
    pub fn names(&self, mask: Signals) -> impl Iterator<Item = &'static str> + '_ {
        self.table
            .iter()
            .filter(move |info| mask.contains(info.signal.mask()))
            .map(|info| info.name)
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
