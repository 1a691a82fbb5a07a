use chipset_power::config::{CHARGER_INITIALIZED_TRIES, DEFAULT_S5_INACTIVITY_TIMEOUT_MS};

pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

// The last 64 kB of flash hold the persisted configuration.
pub const CONFIG_FLASH_SIZE: usize = 64 * 1024;

// How often the signal monitor samples the chipset power signals.
pub const SIGNAL_MONITOR_INTERVAL_MS: u64 = 2; // ms

// How often the chipset task evaluates the power state machine.
pub const CHIPSET_TICK_MS: u64 = 10; // ms

// Physical power button must be held this long to request a hard off.
pub const POWER_BUTTON_HARD_OFF_MS: u64 = 4_000; // ms
pub const POWER_BUTTON_DEBOUNCE_MS: u64 = 30; // ms

pub const WATCHDOG_TIMEOUT_MS: u64 = 8_000; // ms
pub const WATCHDOG_FEED_INTERVAL_MS: u64 = 1_000; // ms

pub const S0IX_CONFIG_KEY: u16 = 0x2001;
pub const DEFAULT_S0IX: bool = false;

pub const CHARGER_TRIES_CONFIG_KEY: u16 = 0x2002;
pub const DEFAULT_CHARGER_TRIES: u32 = CHARGER_INITIALIZED_TRIES;

// Zero disables the timeout.
pub const S5_INACTIVITY_TIMEOUT_CONFIG_KEY: u16 = 0x2003;
pub const DEFAULT_S5_INACTIVITY_TIMEOUT: u32 = DEFAULT_S5_INACTIVITY_TIMEOUT_MS;

// Power the host on as soon as the controller cold boots.
pub const AUTO_POWER_ON_CONFIG_KEY: u16 = 0x2004;
pub const DEFAULT_AUTO_POWER_ON: bool = false;

pub const FW_VERSION: [u8; 4] = [0, 1, 0, 0xff];
