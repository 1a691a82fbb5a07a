use defmt::{debug, error, info};
use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel;
use embassy_sync::mutex::Mutex;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{SerializationError, fetch_item, store_item};
use serde::{Deserialize, Serialize};

use crate::flash_layout::get_config_range;
use crate::{MFlashType, config::*};

#[derive(Debug, defmt::Format)]
pub enum ConfigError {
    Flash,
    Storage,
}

impl From<embassy_rp::flash::Error> for ConfigError {
    fn from(_: embassy_rp::flash::Error) -> Self {
        ConfigError::Flash
    }
}

impl From<sequential_storage::Error<embassy_rp::flash::Error>> for ConfigError {
    fn from(_: sequential_storage::Error<embassy_rp::flash::Error>) -> Self {
        ConfigError::Storage
    }
}

impl From<SerializationError> for ConfigError {
    fn from(_: SerializationError) -> Self {
        ConfigError::Storage
    }
}

#[derive(defmt::Format)]
pub enum ConfigManagerEvents {
    S0ix(bool),
    ChargerTries(u32),
    S5InactivityTimeoutMs(u32),
    AutoPowerOn(bool),
}

pub type ConfigManagerChannelType =
    channel::Channel<CriticalSectionRawMutex, ConfigManagerEvents, 8>;
pub static CONFIG_MANAGER_EVENT_CHANNEL: ConfigManagerChannelType = channel::Channel::new();

// Configuration manager using sequential-storage
pub struct ConfigManager {
    flash: &'static MFlashType<'static>,
    data_buffer: [u8; 128],
}

impl ConfigManager {
    fn new(flash: &'static MFlashType<'static>) -> Self {
        Self {
            flash,
            data_buffer: [0u8; 128],
        }
    }

    /// Store a serializable value
    pub async fn set<T>(&mut self, key: u16, value: &T) -> Result<(), ConfigError>
    where
        T: for<'de> Deserialize<'de> + Serialize + for<'b> sequential_storage::map::Value<'b>,
    {
        debug!("Storing item with key: {}", key);

        let mut flash = self.flash.lock().await;

        store_item(
            &mut *flash,
            get_config_range(),
            &mut NoCache::new(),
            &mut self.data_buffer,
            &key,
            value,
        )
        .await
        .map_err(|e| {
            error!(
                "Failed to store item with key: {}: {}",
                key,
                defmt::Debug2Format(&e)
            );
            ConfigError::from(e)
        })
    }

    // Retrieve a value or None if not found
    pub async fn get<T>(&mut self, key: u16) -> Result<Option<T>, ConfigError>
    where
        T: for<'de> Deserialize<'de> + Serialize + for<'b> sequential_storage::map::Value<'b>,
    {
        debug!("Fetching item with key: {}", key);

        let mut flash = self.flash.lock().await;

        let result = fetch_item(
            &mut *flash,
            get_config_range(),
            &mut NoCache::new(),
            &mut self.data_buffer,
            &key,
        )
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(
                    "Failed to fetch item with key: {}: {}",
                    key,
                    defmt::Debug2Format(&e)
                );
                Err(ConfigError::from(e))
            }
        }
    }

    async fn get_or<T>(&mut self, key: u16, default: T) -> T
    where
        T: for<'de> Deserialize<'de> + Serialize + for<'b> sequential_storage::map::Value<'b>,
    {
        self.get::<T>(key).await.unwrap_or(None).unwrap_or(default)
    }
}

/// Runtime configuration values, read from the flash storage and stored here
/// to prevent multiple reads from the flash.
struct RuntimeConfig {
    pub s0ix: bool,
    pub charger_tries: u32,
    pub s5_inactivity_timeout_ms: u32,
    pub auto_power_on: bool,
}

impl RuntimeConfig {
    const fn new() -> Self {
        RuntimeConfig {
            s0ix: DEFAULT_S0IX,
            charger_tries: DEFAULT_CHARGER_TRIES,
            s5_inactivity_timeout_ms: DEFAULT_S5_INACTIVITY_TIMEOUT,
            auto_power_on: DEFAULT_AUTO_POWER_ON,
        }
    }
}

static RUNTIME_CONFIG: Mutex<CriticalSectionRawMutex, RuntimeConfig> =
    Mutex::new(RuntimeConfig::new());

pub async fn get_s0ix() -> bool {
    RUNTIME_CONFIG.lock().await.s0ix
}
pub async fn get_charger_tries() -> u32 {
    RUNTIME_CONFIG.lock().await.charger_tries
}
pub async fn get_s5_inactivity_timeout_ms() -> u32 {
    RUNTIME_CONFIG.lock().await.s5_inactivity_timeout_ms
}
pub async fn get_auto_power_on() -> bool {
    RUNTIME_CONFIG.lock().await.auto_power_on
}
pub async fn set_s0ix(value: bool) {
    RUNTIME_CONFIG.lock().await.s0ix = value;
    CONFIG_MANAGER_EVENT_CHANNEL
        .send(ConfigManagerEvents::S0ix(value))
        .await;
}
pub async fn set_charger_tries(value: u32) {
    RUNTIME_CONFIG.lock().await.charger_tries = value;
    CONFIG_MANAGER_EVENT_CHANNEL
        .send(ConfigManagerEvents::ChargerTries(value))
        .await;
}
pub async fn set_s5_inactivity_timeout_ms(value: u32) {
    RUNTIME_CONFIG.lock().await.s5_inactivity_timeout_ms = value;
    CONFIG_MANAGER_EVENT_CHANNEL
        .send(ConfigManagerEvents::S5InactivityTimeoutMs(value))
        .await;
}
pub async fn set_auto_power_on(value: bool) {
    RUNTIME_CONFIG.lock().await.auto_power_on = value;
    CONFIG_MANAGER_EVENT_CHANNEL
        .send(ConfigManagerEvents::AutoPowerOn(value))
        .await;
}

/// Load the persisted values into the runtime configuration.
///
/// Must complete before the chipset task reads its configuration.
pub async fn init_config_manager(flash: &'static MFlashType<'static>) -> ConfigManager {
    let mut config_manager = ConfigManager::new(flash);

    let s0ix = config_manager.get_or(S0IX_CONFIG_KEY, DEFAULT_S0IX).await;
    debug!("Received S0ix: {}", s0ix);
    let charger_tries = config_manager
        .get_or(CHARGER_TRIES_CONFIG_KEY, DEFAULT_CHARGER_TRIES)
        .await;
    debug!("Received charger tries: {}", charger_tries);
    let s5_inactivity_timeout_ms = config_manager
        .get_or(
            S5_INACTIVITY_TIMEOUT_CONFIG_KEY,
            DEFAULT_S5_INACTIVITY_TIMEOUT,
        )
        .await;
    debug!(
        "Received S5 inactivity timeout: {}",
        s5_inactivity_timeout_ms
    );
    let auto_power_on = config_manager
        .get_or(AUTO_POWER_ON_CONFIG_KEY, DEFAULT_AUTO_POWER_ON)
        .await;
    debug!("Received auto power on: {}", auto_power_on);

    {
        let mut runtime_config = RUNTIME_CONFIG.lock().await;
        runtime_config.s0ix = s0ix;
        runtime_config.charger_tries = charger_tries;
        runtime_config.s5_inactivity_timeout_ms = s5_inactivity_timeout_ms;
        runtime_config.auto_power_on = auto_power_on;
    }
    info!("Runtime configuration updated");
    config_manager
}

#[task]
pub async fn config_manager_task(mut config_manager: ConfigManager) {
    info!("Config manager task started");

    let receiver = CONFIG_MANAGER_EVENT_CHANNEL.receiver();

    loop {
        let event = receiver.receive().await;
        debug!("Received config manager event: {:?}", event);

        // Failures are logged by the manager; the runtime value still applies
        // until the next boot.
        let _ = match event {
            ConfigManagerEvents::S0ix(value) => config_manager.set(S0IX_CONFIG_KEY, &value).await,
            ConfigManagerEvents::ChargerTries(value) => {
                config_manager
                    .set(CHARGER_TRIES_CONFIG_KEY, &value)
                    .await
            }
            ConfigManagerEvents::S5InactivityTimeoutMs(value) => {
                config_manager
                    .set(S5_INACTIVITY_TIMEOUT_CONFIG_KEY, &value)
                    .await
            }
            ConfigManagerEvents::AutoPowerOn(value) => {
                config_manager
                    .set(AUTO_POWER_ON_CONFIG_KEY, &value)
                    .await
            }
        };
    }
}
