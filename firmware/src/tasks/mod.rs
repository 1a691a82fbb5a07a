pub mod chipset;
pub mod config_manager;
pub mod host_interface;
pub mod power_button;
pub mod signal_monitor;
pub mod watchdog_feeder;
