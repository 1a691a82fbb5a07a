use core::ops::Range;

use crate::config::{CONFIG_FLASH_SIZE, FLASH_SIZE};

/// The size of a page in bytes
pub const PAGE_SIZE: u32 = 0x0000_1000;

const _: () = assert!(CONFIG_FLASH_SIZE % PAGE_SIZE as usize == 0);
const _: () = assert!(CONFIG_FLASH_SIZE < FLASH_SIZE);

/// Flash range, relative to the start of flash, used by the config manager.
pub fn get_config_range() -> Range<u32> {
    let start = (FLASH_SIZE - CONFIG_FLASH_SIZE) as u32;
    let end = FLASH_SIZE as u32;
    start..end
}
