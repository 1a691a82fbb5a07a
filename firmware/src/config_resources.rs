// Provide a mapping for the controller GPIO pins

//
//| GPIO # | Name           | Description                                                  |
//| ------ | -------------- | ------------------------------------------------------------ |
//| 2      | RSMRST_PGOOD   | Suspend rails power good from the PMIC. Active high.         |
//| 3      | SLP_S0_L       | S0ix sleep indication from the PCH. Active low.              |
//| 4      | SLP_S3_L       | S3 sleep indication from the PCH. Active low.                |
//| 5      | SLP_S4_L       | S4 sleep indication from the PCH. Active low.                |
//| 6      | SLP_SUS_L      | Deep Sx indication from the PCH. Active low.                 |
//| 7      | PMIC_DPWROK    | Deep Sx rails power good from the PMIC. Active high.         |
//| 8      | RSMRST_L       | Resume reset output to the PCH. Active low.                  |
//| 9      | PMIC_SLP_SUS_L | Suspend rail enable output to the PMIC. Active low.          |
//| 10     | SYS_RESET_L    | Cold reset output to the PCH. Active low.                    |
//| 11     | RCIN_L         | Warm reset output to the PCH. Active low.                    |
//| 12     | PROCHOT_L      | CPU throttle output. Active low.                             |
//| 13     | BL_EN          | Backlight enable. Active high.                               |
//| 14     | WLAN_EN        | Wireless module enable. Active high.                         |
//| 15     | PWRBTN_OUT_L   | Power button output to the PCH. Active low.                  |
//| 16     | PWRBTN_IN_L    | Input from the physical power button. Active low.            |
//| 17     | CHG_OK         | Charger initialized and supplying the system. Active high.   |
//| 18     | BATT_LOW_L     | Battery too low to power on. Active low.                     |
//| 25     | PWR_LED        | Power LED. Active high.                                      |
//| 26     | I2C1_SDA       | Host command interface data.                                 |
//| 27     | I2C1_SCL       | Host command interface clock.                                |

use assign_resources::assign_resources;
use embassy_rp::peripherals;

assign_resources! {
  /// GPIO pins for the controller
  chipset_signals: ChipsetSignalResources {
    rsmrst_pgood: PIN_2,
    slp_s0_l: PIN_3,
    slp_s3_l: PIN_4,
    slp_s4_l: PIN_5,
    slp_sus_l: PIN_6,
    pmic_dpwrok: PIN_7,
  },
  chipset_outputs: ChipsetOutputResources {
    rsmrst_l: PIN_8,
    pmic_slp_sus_l: PIN_9,
    sys_reset_l: PIN_10,
    rcin_l: PIN_11,
    prochot_l: PIN_12,
    bl_en: PIN_13,
    wlan_en: PIN_14,
  },
  charger: ChargerResources {
    chg_ok: PIN_17,
    batt_low_l: PIN_18,
  },
  power_button: PowerButtonResources {
    pin: PIN_15,
  },
  power_button_input: PowerButtonInputResources {
    pin: PIN_16,
  },
  status_led: StatusLedResources {
    pin: PIN_25,
  },
  host_interface: HostInterfaceResources {
    i2c: I2C1,
    sda: PIN_26,
    scl: PIN_27,
  },
}
