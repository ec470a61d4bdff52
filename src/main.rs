//! ledlink firmware - BLE central driving an LED_BLE matrix display.
//!
//! Runs on an nRF52840 with the S140 SoftDevice: finds the display,
//! connects, and exchanges command frames with it.

#![no_std]
#![no_main]

mod ble;
mod error;
mod script;

use core::mem;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use ledlink::config::BLE_ATT_MTU;
use nrf_softdevice::{raw, Softdevice};
use {defmt_rtt as _, panic_probe as _};

/// GAP device name of this central.
const DEVICE_NAME: &[u8] = b"ledlink";

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice) -> ! {
    ble::connection::ble_task(sd).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ledlink starting...");

    // The SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let _p = embassy_nrf::init(config);

    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: BLE_ATT_MTU,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 0,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    let sd = Softdevice::enable(&sd_config);
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(ble_task(sd)));

    info!("ledlink running");
}
