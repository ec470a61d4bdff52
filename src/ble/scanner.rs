//! BLE GAP scanner - finds the configured LED display.
//!
//! Uses the SoftDevice Central-role scanning API.  Advertisements are
//! matched against the configured address and name; the scan stops at the
//! first match or when the scan window closes.

use crate::ble::DiscoveredDevice;
use crate::error::{BleError, Error};
use defmt::{info, warn};
use embassy_time::{Duration, Instant};
use ledlink::ble::adv_parser::{contains_led_service_uuid, extract_device_name, is_target_device};
use ledlink::config::BLE_SCAN_DURATION_SECS;
use nrf_softdevice::ble::{central, Address};
use nrf_softdevice::Softdevice;

/// Scan for up to `BLE_SCAN_DURATION_SECS` seconds for the display.
pub async fn find_display(sd: &Softdevice) -> Result<DiscoveredDevice, Error> {
    info!("BLE scan starting ({} s window)", BLE_SCAN_DURATION_SECS);

    let config = central::ScanConfig {
        // Active scan to retrieve scan-response data (device names).
        active: true,
        ..Default::default()
    };

    // We set up a deadline so the scan doesn't run forever.
    let deadline = Instant::now() + Duration::from_secs(BLE_SCAN_DURATION_SECS);

    // The SoftDevice scan callback receives each advertisement.
    // Return None to keep scanning, Some(..) to stop.
    let scan_result = central::scan(sd, &config, |params| {
        if Instant::now() > deadline {
            return Some(None);
        }

        let data =
            unsafe { core::slice::from_raw_parts(params.data.p_data, params.data.len as usize) };
        let address = Address::from_raw(params.peer_addr);

        if !is_target_device(&address.bytes(), data) {
            return None;
        }

        let device = DiscoveredDevice {
            address,
            name: extract_device_name(data),
            rssi: params.rssi,
        };
        info!(
            "Found display: {} (RSSI {}, LED service advertised: {})",
            device.name.as_str(),
            device.rssi,
            contains_led_service_uuid(data)
        );
        Some(Some(device))
    })
    .await;

    match scan_result {
        Ok(Some(device)) => Ok(device),
        Ok(None) => {
            warn!("BLE scan window closed without finding the display");
            Err(Error::DisplayNotFound)
        }
        Err(_) => {
            warn!("BLE scan ended with error");
            Err(BleError::ScanFailed.into())
        }
    }
}
