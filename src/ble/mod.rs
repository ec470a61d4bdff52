//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Central** role:
//!
//! 1. **Scanner** - finds the configured LED display by address and name.
//! 2. **LED Client** - performs GATT discovery of the LED service, enables
//!    notifications on the notify characteristic and writes frames to the
//!    write characteristic.
//! 3. **Connection Manager** - connects, runs the notification loop and the
//!    command session side by side, and reconnects after link loss.
//!
//! Notifications travel from the GATT callback to the session through
//! [`NOTIFICATIONS`].

pub mod connection;
pub mod led_client;
pub mod scanner;

use defmt::Format;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::String;
use ledlink::config::NOTIFICATION_QUEUE_DEPTH;
use ledlink::protocol::NotificationQueue;
use nrf_softdevice::ble::Address;

/// Notifications received from the display, consumed by the session.
pub static NOTIFICATIONS: NotificationQueue<CriticalSectionRawMutex, NOTIFICATION_QUEUE_DEPTH> =
    NotificationQueue::new();

/// Information about a discovered BLE peripheral.
#[derive(Clone, Format)]
pub struct DiscoveredDevice {
    /// BLE address.
    pub address: Address,
    /// Human-readable name (truncated to 32 bytes for `heapless::String`).
    pub name: String<32>,
    /// Received Signal Strength Indicator (dBm).
    pub rssi: i8,
}
