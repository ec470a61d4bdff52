//! Application-wide constants and compile-time configuration.
//!
//! Target device identity, GATT identifiers, timing parameters and the
//! startup display content live here so they can be tuned in one place.

// Target display

/// Advertised name of the display.
pub const TARGET_NAME: &str = "LED_BLE_59271C84";

/// Public address of the display, most significant byte first
/// (`A2:40:59:27:1C:84`).
pub const TARGET_ADDRESS: [u8; 6] = [0xA2, 0x40, 0x59, 0x27, 0x1C, 0x84];

// GATT identifiers (16-bit UUIDs on the Bluetooth base UUID)

/// LED service, `000000fa-0000-1000-8000-00805f9b34fb`.
pub const LED_SERVICE_UUID16: u16 = 0x00FA;

/// Write characteristic, `0000fa02-0000-1000-8000-00805f9b34fb`.
pub const WRITE_CHAR_UUID16: u16 = 0xFA02;

/// Notify characteristic, `0000fa03-0000-1000-8000-00805f9b34fb`.
pub const NOTIFY_CHAR_UUID16: u16 = 0xFA03;

// BLE

/// Duration of a BLE scan window (seconds).
pub const BLE_SCAN_DURATION_SECS: u64 = 10;

/// BLE connection interval range (in 1.25 ms units). 24 = 30 ms.
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 40;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// ATT MTU requested on connect. Frames up to `BLE_ATT_MTU - 3` bytes
/// fit a single write.
pub const BLE_ATT_MTU: u16 = 247;

/// Wait before scanning again after the link drops (ms).
pub const RECONNECT_BACKOFF_MS: u64 = 2_000;

// Session

/// How long to wait for the display's reply to a write (ms).
pub const RESPONSE_TIMEOUT_MS: u32 = 2_000;

/// Notifications buffered between the GATT callback and the session.
pub const NOTIFICATION_QUEUE_DEPTH: usize = 8;

/// Settle time between subscribing and the first write (ms).
pub const FIRST_WRITE_DELAY_MS: u64 = 100;

// Startup content

/// Text shown once the link is up.
pub const STARTUP_TEXT: &str = "HELLO";

/// Panel brightness sent at startup.
pub const STARTUP_BRIGHTNESS: u8 = 10;

/// Text effect selected at startup.
pub const STARTUP_TEXT_EFFECT: u8 = 9;
