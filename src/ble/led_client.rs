//! BLE GATT client for the LED display service.
//!
//! After GAP connection is established, this module:
//! 1. Discovers the LED Service (UUID 0x00FA).
//! 2. Enables CCCD notifications on the notify characteristic (0xFA03).
//! 3. Forwards every notification into [`NOTIFICATIONS`] for the session.
//! 4. Writes encoded frames to the write characteristic (0xFA02).

use crate::ble::NOTIFICATIONS;
use crate::error::BleError;
use defmt::{debug, info, warn};
use heapless::Vec;
use ledlink::protocol::session::{MAX_NOTIFICATION_LEN, MAX_WRITE_LEN};
use ledlink::protocol::{FrameWriter, TransportError};
use nrf_softdevice::ble::{gatt_client, Connection};

/// nrf-softdevice GATT client struct for the LED service.
///
/// The `#[nrf_softdevice::gatt_client]` macro generates discovery and
/// write/notify helpers for the listed characteristics.
#[nrf_softdevice::gatt_client(uuid = "00fa")]
pub struct LedServiceClient {
    /// Command frames are written here.
    #[characteristic(uuid = "fa02", write)]
    pub command: Vec<u8, MAX_WRITE_LEN>,

    /// One notification per written frame.
    #[characteristic(uuid = "fa03", notify)]
    pub response: Vec<u8, MAX_NOTIFICATION_LEN>,
}

/// Discover the LED service on the connected display and subscribe to
/// response notifications.
pub async fn discover_and_subscribe(conn: &Connection) -> Result<LedServiceClient, BleError> {
    info!("Discovering LED service...");

    let client: LedServiceClient = gatt_client::discover(conn)
        .await
        .map_err(|_| BleError::DiscoveryFailed)?;

    info!("LED service discovered");

    client
        .response_cccd_write(true)
        .await
        .map_err(|_| BleError::NotifyFailed)?;

    info!("Subscribed to LED response notifications");
    Ok(client)
}

/// Run the notification listener loop.
///
/// Blocks until the connection drops, then closes [`NOTIFICATIONS`] so a
/// pending exchange fails with `Disconnected`.
pub async fn run_notification_loop(conn: &Connection, client: &LedServiceClient) {
    info!("LED notification loop started");

    let _result = gatt_client::run(conn, client, |event| match event {
        LedServiceClientEvent::ResponseNotification(data) => {
            debug!("Receive notification: {=[u8]:02X}", data.as_slice());
            // The callback cannot await; a full queue is recorded and
            // reported by the next exchange.
            if let Err(e) = NOTIFICATIONS.push(&data) {
                warn!("Notification dropped: {}", e);
            }
        }
    })
    .await;

    NOTIFICATIONS.close();
    info!("LED notification loop ended (connection closed)");
}

/// [`FrameWriter`] over the discovered write characteristic.
pub struct GattFrameWriter<'a> {
    client: &'a LedServiceClient,
}

impl<'a> GattFrameWriter<'a> {
    pub fn new(client: &'a LedServiceClient) -> Self {
        Self { client }
    }
}

impl FrameWriter for GattFrameWriter<'_> {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        debug!("Write {=[u8]:02x} ({} bytes)", frame, frame.len());

        let value: Vec<u8, MAX_WRITE_LEN> =
            Vec::from_slice(frame).map_err(|_| TransportError::FrameTooLarge)?;

        match self.client.command_write(&value).await {
            Ok(()) => Ok(()),
            Err(gatt_client::WriteError::Disconnected) => Err(TransportError::NotConnected),
            Err(_) => {
                warn!("Failed writing {} byte frame", frame.len());
                Err(TransportError::Rejected)
            }
        }
    }
}
