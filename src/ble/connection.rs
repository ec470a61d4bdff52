//! Display connection manager.
//!
//! Keeps a single link to the display alive: scan, connect, discover,
//! then run the notification loop next to the startup script until the
//! link drops, back off and start over.

use crate::ble::led_client::{self, GattFrameWriter};
use crate::ble::{scanner, NOTIFICATIONS};
use crate::error::{BleError, Error};
use crate::script;
use defmt::{info, warn};
use embassy_futures::select::select;
use embassy_time::{Delay, Duration, Timer};
use ledlink::config;
use ledlink::protocol::CommandSession;
use nrf_softdevice::ble::central;
use nrf_softdevice::raw;
use nrf_softdevice::Softdevice;

pub async fn ble_task(sd: &'static Softdevice) -> ! {
    loop {
        match run_link(sd).await {
            Ok(()) => info!("Display link closed"),
            Err(e) => warn!("Display link failed: {}", e),
        }
        Timer::after(Duration::from_millis(config::RECONNECT_BACKOFF_MS)).await;
    }
}

async fn run_link(sd: &'static Softdevice) -> Result<(), Error> {
    let device = scanner::find_display(sd).await?;
    info!("connecting to {}", device.name.as_str());

    let whitelist = [&device.address];
    let conn_cfg = central::ConnectConfig {
        scan_config: central::ScanConfig {
            whitelist: Some(&whitelist),
            ..Default::default()
        },
        conn_params: raw::ble_gap_conn_params_t {
            min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
            max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
            slave_latency: config::BLE_SLAVE_LATENCY,
            conn_sup_timeout: config::BLE_SUP_TIMEOUT,
        },
        att_mtu: Some(config::BLE_ATT_MTU),
        ..Default::default()
    };

    let conn = central::connect(sd, &conn_cfg)
        .await
        .map_err(|_| BleError::ConnectFailed)?;

    // A new link starts with an empty queue.
    NOTIFICATIONS.reopen();
    let client = led_client::discover_and_subscribe(&conn).await?;

    let mut session = CommandSession::new(GattFrameWriter::new(&client), Delay, &NOTIFICATIONS);
    let commands = async {
        match script::run_startup_script(&mut session).await {
            Ok(()) => info!("Startup script complete"),
            Err(e) => warn!("Startup script aborted: {}", e),
        }
        core::future::pending::<()>().await
    };

    // Returns once the notification loop ends, i.e. the link is gone.
    select(led_client::run_notification_loop(&conn, &client), commands).await;
    Ok(())
}
