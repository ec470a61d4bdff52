//! Host-testable library interface for ledlink.
//!
//! Everything that does not touch the radio lives here: the command-frame
//! codec, control commands, the request/response session, advertisement
//! parsing and the compile-time configuration. The embedded binary in
//! `main.rs` builds the SoftDevice transport on top of it.
//!
//! Usage: `cargo test` (no embedded hardware required)
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and is only built with `--features embedded`.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod protocol;

// Internal module paths for files shared with the embedded `ble` module
#[path = "ble/adv_parser.rs"]
mod ble_adv_parser_impl;

pub mod ble {
    pub mod adv_parser {
        pub use crate::ble_adv_parser_impl::{
            address_matches, contains_led_service_uuid, contains_service_uuid16,
            extract_device_name, is_target_device,
        };
    }
}
