use heapless::String;

use crate::config::{LED_SERVICE_UUID16, TARGET_ADDRESS, TARGET_NAME};

/// AD type: Incomplete List of 16-bit Service UUIDs.
const AD_UUID16_INCOMPLETE: u8 = 0x02;
/// AD type: Complete List of 16-bit Service UUIDs.
const AD_UUID16_COMPLETE: u8 = 0x03;
/// AD type: Shortened Local Name.
const AD_NAME_SHORT: u8 = 0x08;
/// AD type: Complete Local Name.
const AD_NAME_COMPLETE: u8 = 0x09;

/// Iterate over `(ad_type, data)` pairs of raw advertisement data.
///
/// Stops at the first zero-length or truncated structure.
fn ad_structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let ad_type = data[i + 1];
        let body = &data[i + 2..i + 1 + len];
        i += len + 1;
        Some((ad_type, body))
    })
}

/// Check if raw advertisement data lists the given 16-bit service UUID.
pub fn contains_service_uuid16(data: &[u8], uuid: u16) -> bool {
    let uuid_le = uuid.to_le_bytes();
    ad_structures(data)
        .filter(|(ad_type, _)| *ad_type == AD_UUID16_INCOMPLETE || *ad_type == AD_UUID16_COMPLETE)
        .any(|(_, body)| body.chunks_exact(2).any(|chunk| chunk == uuid_le))
}

/// Check if raw advertisement data lists the LED service (0x00FA).
pub fn contains_led_service_uuid(data: &[u8]) -> bool {
    contains_service_uuid16(data, LED_SERVICE_UUID16)
}

/// Extract complete/shortened local name from advertisement data.
pub fn extract_device_name(data: &[u8]) -> String<32> {
    let mut name = String::new();
    match ad_structures(data).find(|(t, _)| *t == AD_NAME_SHORT || *t == AD_NAME_COMPLETE) {
        Some((_, name_bytes)) => {
            for &b in name_bytes {
                if name.push(b as char).is_err() {
                    break;
                }
            }
        }
        None => {
            let _ = name.push_str("Unknown");
        }
    }
    name
}

/// Compare an over-the-air address (least significant byte first) with a
/// display-order address (most significant byte first).
pub fn address_matches(peer_le: &[u8; 6], target: &[u8; 6]) -> bool {
    peer_le.iter().rev().eq(target.iter())
}

/// Decide whether an advertiser is the configured display.
///
/// The address must match; if the advertisement carries a name it must
/// match too.
pub fn is_target_device(peer_le: &[u8; 6], data: &[u8]) -> bool {
    if !address_matches(peer_le, &TARGET_ADDRESS) {
        return false;
    }
    let has_name = ad_structures(data).any(|(t, _)| t == AD_NAME_SHORT || t == AD_NAME_COMPLETE);
    !has_name || extract_device_name(data).as_str() == TARGET_NAME
}
