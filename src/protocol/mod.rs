//! LED_BLE display protocol: frame codec, control commands and the
//! request/response session built on them.

pub mod commands;
pub mod frame;
pub mod session;

pub use commands::{ClockSettings, ControlCommand};
pub use frame::{CommandKind, EncodeError, EncodeOptions, FrameParams};
pub use session::{
    CommandSession, FrameWriter, Notification, NotificationQueue, PushError, SessionError,
    TransportError,
};
