//! Startup sequence sent to the display once the link is up.

use defmt::{info, warn, Format};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use embedded_hal_async::delay::DelayNs;
use ledlink::config::{
    FIRST_WRITE_DELAY_MS, STARTUP_BRIGHTNESS, STARTUP_TEXT, STARTUP_TEXT_EFFECT,
};
use ledlink::protocol::{CommandSession, ControlCommand, FrameWriter, SessionError};

use crate::error::Error;

/// One request of the startup sequence.
#[derive(Clone, Copy, Format)]
pub enum ScriptStep {
    Command(ControlCommand),
    Text(&'static str),
}

pub const STARTUP_SCRIPT: [ScriptStep; 5] = [
    ScriptStep::Command(ControlCommand::GetLedType),
    ScriptStep::Command(ControlCommand::GetHardwareInfo),
    ScriptStep::Command(ControlCommand::SetBrightness(STARTUP_BRIGHTNESS)),
    ScriptStep::Command(ControlCommand::SetTextEffect(STARTUP_TEXT_EFFECT)),
    ScriptStep::Text(STARTUP_TEXT),
];

/// Send every [`STARTUP_SCRIPT`] step, logging each response.
///
/// A timed-out step is skipped. The session discards its late reply before
/// the next step is written. Any other session error ends the script.
pub async fn run_startup_script<W, D, M, const N: usize>(
    session: &mut CommandSession<'_, W, D, M, N>,
) -> Result<(), Error>
where
    W: FrameWriter,
    D: DelayNs,
    M: RawMutex,
{
    Timer::after(Duration::from_millis(FIRST_WRITE_DELAY_MS)).await;

    for step in STARTUP_SCRIPT.iter() {
        let result = match step {
            ScriptStep::Command(command) => session.send_command(command).await,
            ScriptStep::Text(text) => session.send_text(text).await,
        };

        match result {
            Ok(reply) => info!("{} -> {=[u8]:02X}", step, reply.as_slice()),
            Err(SessionError::Timeout) => warn!("{} timed out, skipping", step),
            Err(e) => return Err(e.into()),
        }
    }

    info!("{} exchanges completed", session.exchanges());
    Ok(())
}
