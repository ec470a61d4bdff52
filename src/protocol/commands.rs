//! Short control frames understood by the LED_BLE display.
//!
//! Layout:
//! ```text
//! Byte 0-1: frame length (little-endian), 4 + argument count
//! Byte 2:   opcode
//! Byte 3:   qualifier
//! Byte 4-:  arguments
//! ```
//!
//! These frames carry no CRC and bypass the header layouts of
//! [`super::frame`]. Responses are returned raw by the session.

use super::frame::EncodeError;

/// Opcode + qualifier prefix length.
const CONTROL_HEADER_LEN: usize = 4;

/// Qualifier used by query and configuration commands.
const QUALIFIER_QUERY: u8 = 0x80;

/// Qualifier used by mode commands.
const QUALIFIER_MODE: u8 = 0x01;

/// Longest argument list of any control command.
pub const MAX_CONTROL_ARGS: usize = 7;

/// Longest encoded control frame.
pub const MAX_CONTROL_FRAME_LEN: usize = CONTROL_HEADER_LEN + MAX_CONTROL_ARGS;

/// Clock face configuration for [`ControlCommand::SetClock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSettings {
    pub style: u8,
    pub show_date: bool,
    pub hour24: bool,
    /// Only the low byte is transmitted.
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
}

/// A control command and its arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Erase every stored program.
    DeleteAll,
    /// Query the panel type.
    GetLedType,
    /// Query hardware information.
    GetHardwareInfo,
    /// Set panel brightness.
    SetBrightness(u8),
    /// Select the text animation effect.
    SetTextEffect(u8),
    /// Leave the current program.
    Exit,
    /// Switch the panel on or off.
    Power(bool),
    /// Switch to clock mode.
    SetClock(ClockSettings),
}

impl ControlCommand {
    /// `(opcode, qualifier)` pair of this command.
    pub const fn opcode(&self) -> (u8, u8) {
        match self {
            ControlCommand::DeleteAll => (3, QUALIFIER_QUERY),
            ControlCommand::GetLedType => (1, QUALIFIER_QUERY),
            ControlCommand::GetHardwareInfo => (5, QUALIFIER_QUERY),
            ControlCommand::SetBrightness(_) => (4, QUALIFIER_QUERY),
            ControlCommand::SetTextEffect(_) | ControlCommand::Exit => (1, QUALIFIER_MODE),
            ControlCommand::Power(_) => (7, QUALIFIER_MODE),
            ControlCommand::SetClock(_) => (6, QUALIFIER_MODE),
        }
    }

    /// Write the argument bytes into `args`, returning how many were written.
    fn write_args(&self, args: &mut [u8; MAX_CONTROL_ARGS]) -> usize {
        match *self {
            ControlCommand::DeleteAll
            | ControlCommand::GetHardwareInfo
            | ControlCommand::Exit => 0,
            ControlCommand::GetLedType => {
                args[..4].copy_from_slice(&[15, 54, 0, 1]);
                4
            }
            ControlCommand::SetBrightness(level) => {
                args[0] = level;
                1
            }
            ControlCommand::SetTextEffect(effect) => {
                args[0] = effect;
                1
            }
            ControlCommand::Power(on) => {
                args[0] = on as u8;
                1
            }
            ControlCommand::SetClock(clock) => {
                *args = [
                    clock.style,
                    clock.show_date as u8,
                    clock.hour24 as u8,
                    clock.year as u8,
                    clock.month,
                    clock.day,
                    clock.weekday,
                ];
                MAX_CONTROL_ARGS
            }
        }
    }

    /// Encode into `buf`. Returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let mut args = [0u8; MAX_CONTROL_ARGS];
        let arg_len = self.write_args(&mut args);
        let total = CONTROL_HEADER_LEN + arg_len;
        if buf.len() < total {
            return Err(EncodeError::BufferTooSmall);
        }

        let (opcode, qualifier) = self.opcode();
        buf[0..2].copy_from_slice(&(total as u16).to_le_bytes());
        buf[2] = opcode;
        buf[3] = qualifier;
        buf[CONTROL_HEADER_LEN..total].copy_from_slice(&args[..arg_len]);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(cmd: ControlCommand) -> std::vec::Vec<u8> {
        let mut buf = [0u8; MAX_CONTROL_FRAME_LEN];
        let n = cmd.encode(&mut buf).unwrap();
        buf[..n].to_vec()
    }

    #[test]
    fn delete_all() {
        assert_eq!(encode(ControlCommand::DeleteAll), [4, 0, 3, 0x80]);
    }

    #[test]
    fn get_led_type() {
        assert_eq!(
            encode(ControlCommand::GetLedType),
            [8, 0, 1, 0x80, 15, 54, 0, 1]
        );
    }

    #[test]
    fn get_hardware_info() {
        assert_eq!(encode(ControlCommand::GetHardwareInfo), [4, 0, 5, 0x80]);
    }

    #[test]
    fn set_brightness() {
        assert_eq!(encode(ControlCommand::SetBrightness(10)), [5, 0, 4, 0x80, 10]);
    }

    #[test]
    fn set_text_effect() {
        assert_eq!(encode(ControlCommand::SetTextEffect(9)), [5, 0, 1, 1, 9]);
    }

    #[test]
    fn exit() {
        assert_eq!(encode(ControlCommand::Exit), [4, 0, 1, 1]);
    }

    #[test]
    fn power_on_off() {
        assert_eq!(encode(ControlCommand::Power(true)), [5, 0, 7, 1, 1]);
        assert_eq!(encode(ControlCommand::Power(false)), [5, 0, 7, 1, 0]);
    }

    #[test]
    fn set_clock_truncates_year() {
        let clock = ClockSettings {
            style: 1,
            show_date: true,
            hour24: false,
            year: 1977,
            month: 2,
            day: 6,
            weekday: 6,
        };
        // 1977 & 0xFF = 0xB9
        assert_eq!(
            encode(ControlCommand::SetClock(clock)),
            [11, 0, 6, 1, 1, 1, 0, 0xB9, 2, 6, 6]
        );
    }

    #[test]
    fn encode_rejects_short_buffer() {
        let mut buf = [0u8; 4];
        assert_eq!(
            ControlCommand::SetBrightness(1).encode(&mut buf),
            Err(EncodeError::BufferTooSmall)
        );
        assert_eq!(ControlCommand::Exit.encode(&mut buf), Ok(4));
    }
}
