//! Train Hub Protocol
//!
//! Wire format of the motor command written to the hub.

use crate::domain::error::HubError;
use crate::domain::models::{MAX_SPEED, MIN_SPEED};
use uuid::Uuid;

/// Hub characteristic used for both motor commands and notifications
pub const HUB_CHAR_UUID: Uuid = Uuid::from_u128(0x00001624_1212_efde_1623_785feabcd123);

/// Set on the power byte when the motor runs in reverse
pub const REVERSE_FLAG: u8 = 0x80;

/// Fixed prefix of the "start power" command on port 0
///
/// ```text
/// [0] : Message length (8)
/// [1] : Hub ID
/// [2] : Port output command
/// [3] : Port 0
/// [4] : Execute immediately, command feedback
/// [5] : Write direct mode data
/// [6] : Mode 1
/// [7] : Power byte (appended)
/// ```
pub const MOTOR_COMMAND_HEADER: [u8; 7] = [0x08, 0x00, 0x81, 0x00, 0x11, 0x51, 0x01];

/// Encode a signed speed as the hub's power byte
///
/// Forward speeds map to 0..=100, reverse speeds to 128..=228.
pub fn power_byte(speed: i32) -> Result<u8, HubError> {
    if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(HubError::InvalidSpeed(speed));
    }

    let magnitude = speed.unsigned_abs().min(MAX_SPEED as u32) as u8;
    if speed < 0 {
        Ok(magnitude + REVERSE_FLAG)
    } else {
        Ok(magnitude)
    }
}

/// Build the full 8-byte motor command for `speed`
pub fn motor_command(speed: i32) -> Result<[u8; 8], HubError> {
    let power = power_byte(speed)?;
    let mut command = [0u8; 8];
    command[..7].copy_from_slice(&MOTOR_COMMAND_HEADER);
    command[7] = power;
    Ok(command)
}

/// Render a notification payload as lowercase hex bytes separated by spaces
pub fn format_notification(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_uuid() {
        assert_eq!(
            HUB_CHAR_UUID.to_string(),
            "00001624-1212-efde-1623-785feabcd123"
        );
    }

    #[test]
    fn test_power_byte_over_range() {
        for speed in MIN_SPEED..=MAX_SPEED {
            let power = power_byte(speed).unwrap();
            if speed >= 0 {
                assert_eq!(power as i32, speed);
                assert!(power <= 100);
            } else {
                assert_eq!(power as i32, 128 - speed);
                assert!((128..=228).contains(&power));
            }
        }
    }

    #[test]
    fn test_power_byte_rejects_out_of_range() {
        for speed in [-101, 101, i32::MIN, i32::MAX] {
            assert!(matches!(
                power_byte(speed),
                Err(HubError::InvalidSpeed(s)) if s == speed
            ));
        }
    }

    #[test]
    fn test_motor_command_bytes() {
        assert_eq!(
            motor_command(50).unwrap(),
            [0x08, 0x00, 0x81, 0x00, 0x11, 0x51, 0x01, 50]
        );
        assert_eq!(motor_command(-100).unwrap()[7], 228);
        assert_eq!(motor_command(0).unwrap()[7], 0);
    }

    #[test]
    fn test_format_notification() {
        assert_eq!(format_notification(&[0x05, 0x00, 0x82, 0x00, 0x0a]), "05 00 82 00 0a");
        assert_eq!(format_notification(&[]), "");
    }
}
