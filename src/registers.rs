//! Register map of the OPTIGA I2C interface.
//!
//! The chip is not a raw byte stream: every access targets one of a handful
//! of registers, selected by the first written byte.

use bitflags::bitflags;

/// Frame data in/out.
pub const DATA: u8 = 0x80;
/// Negotiated maximum length of the data register.
pub const DATA_REG_LEN: u8 = 0x81;
/// 4-byte interface status, polled while waiting for a response.
pub const I2C_STATE: u8 = 0x82;
/// Slave address register; supports volatile and persisted updates.
pub const BASE_ADDR: u8 = 0x83;
/// Maximum SCL frequency supported by the chip.
pub const MAX_SCL_FREQU: u8 = 0x84;
/// Minimum idle time the host must leave between bus accesses.
pub const GUARD_TIME: u8 = 0x85;

/// Flag in the `BASE_ADDR` mode byte requesting the new address be
/// committed to non-volatile memory.
pub const BASE_ADDR_PERSIST: u8 = 0x80;

bitflags! {
    /// First byte of the `I2C_STATE` register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StateFlags: u8 {
        /// Chip is processing a command; the data register must not be read.
        const BUSY = 0x80;
        /// A response is ready in the data register.
        const RESP_READY = 0x40;
        /// Soft reset via register write is supported.
        const SOFT_RESET = 0x08;
        /// Continued reads of a response are supported.
        const CONT_READ = 0x04;
        /// Repeated-start transfers are supported.
        const REP_START = 0x02;
        /// Clock stretching is supported.
        const CLK_STRETCHING = 0x01;
    }
}

/// Decoded `I2C_STATE` register content.
#[derive(Debug, Clone, Copy)]
pub struct I2cState {
    pub flags: StateFlags,
    /// Length of the pending response frame, zero if none.
    pub read_len: u16,
}

impl I2cState {
    pub fn from_bytes(raw: [u8; 4]) -> Self {
        Self {
            flags: StateFlags::from_bits_truncate(raw[0]),
            read_len: u16::from_be_bytes([raw[2], raw[3]]),
        }
    }

    /// Length of the response waiting in the data register, or `None` while
    /// the chip is still working on one.
    pub fn response_len(&self) -> Option<usize> {
        if self.flags.contains(StateFlags::BUSY)
            || !self.flags.contains(StateFlags::RESP_READY)
            || self.read_len == 0
        {
            None
        } else {
            Some(self.read_len as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ready_state() {
        let state = I2cState::from_bytes([0x40, 0x00, 0x01, 0x15]);
        assert!(state.flags.contains(StateFlags::RESP_READY));
        assert_eq!(state.response_len(), Some(0x115));
    }

    #[test]
    fn busy_masks_pending_length() {
        let state = I2cState::from_bytes([0xC0, 0x00, 0x00, 0x08]);
        assert_eq!(state.response_len(), None);
    }

    #[test]
    fn ready_without_data_is_not_a_response() {
        let state = I2cState::from_bytes([0x40, 0x00, 0x00, 0x00]);
        assert_eq!(state.response_len(), None);
    }
}
