use embedded_hal::i2c::{self, ErrorKind};

/// Failures reported synchronously by the driver's operations.
///
/// None of these raise an event, and none leave an operation in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Another operation is in flight on this context.
    Busy,
    /// `init` has not been called yet.
    NotInitialized,
    /// `init` was already called on this context.
    AlreadyInitialized,
    /// The requested slave address does not fit in 7 bits.
    InvalidAddress,
    /// The chip rejected or failed to commit a persisted address change.
    PersistFailed,
    /// A Vdd/Reset pin operation failed. This is a board configuration
    /// fault; there is no retry at this layer.
    Gpio,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Busy => write!(f, "operation already in flight"),
            Error::NotInitialized => write!(f, "event handler not registered"),
            Error::AlreadyInitialized => {
                write!(f, "event handler already registered")
            }
            Error::InvalidAddress => {
                write!(f, "slave address exceeds 7 bits")
            }
            Error::PersistFailed => {
                write!(f, "persisted address change not committed")
            }
            Error::Gpio => write!(f, "Vdd/Reset pin failure"),
        }
    }
}

/// Terminal outcome of a failed transfer, carried in error events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// The chip did not acknowledge the transfer.
    Nack,
    /// The chip never produced a response within the bounded poll budget.
    RetryExhausted,
    /// Any other bus fault, as classified by the HAL.
    Bus(ErrorKind),
}

impl TransferError {
    pub(crate) fn from_bus<E: i2c::Error>(err: E) -> Self {
        match err.kind() {
            ErrorKind::NoAcknowledge(_) => TransferError::Nack,
            kind => TransferError::Bus(kind),
        }
    }
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransferError::Nack => write!(f, "transfer not acknowledged"),
            TransferError::RetryExhausted => {
                write!(f, "chip stayed busy past the poll budget")
            }
            TransferError::Bus(kind) => write!(f, "bus fault: {}", kind),
        }
    }
}
