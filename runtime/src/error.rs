use message::{
    Address,
    Command,
};

use crate::transport;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("no reply from the feeder bus")]
    Timeout,

    #[error("transport failed: {0}")]
    Transport(#[source] transport::Error),

    #[error("reply could not be decoded: {0}")]
    Malformed(#[source] codec::Error),

    #[error("reply of {len} bytes is shorter than header and checksum")]
    Truncated { len: usize },

    #[error("reply addressed to {destination}, not the host")]
    Misdirected { destination: Address },

    #[error("reply came from {got}, expected {expected}")]
    WrongSender { expected: Address, got: Address },

    #[error("reply carries transaction {got:#04x}, expected {expected:#04x}")]
    StaleTransaction { expected: u8, got: u8 },

    #[error("reply declares {declared} body bytes but carries {actual}")]
    LengthMismatch { declared: u8, actual: usize },

    #[error("reply checksum {received:#04x} does not match computed {computed:#04x}")]
    ChecksumMismatch { received: u8, computed: u8 },

    #[error("feeder rejected {command} with status {status:#04x}")]
    DeviceRejected { command: Command, status: u8 },

    #[error("reply to {command} has no status byte")]
    MissingStatus { command: Command },

    #[error("feeder identity must be 12 bytes, got {len}")]
    MalformedIdentity { len: usize },

    #[error("unexpected {len}-byte payload in reply to {command}")]
    UnexpectedPayload { command: Command, len: usize },

    #[error("payload of {len} bytes does not fit in one frame")]
    PayloadTooLarge { len: usize },

    #[error("{0} is not a unicast feeder address")]
    InvalidAddress(Address),

    #[error("frame could not be packed: {0}")]
    Frame(#[source] message::Error),
}

impl BusError {
    /// The reply arrived but failed structural validation and was discarded.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BusError::Malformed(_)
                | BusError::Truncated { .. }
                | BusError::Misdirected { .. }
                | BusError::WrongSender { .. }
                | BusError::StaleTransaction { .. }
                | BusError::LengthMismatch { .. }
                | BusError::ChecksumMismatch { .. }
        )
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, BusError::Timeout)
    }
}

impl From<transport::Error> for BusError {
    fn from(e: transport::Error) -> Self {
        match e {
            transport::Error::Timeout => BusError::Timeout,
            e => BusError::Transport(e),
        }
    }
}

impl From<codec::Error> for BusError {
    fn from(e: codec::Error) -> Self {
        match e {
            codec::Error::Timeout => BusError::Timeout,
            e => BusError::Malformed(e),
        }
    }
}

impl From<message::Error> for BusError {
    fn from(e: message::Error) -> Self {
        match e {
            message::Error::PayloadTooLarge {
                len,
            } => BusError::PayloadTooLarge {
                len,
            },
            message::Error::Truncated {
                len,
            } => BusError::Truncated {
                len,
            },
            e @ message::Error::Packing(_) => BusError::Frame(e),
        }
    }
}
