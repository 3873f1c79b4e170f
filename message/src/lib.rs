//! Byte-level model of the feeder bus: addresses, opcodes, the 4-byte header and
//! the checksummed frame that travels on the RS-485 side of the tunnel.

pub mod address;
pub mod checksum;
pub mod command;
pub mod feeder_id;
pub mod frame;
pub mod header;

pub use address::Address;
pub use checksum::{
    BusCrc,
    Checksum,
};
pub use command::Command;
pub use feeder_id::FeederId;
pub use frame::Frame;
pub use header::Header;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("payload of {len} bytes does not fit the one-byte length field")]
    PayloadTooLarge { len: usize },

    #[error("frame of {len} bytes is shorter than header and checksum")]
    Truncated { len: usize },

    #[error(transparent)]
    Packing(#[from] packed_struct::PackingError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
