use packed_struct::prelude::*;

use crate::Address;

/// The four bytes preceding the checksum in every frame.
///
/// Outbound frames leave `source` zeroed (the reserved byte); devices fill it with
/// their own address when replying to the host.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct, serde::Serialize, serde::Deserialize,
)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "4")]
pub struct Header {
    #[packed_field(size_bytes = "1")]
    pub destination: Address,
    #[packed_field(size_bytes = "1")]
    pub source:      Address,
    pub transaction: u8,
    /// Command (or status) byte plus payload.
    pub length:      u8,
}

impl Header {
    pub const SIZE_BYTES: usize = 4;

    #[inline]
    pub fn to_bytes(&self) -> [u8; Self::SIZE_BYTES] {
        [self.destination.get(), self.source.get(), self.transaction, self.length]
    }

    #[inline]
    pub fn display(&self) -> String {
        format!(
            "{} -> {} [txn {:#04x}, len {}]",
            self.source, self.destination, self.transaction, self.length
        )
    }
}
