use std::fmt::{
    Display,
    Formatter,
};

use bytes::{
    BufMut,
    Bytes,
    BytesMut,
};
use packed_struct::{
    prelude::*,
    PackingResult,
};

use crate::{
    Address,
    BusCrc,
    Checksum,
    Command,
    Error,
    Header,
    Result,
};

/// One bus message: `[header(4), checksum, lead, payload...]`.
///
/// The lead byte is the command opcode on requests and the status code on replies.
/// The checksum covers every other byte, in wire order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    pub header:   Header,
    pub checksum: u8,
    body:         Bytes,
}

impl Frame {
    pub const CHECKSUM_OFFSET: usize = Header::SIZE_BYTES;
    /// Header plus checksum.
    pub const OVERHEAD: usize = Header::SIZE_BYTES + 1;
    /// Lead byte plus payload, bounded by the one-byte length field.
    pub const MAX_BODY: usize = u8::MAX as usize;

    pub fn request(
        destination: Address,
        transaction: u8,
        command: Command,
        payload: &[u8],
    ) -> Result<Self> {
        Self::build(destination, Address::HOST, transaction, command.opcode(), payload)
    }

    /// A device's answer to the host, as a feeder would put it on the bus.
    pub fn reply(source: Address, transaction: u8, status: u8, payload: &[u8]) -> Result<Self> {
        Self::build(Address::HOST, source, transaction, status, payload)
    }

    fn build(
        destination: Address,
        source: Address,
        transaction: u8,
        lead: u8,
        payload: &[u8],
    ) -> Result<Self> {
        if payload.len() + 1 > Self::MAX_BODY {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
            });
        }

        let length = (payload.len() + 1) as u8;

        let mut body = BytesMut::with_capacity(length as usize);
        body.put_u8(lead);
        body.put_slice(payload);

        let header = Header {
            destination,
            source,
            transaction,
            length,
        };
        let body = body.freeze();
        let checksum = checksum_of(&header, &body);

        Ok(Self {
            header,
            checksum,
            body,
        })
    }

    /// Splits raw bytes into header, checksum and body without validating them.
    pub fn from_bytes(src: &[u8]) -> Result<Self> {
        if src.len() < Self::OVERHEAD {
            return Err(Error::Truncated {
                len: src.len(),
            });
        }

        Ok(<Self as PackedStructSlice>::unpack_from_slice(src)?)
    }

    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::OVERHEAD + self.body.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.push(self.checksum);
        out.extend_from_slice(&self.body);

        out
    }

    /// Lead byte followed by the payload.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[inline]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    #[inline]
    pub fn lead(&self) -> Option<u8> {
        self.body.first().copied()
    }

    #[inline]
    pub fn command(&self) -> Option<Command> {
        self.lead().and_then(Command::from_primitive)
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.body.get(1..).unwrap_or_default()
    }

    #[inline]
    pub fn computed_checksum(&self) -> u8 {
        checksum_of(&self.header, &self.body)
    }

    #[inline]
    pub fn checksum_valid(&self) -> bool {
        self.checksum == self.computed_checksum()
    }

    /// Whether the declared length agrees with the bytes actually present.
    #[inline]
    pub fn length_consistent(&self) -> bool {
        self.header.length as usize == self.body.len()
    }
}

#[inline]
fn checksum_of(header: &Header, body: &[u8]) -> u8 {
    BusCrc::checksum_parts([&header.to_bytes()[..], body])
}

impl PackedStructSlice for Frame {
    fn pack_to_slice(&self, output: &mut [u8]) -> PackingResult<()> {
        let size = Self::packed_bytes_size(Some(self))?;
        if output.len() < size {
            return Err(PackingError::BufferTooSmall);
        }

        let (header, rest) = output[..size].split_at_mut(Header::SIZE_BYTES);
        let (checksum, body) = rest.split_at_mut(1);

        self.header.pack_to_slice(header)?;
        checksum[0] = self.checksum;
        body.copy_from_slice(&self.body);

        Ok(())
    }

    fn unpack_from_slice(src: &[u8]) -> PackingResult<Self> {
        if src.len() < Self::OVERHEAD {
            return Err(PackingError::BufferTooSmall);
        }

        let (header, rest) = src.split_at(Header::SIZE_BYTES);
        let header = Header::unpack_from_slice(header)?;

        Ok(Self {
            header,
            checksum: rest[0],
            body: Bytes::copy_from_slice(&rest[1..]),
        })
    }

    fn packed_bytes_size(opt_self: Option<&Self>) -> PackingResult<usize> {
        let slf = opt_self.ok_or(PackingError::InstanceRequiredForSize)?;

        Ok(Self::OVERHEAD + slf.body.len())
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} / body: 0x{} (crc: 0x{:02x})",
            self.header.display(),
            hex::encode(&self.body),
            self.checksum
        )
    }
}
