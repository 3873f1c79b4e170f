use std::{
    fmt::{
        Display,
        Formatter,
    },
    str::FromStr,
};

use packed_struct::{
    prelude::*,
    PackedStructInfo,
    PackingResult,
};

/// A position on the feeder bus.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Address {
    val: u8,
}

impl Address {
    /// Destination of every device reply.
    pub const HOST: Self = Self::new(0x00);
    /// Outbound destination reaching every device on the bus.
    pub const BROADCAST: Self = Self::new(0xff);

    pub const MIN_UNICAST: u8 = 1;
    pub const MAX_UNICAST: u8 = 127;

    #[inline]
    pub const fn new(val: u8) -> Self {
        Self {
            val,
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.val
    }

    #[inline]
    pub const fn is_broadcast(self) -> bool {
        self.val == Self::BROADCAST.val
    }

    #[inline]
    pub const fn is_unicast(self) -> bool {
        self.val >= Self::MIN_UNICAST && self.val <= Self::MAX_UNICAST
    }
}

impl PackedStruct for Address {
    type ByteArray = [u8; 1];

    #[inline]
    fn pack(&self) -> PackingResult<Self::ByteArray> {
        Ok([self.val])
    }

    #[inline]
    fn unpack(src: &Self::ByteArray) -> PackingResult<Self> {
        Ok(Self::new(src[0]))
    }
}

impl PackedStructInfo for Address {
    #[inline]
    fn packed_bits() -> usize {
        8
    }
}

impl From<u8> for Address {
    #[inline]
    fn from(val: u8) -> Self {
        Self::new(val)
    }
}

impl From<Address> for u8 {
    #[inline]
    fn from(addr: Address) -> Self {
        addr.val
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::HOST => f.write_str("host"),
            Self::BROADCAST => f.write_str("broadcast"),
            Self {
                val,
            } => write!(f, "{val}"),
        }
    }
}

impl FromStr for Address {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s.strip_prefix("0x") {
            Some(hex) => u8::from_str_radix(hex, 16)?,
            None => s.parse()?,
        };

        Ok(Self::new(val))
    }
}
