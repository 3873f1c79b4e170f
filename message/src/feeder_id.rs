use std::{
    fmt::{
        Debug,
        Display,
        Formatter,
    },
    str::FromStr,
};

use serde::{
    de::Error as _,
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

/// Factory-assigned identity of one feeder, opaque to the host.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::AsRef, derive_more::Into)]
pub struct FeederId([u8; FeederId::LEN]);

impl FeederId {
    pub const LEN: usize = 12;

    #[inline]
    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("feeder id must be 12 bytes, got {0}")]
    Length(usize),

    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
}

impl TryFrom<&[u8]> for FeederId {
    type Error = ParseError;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        <[u8; Self::LEN]>::try_from(src).map(Self).map_err(|_| ParseError::Length(src.len()))
    }
}

impl FromStr for FeederId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())?;
        Self::try_from(bytes.as_slice())
    }
}

impl Display for FeederId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for FeederId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FeederId({self})")
    }
}

impl Serialize for FeederId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FeederId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
