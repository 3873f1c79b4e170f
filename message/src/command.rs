use std::{
    fmt::{
        Display,
        Formatter,
    },
    str::FromStr,
};

use packed_struct::prelude::*;

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PrimitiveEnum_u8,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum Command {
    GetIdentity          = 0x01,
    Initialize           = 0x02,
    GetVersion           = 0x03,
    FeedForward          = 0x04,
    FeedBackward         = 0x05,
    FeedStatus           = 0x06,

    VendorOptions        = 0xbf,

    // broadcast, addressed by feeder identity:
    GetAddress           = 0xc0,
    Identify             = 0xc1,
    ProgramAddress       = 0xc2,
    UninitializedRespond = 0xc3,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Command::GetIdentity,
        Command::Initialize,
        Command::GetVersion,
        Command::FeedForward,
        Command::FeedBackward,
        Command::FeedStatus,
        Command::VendorOptions,
        Command::GetAddress,
        Command::Identify,
        Command::ProgramAddress,
        Command::UninitializedRespond,
    ];

    #[inline]
    pub fn opcode(self) -> u8 {
        self.to_primitive()
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::GetIdentity => "get-identity",
            Command::Initialize => "initialize",
            Command::GetVersion => "get-version",
            Command::FeedForward => "feed-forward",
            Command::FeedBackward => "feed-backward",
            Command::FeedStatus => "feed-status",
            Command::VendorOptions => "vendor-options",
            Command::GetAddress => "get-address",
            Command::Identify => "identify",
            Command::ProgramAddress => "program-address",
            Command::UninitializedRespond => "uninitialized-respond",
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.opcode())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feeder command: {0:?}")]
pub struct UnknownCommand(pub String);

/// Accepts either the kebab-case name or the opcode (`0xc1`, `193`).
impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let opcode = match s.strip_prefix("0x") {
            Some(hex) => u8::from_str_radix(hex, 16).ok(),
            None => s.parse::<u8>().ok(),
        };

        Command::ALL
            .into_iter()
            .find(|cmd| cmd.name() == s || Some(cmd.opcode()) == opcode)
            .ok_or_else(|| UnknownCommand(s.to_owned()))
    }
}
