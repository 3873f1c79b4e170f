//! Text side of the feeder bus tunnel.
//!
//! Frames ride inside the motion controller's line protocol: the host sends
//! `M485 <hex>` and the controller answers `rs485-reply: <hex>`, or
//! `rs485-reply: TIMEOUT` when no feeder answered in time.

pub use ::tokio_util::codec as tokio_codec;

pub mod tunnel;

pub use tunnel::{
    decode_command,
    decode_reply,
    encode_line,
    encode_reply,
    timeout_reply,
    Error,
    REPLY_MARKER,
    TIMEOUT_TOKEN,
    TUNNEL_COMMAND,
};

/// Longest line the tunnel ever produces: marker, space, and a maximal frame in hex.
pub const MAX_LINE_LENGTH: usize = 1024;
