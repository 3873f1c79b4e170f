use bytes::Bytes;

/// Controller command carrying one outbound bus frame.
pub const TUNNEL_COMMAND: &str = "M485";
/// Prefix of the controller's answer to [`TUNNEL_COMMAND`].
pub const REPLY_MARKER: &str = "rs485-reply:";
/// Reply value meaning no device answered before the controller's deadline.
pub const TIMEOUT_TOKEN: &str = "TIMEOUT";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("no reply from the feeder bus")]
    Timeout,

    #[error("reply is not valid hex: {0}")]
    Malformed(#[from] hex::FromHexError),

    #[error("line is not an M485 tunnel command")]
    NotTunnelCommand,
}

/// Renders a packed frame as the line handed to the controller.
#[inline]
pub fn encode_line(frame: impl AsRef<[u8]>) -> String {
    format!("{TUNNEL_COMMAND} {}", hex::encode(frame))
}

/// Extracts the frame bytes carried by a controller reply line.
///
/// A line without the reply marker, an empty value and the timeout token are all
/// reported as [`Error::Timeout`].
#[tracing::instrument(level = "trace")]
pub fn decode_reply(line: &str) -> Result<Bytes, Error> {
    let value = line
        .find(REPLY_MARKER)
        .map(|at| &line[at + REPLY_MARKER.len()..])
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or(Error::Timeout)?;

    if value == TIMEOUT_TOKEN {
        return Err(Error::Timeout);
    }

    Ok(hex::decode(value)?.into())
}

/// Device-side mirror of [`encode_line`]: recovers the frame bytes from a command line.
pub fn decode_command(line: &str) -> Result<Bytes, Error> {
    let mut words = line.split_whitespace();

    if words.next() != Some(TUNNEL_COMMAND) {
        return Err(Error::NotTunnelCommand);
    }

    let value = words.next().ok_or(Error::NotTunnelCommand)?;
    Ok(hex::decode(value)?.into())
}

/// Device-side mirror of [`decode_reply`].
#[inline]
pub fn encode_reply(frame: impl AsRef<[u8]>) -> String {
    format!("{REPLY_MARKER} {}", hex::encode(frame))
}

#[inline]
pub fn timeout_reply() -> String {
    format!("{REPLY_MARKER} {TIMEOUT_TOKEN}")
}
