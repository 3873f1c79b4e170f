use bytes::Bytes;

use message::{
    Address,
    Command,
    Frame,
};

use crate::{
    BusError,
    FeederRegistry,
    TransactionSequencer,
    Transport,
};

/// A validated reply: who answered, and the status byte followed by any payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    source: Address,
    body:   Bytes,
}

impl Reply {
    #[inline]
    pub fn source(&self) -> Address {
        self.source
    }

    #[inline]
    pub fn status(&self) -> Option<u8> {
        self.body.first().copied()
    }

    /// Bytes after the status byte.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.body.get(1..).unwrap_or_default()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}

/// Talks to the feeders tunneled behind one controller channel.
///
/// Exactly one exchange is in flight at a time: every operation takes `&mut self`
/// and blocks until the transport returns. Share between threads only behind a lock.
pub struct FeederBusClient<T> {
    transport: T,
    sequencer: TransactionSequencer,
    registry:  FeederRegistry,
}

impl<T> FeederBusClient<T>
where
    T: Transport,
{
    #[inline]
    pub fn new(transport: T) -> Self {
        Self::with_sequencer(transport, TransactionSequencer::default())
    }

    pub fn with_sequencer(transport: T, sequencer: TransactionSequencer) -> Self {
        Self {
            transport,
            sequencer,
            registry: FeederRegistry::default(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &FeederRegistry {
        &self.registry
    }

    #[inline]
    pub fn clear_registry(&mut self) {
        self.registry.clear()
    }

    #[inline]
    pub(crate) fn registry_mut(&mut self) -> &mut FeederRegistry {
        &mut self.registry
    }

    /// Transaction id the next exchange will carry.
    #[inline]
    pub fn next_transaction(&self) -> u8 {
        self.sequencer.peek()
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// One request/reply round with the device at `address`.
    ///
    /// The transaction id is consumed whatever the outcome. Failed exchanges are not
    /// retried.
    #[tracing::instrument(
        skip_all,
        fields(%address, %command, txn = tracing::field::Empty),
        err(level = "debug", Display)
    )]
    pub fn exchange(
        &mut self,
        address: Address,
        command: Command,
        payload: &[u8],
    ) -> Result<Reply, BusError> {
        let sent_id = self.sequencer.issue();
        tracing::Span::current().record("txn", &sent_id);

        let request = Frame::request(address, sent_id, command, payload)?;
        let line = codec::encode_line(request.to_bytes());
        tracing::debug!(%line, "sending feeder frame");

        let response = self.transport.send(&line)?;
        tracing::debug!(line = %response.trim_end(), "controller replied");

        let raw = codec::decode_reply(&response)?;

        validate(address, sent_id, &raw)
    }
}

fn validate(destination: Address, sent_id: u8, raw: &[u8]) -> Result<Reply, BusError> {
    let frame = Frame::from_bytes(raw)?;
    let header = frame.header;

    if header.destination != Address::HOST {
        tracing::error!(got = %header.destination, "received packet not addressed to host");

        return Err(BusError::Misdirected {
            destination: header.destination,
        });
    }

    if !destination.is_broadcast() && header.source != destination {
        tracing::error!(expected = %destination, got = %header.source, "received packet from unexpected sender");

        return Err(BusError::WrongSender {
            expected: destination,
            got:      header.source,
        });
    }

    if header.transaction != sent_id {
        tracing::error!(expected = sent_id, got = header.transaction, "received packet with wrong transaction id");

        return Err(BusError::StaleTransaction {
            expected: sent_id,
            got:      header.transaction,
        });
    }

    if !frame.length_consistent() {
        let actual = raw.len() - Frame::OVERHEAD;
        tracing::error!(declared = header.length, actual, "received packet with wrong payload length");

        return Err(BusError::LengthMismatch {
            declared: header.length,
            actual,
        });
    }

    let computed = frame.computed_checksum();
    if computed != frame.checksum {
        tracing::error!(received = frame.checksum, computed, "received packet with invalid checksum");

        return Err(BusError::ChecksumMismatch {
            received: frame.checksum,
            computed,
        });
    }

    Ok(Reply {
        source: header.source,
        body:   frame.into_body(),
    })
}
