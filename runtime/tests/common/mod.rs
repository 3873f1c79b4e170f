#![allow(dead_code)]

use std::collections::{
    BTreeMap,
    VecDeque,
};

use message::{
    Address,
    Command,
    FeederId,
    Frame,
};

use leash_runtime::{
    transport,
    Transport,
};

pub fn trace_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn feeder_id(tag: u8) -> FeederId {
    let mut bytes = [0u8; FeederId::LEN];
    bytes[0] = 0xfe;
    bytes[FeederId::LEN - 1] = tag;

    FeederId::new(bytes)
}

/// Controller line carrying a reply frame built from its parts.
pub fn reply_line(source: u8, txn: u8, status: u8, payload: &[u8]) -> String {
    let frame = Frame::reply(Address::new(source), txn, status, payload).unwrap();
    codec::encode_reply(frame.to_bytes())
}

/// Plays back canned controller replies, recording every line the host sends.
#[derive(Default)]
pub struct ScriptedTransport {
    replies:   VecDeque<Result<String, transport::Error>>,
    pub lines: Vec<String>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, reply: impl Into<String>) -> Self {
        self.replies.push_back(Ok(reply.into()));
        self
    }

    pub fn then_err(mut self, err: transport::Error) -> Self {
        self.replies.push_back(Err(err));
        self
    }

    pub fn sent_frames(&self) -> Vec<Frame> {
        self.lines
            .iter()
            .map(|line| Frame::from_bytes(&codec::decode_command(line).unwrap()).unwrap())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, line: &str) -> Result<String, transport::Error> {
        self.lines.push(line.to_owned());
        self.replies.pop_front().unwrap_or(Err(transport::Error::Timeout))
    }
}

#[derive(Debug, Clone)]
pub struct SimFeeder {
    pub id:           FeederId,
    /// Replaces the identity bytes in get-identity replies.
    pub raw_identity: Option<Vec<u8>>,
    pub accepts_init: bool,
    pub initialized:  bool,
    pub version:      u8,
    pub ready:        bool,
    pub feeds:        Vec<i16>,
    pub identified:   usize,
}

impl SimFeeder {
    pub fn new(id: FeederId) -> Self {
        Self {
            id,
            raw_identity: None,
            accepts_init: true,
            initialized: false,
            version: 1,
            ready: true,
            feeds: vec![],
            identified: 0,
        }
    }

    pub fn refusing_init(mut self) -> Self {
        self.accepts_init = false;
        self
    }

    pub fn with_raw_identity(mut self, raw: &[u8]) -> Self {
        self.raw_identity = Some(raw.to_vec());
        self
    }
}

/// A bus of well-behaved feeders behind a controller that speaks the tunnel protocol.
#[derive(Default)]
pub struct SimulatedBus {
    pub feeders: BTreeMap<u8, SimFeeder>,
    pub sent:    Vec<Frame>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feeder(mut self, address: u8, feeder: SimFeeder) -> Self {
        self.feeders.insert(address, feeder);
        self
    }

    pub fn feeder(&self, address: u8) -> &SimFeeder {
        &self.feeders[&address]
    }

    fn find(&mut self, id: &[u8]) -> Option<(u8, &mut SimFeeder)> {
        self.feeders
            .iter_mut()
            .find(|(_, f)| f.id.as_bytes() == id)
            .map(|(addr, f)| (*addr, f))
    }

    fn respond(&mut self, request: &Frame) -> Option<Frame> {
        let txn = request.header.transaction;
        let dest = request.header.destination;
        let payload = request.payload();

        let (source, status, body): (u8, u8, Vec<u8>) = if dest.is_broadcast() {
            match request.command()? {
                Command::Identify => {
                    let (addr, feeder) = self.find(payload)?;
                    feeder.identified += 1;
                    (addr, 0, vec![])
                },
                Command::GetAddress => (self.find(payload)?.0, 0, vec![]),
                Command::ProgramAddress => {
                    let (id, new_address) = payload.split_at(FeederId::LEN);
                    let (old, _) = self.find(id)?;
                    let feeder = self.feeders.remove(&old)?;
                    self.feeders.insert(new_address[0], feeder);
                    (new_address[0], 0, vec![])
                },
                Command::UninitializedRespond => {
                    let (addr, feeder) = self.feeders.iter().find(|(_, f)| !f.initialized)?;
                    (*addr, 0, feeder.id.as_bytes().to_vec())
                },
                _ => return None,
            }
        } else {
            let addr = dest.get();
            let feeder = self.feeders.get_mut(&addr)?;

            match request.command()? {
                Command::GetIdentity => {
                    let identity = feeder
                        .raw_identity
                        .clone()
                        .unwrap_or_else(|| feeder.id.as_bytes().to_vec());
                    (addr, 0, identity)
                },
                Command::Initialize => {
                    if feeder.accepts_init && payload == feeder.id.as_bytes() {
                        feeder.initialized = true;
                        (addr, 0, vec![])
                    } else {
                        (addr, 1, vec![])
                    }
                },
                Command::GetVersion => (addr, 0, vec![feeder.version]),
                Command::FeedForward | Command::FeedBackward if !feeder.initialized => (addr, 1, vec![]),
                Command::FeedForward => {
                    feeder.feeds.push(payload[0] as i16);
                    (addr, 0, vec![])
                },
                Command::FeedBackward => {
                    feeder.feeds.push(-(payload[0] as i16));
                    (addr, 0, vec![])
                },
                Command::FeedStatus => (addr, if feeder.ready { 0 } else { 1 }, vec![]),
                Command::VendorOptions => (addr, 0, payload.iter().rev().copied().collect()),
                _ => return None,
            }
        };

        Some(Frame::reply(Address::new(source), txn, status, &body).unwrap())
    }
}

impl Transport for SimulatedBus {
    fn send(&mut self, line: &str) -> Result<String, transport::Error> {
        let raw = codec::decode_command(line).expect("host sends tunnel commands");
        let request = Frame::from_bytes(&raw).expect("host sends whole frames");

        assert!(request.checksum_valid(), "host frame checksum: {request}");
        assert!(request.length_consistent(), "host frame length: {request}");

        self.sent.push(request.clone());

        Ok(match self.respond(&request) {
            Some(reply) => codec::encode_reply(reply.to_bytes()),
            None => codec::timeout_reply(),
        })
    }
}
