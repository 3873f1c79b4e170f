use std::sync::{
    atomic::{
        AtomicUsize,
        Ordering,
    },
    Arc,
};

use tracing::Level;
use tracing_subscriber::{
    layer::Context,
    prelude::*,
    Layer,
};

use message::{
    Address,
    Command,
};

use leash_runtime::{
    BusError,
    FeederBusClient,
    ProbeOutcome,
    DEFAULT_SCAN,
};

use common::{
    feeder_id,
    SimFeeder,
    SimulatedBus,
};

mod common;

fn client(bus: SimulatedBus) -> FeederBusClient<SimulatedBus> {
    common::trace_init();
    FeederBusClient::new(bus)
}

fn two_feeders() -> SimulatedBus {
    SimulatedBus::new()
        .with_feeder(3, SimFeeder::new(feeder_id(3)))
        .with_feeder(7, SimFeeder::new(feeder_id(7)))
}

#[test]
fn registers_exactly_the_responders() {
    let mut client = client(two_feeders());

    let probes = client.enumerate(DEFAULT_SCAN.start, DEFAULT_SCAN.end);
    assert_eq!(probes.len(), 49);

    for probe in &probes {
        match probe.address.get() {
            3 | 7 => assert_eq!(probe.outcome.registered(), Some(&feeder_id(probe.address.get()))),
            _ => assert!(matches!(probe.outcome, ProbeOutcome::Absent(BusError::Timeout))),
        }
    }

    let registered = client.registry().records().map(|r| r.address.get()).collect::<Vec<_>>();
    assert_eq!(registered, vec![3, 7]);
    assert_eq!(client.registry().address_of(&feeder_id(7)), Some(Address::new(7)));

    assert!(client.transport().feeder(3).initialized);
    assert!(client.transport().feeder(7).initialized);

    // one get-identity per address plus one initialize per responder
    assert_eq!(client.transport().sent.len(), 49 + 2);
    assert_eq!(client.next_transaction(), 51);
}

#[test]
fn rejected_init_does_not_stop_the_scan() {
    let bus = SimulatedBus::new()
        .with_feeder(2, SimFeeder::new(feeder_id(2)).refusing_init())
        .with_feeder(4, SimFeeder::new(feeder_id(4)));
    let mut client = client(bus);

    let probes = client.enumerate(1, 6);

    match &probes[1].outcome {
        ProbeOutcome::Rejected {
            id,
            error,
        } => {
            assert_eq!(*id, feeder_id(2));
            assert!(matches!(error, BusError::DeviceRejected {
                command: Command::Initialize,
                status:  1,
            }));
        },
        other => panic!("expected rejection, got {other:?}"),
    }

    assert!(probes[3].outcome.registered().is_some());
    assert!(!client.registry().contains(Address::new(2)));
    assert_eq!(client.registry().len(), 1);
}

#[test]
fn short_identity_reads_as_absent() {
    let bus = SimulatedBus::new().with_feeder(5, SimFeeder::new(feeder_id(5)).with_raw_identity(&[0xab; 10]));
    let mut client = client(bus);

    let probes = client.enumerate(5, 6);

    assert!(matches!(probes[0].outcome, ProbeOutcome::Absent(BusError::MalformedIdentity {
        len: 10,
    })));
    assert!(client.registry().is_empty());
    assert!(!client.transport().feeder(5).initialized);
}

#[test]
fn never_probes_reserved_addresses() {
    let mut client = client(SimulatedBus::new());

    let probes = client.enumerate(0, 200);
    assert_eq!(probes.len(), 127);

    let sent = &client.transport().sent;
    assert_eq!(sent.len(), 127);
    assert!(sent.iter().all(|f| f.header.destination.is_unicast()));
    assert!(sent.iter().all(|f| f.command() == Some(Command::GetIdentity)));
}

#[test]
fn empty_range_sends_nothing() {
    let mut client = client(two_feeders());

    assert!(client.enumerate(10, 10).is_empty());
    assert!(client.enumerate(10, 3).is_empty());
    assert!(client.transport().sent.is_empty());
}

#[test]
fn registry_persists_until_cleared() {
    let mut client = client(two_feeders());

    client.enumerate(1, 5);
    assert_eq!(client.registry().len(), 1);

    // a later scan that misses address 3 keeps its record
    client.enumerate(5, 10);
    let registered = client.registry().records().map(|r| r.address.get()).collect::<Vec<_>>();
    assert_eq!(registered, vec![3, 7]);

    client.clear_registry();
    assert!(client.registry().is_empty());
}

#[test]
fn feeding_after_enumeration() -> eyre::Result<()> {
    let mut client = client(two_feeders());
    let feeder = Address::new(3);

    // not yet initialized
    assert!(matches!(client.feed_forward(feeder, 40), Err(BusError::DeviceRejected {
        command: Command::FeedForward,
        ..
    })));

    client.enumerate(1, 10);

    client.feed_forward(feeder, 40)?;
    client.feed_backward(feeder, 20)?;
    assert_eq!(client.transport().feeder(3).feeds, vec![40, -20]);

    assert!(client.feed_status(feeder)?);
    client.transport_mut().feeders.get_mut(&3).unwrap().ready = false;
    assert!(!client.feed_status(feeder)?);

    assert_eq!(client.get_version(feeder)?, 1);
    assert_eq!(&client.vendor_options(feeder, &[1, 2, 3])?[..], &[3, 2, 1]);

    Ok(())
}

#[test]
fn absent_feeder_times_out() {
    let mut client = client(two_feeders());

    assert!(client.feed_status(Address::new(9)).unwrap_err().is_timeout());
    assert!(client.get_identity(Address::new(9)).unwrap_err().is_timeout());
}

#[test]
fn broadcast_lookup_and_identify() -> eyre::Result<()> {
    let mut client = client(two_feeders());

    assert_eq!(client.get_address(&feeder_id(7))?, Address::new(7));

    client.identify(&feeder_id(3))?;
    assert_eq!(client.transport().feeder(3).identified, 1);

    // nobody has this id
    assert!(client.identify(&feeder_id(99)).unwrap_err().is_timeout());

    Ok(())
}

#[test]
fn program_address_moves_the_feeder() -> eyre::Result<()> {
    let mut client = client(two_feeders());

    client.program_address(&feeder_id(7), Address::new(20))?;

    assert!(!client.transport().feeders.contains_key(&7));
    assert_eq!(client.transport().feeder(20).id, feeder_id(7));
    assert_eq!(client.get_identity(Address::new(20))?, feeder_id(7));

    let sent = client.next_transaction();
    assert!(matches!(client.program_address(&feeder_id(7), Address::HOST), Err(BusError::InvalidAddress(_))));
    assert_eq!(client.next_transaction(), sent);

    Ok(())
}

#[test]
fn uninitialized_respond_finds_the_newcomer() -> eyre::Result<()> {
    let mut client = client(two_feeders());

    client.enumerate(1, 5);
    assert_eq!(client.uninitialized_respond()?, (Address::new(7), feeder_id(7)));

    client.enumerate(5, 10);
    assert!(client.uninitialized_respond().unwrap_err().is_timeout());

    Ok(())
}

/// Counts events at one level.
#[derive(Clone)]
struct LevelCount {
    level: Level,
    seen:  Arc<AtomicUsize>,
}

impl LevelCount {
    fn new(level: Level) -> Self {
        Self {
            level,
            seen: Arc::default(),
        }
    }

    fn get(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

impl<S> Layer<S> for LevelCount
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == self.level {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn scanning_empty_addresses_logs_no_errors() {
    let errors = LevelCount::new(Level::ERROR);
    let warnings = LevelCount::new(Level::WARN);
    let subscriber = tracing_subscriber::registry().with(errors.clone()).with(warnings.clone());

    let bus = SimulatedBus::new()
        .with_feeder(4, SimFeeder::new(feeder_id(4)).refusing_init())
        .with_feeder(9, SimFeeder::new(feeder_id(9)).with_raw_identity(&[0xab; 10]));

    let (empty, mixed) = tracing::subscriber::with_default(subscriber, || {
        let empty = FeederBusClient::new(SimulatedBus::new()).enumerate(1, 50);
        let mixed = FeederBusClient::new(bus).enumerate(1, 50);

        (empty, mixed)
    });

    assert_eq!(empty.len(), 49);
    assert_eq!(mixed.len(), 49);
    assert_eq!(errors.get(), 0);

    // the refused initialization is the only thing worth a warning
    assert!(warnings.get() >= 1);
    assert!(matches!(mixed[3].outcome, ProbeOutcome::Rejected { .. }));
}

#[test]
fn structural_failures_are_errors() {
    let errors = LevelCount::new(Level::ERROR);
    let subscriber = tracing_subscriber::registry().with(errors.clone());

    let mut bad_checksum = message::Frame::reply(Address::new(5), 0, 0x00, &[]).unwrap().to_bytes();
    bad_checksum[message::Frame::CHECKSUM_OFFSET] ^= 0x01;

    let transport = common::ScriptedTransport::new().then(codec::encode_reply(&bad_checksum));
    let result = tracing::subscriber::with_default(subscriber, || {
        FeederBusClient::new(transport).feed_status(Address::new(5))
    });

    assert!(matches!(result, Err(BusError::ChecksumMismatch { .. })));
    assert_eq!(errors.get(), 1);
}
