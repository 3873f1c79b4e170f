//! Host side of the feeder bus: the transport contract, transaction sequencing,
//! reply validation and the typed feeder operations built on top of it.

mod client;
mod error;
mod feeder;
pub mod registry;
pub mod sequencer;
pub mod serial;
pub mod transport;

pub use client::{
    FeederBusClient,
    Reply,
};
pub use error::BusError;
pub use feeder::{
    Probe,
    ProbeOutcome,
    DEFAULT_SCAN,
};
pub use registry::{
    FeederRecord,
    FeederRegistry,
};
pub use sequencer::TransactionSequencer;
pub use serial::{
    SerialConfig,
    SerialTransport,
};
pub use transport::Transport;
