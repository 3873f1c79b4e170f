use std::time::Duration;

use message::{
    Address,
    Command,
    FeederId,
};
use runtime::SerialConfig;
use tap::Pipe;

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
#[structopt(about = "talk to feeders on the controller's RS-485 bus")]
pub struct Options {
    #[structopt(long = "serial-port", required = true)]
    pub port: String,

    #[structopt(long = "baud", default_value = "115200")]
    pub baud: u32,

    /// How long to wait for each reply line.
    #[structopt(long = "timeout-ms", default_value = "1000")]
    pub timeout_ms: u64,

    #[structopt(subcommand)]
    pub action: Action,
}

impl Options {
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            port:    self.port.clone(),
            baud:    self.baud,
            timeout: self.timeout_ms.pipe(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub enum Action {
    /// Probe a range of addresses and initialize every feeder found.
    Scan {
        #[structopt(long, default_value = "1")]
        start: u8,

        /// Exclusive.
        #[structopt(long, default_value = "50")]
        end: u8,

        /// Print the registry as JSON.
        #[structopt(long)]
        json: bool,
    },

    Identity {
        address: Address,
    },

    Init {
        address: Address,
        id:      FeederId,
    },

    Version {
        address: Address,
    },

    /// Move the tape by a number of tenths of a millimetre.
    Feed {
        address: Address,
        tenths:  u8,

        #[structopt(long)]
        backward: bool,
    },

    Status {
        address: Address,
    },

    /// Ask the feeder with this id to make itself known.
    Identify {
        id: FeederId,
    },

    /// Find the address of the feeder with this id.
    Locate {
        id: FeederId,
    },

    Program {
        id:      FeederId,
        address: Address,
    },

    /// Ask an uninitialized feeder to report itself.
    Uninitialized,

    /// Send an arbitrary command and print the reply body.
    Raw {
        address: Address,
        command: Command,

        /// Hex-encoded payload.
        #[structopt(default_value = "")]
        payload: String,
    },
}
