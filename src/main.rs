use eyre::{
    Result,
    WrapErr,
};
use structopt::StructOpt as _;

use leash::{
    bootstrap,
    options::{
        Action,
        Options,
    },
    trace,
};
use runtime::{
    FeederBusClient,
    ProbeOutcome,
    SerialTransport,
    Transport,
};

fn main() -> Result<()> {
    bootstrap!("starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let options: Options = Options::from_args();
    trace::init()?;

    let config = options.serial_config();
    tracing::info!(port = %config.port, baud = config.baud, timeout = ?config.timeout, "opening serial port");

    let transport = SerialTransport::open(&config).wrap_err_with(|| format!("opening {}", config.port))?;
    let mut client = FeederBusClient::new(transport);

    run(&mut client, options.action)
}

fn run<T>(client: &mut FeederBusClient<T>, action: Action) -> Result<()>
where
    T: Transport,
{
    match action {
        Action::Scan {
            start,
            end,
            json,
        } => {
            let probes = client.enumerate(start, end);

            if json {
                let records = client.registry().records().collect::<Vec<_>>();
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            for probe in &probes {
                match &probe.outcome {
                    ProbeOutcome::Absent(_) => {},
                    ProbeOutcome::Registered(id) => println!("{}\t{id}", probe.address),
                    ProbeOutcome::Rejected {
                        id,
                        error,
                    } => println!("{}\t{id}\tinit failed: {error}", probe.address),
                }
            }

            println!("{} feeder(s) registered", client.registry().len());
        },

        Action::Identity {
            address,
        } => println!("{}", client.get_identity(address)?),

        Action::Init {
            address,
            id,
        } => client.initialize(address, &id)?,

        Action::Version {
            address,
        } => println!("{}", client.get_version(address)?),

        Action::Feed {
            address,
            tenths,
            backward,
        } => {
            if backward {
                client.feed_backward(address, tenths)?;
            } else {
                client.feed_forward(address, tenths)?;
            }
        },

        Action::Status {
            address,
        } => {
            let ready = client.feed_status(address)?;
            println!("{}", if ready { "ready" } else { "busy" });
        },

        Action::Identify {
            id,
        } => client.identify(&id)?,

        Action::Locate {
            id,
        } => println!("{}", client.get_address(&id)?),

        Action::Program {
            id,
            address,
        } => client.program_address(&id, address)?,

        Action::Uninitialized => {
            let (address, id) = client.uninitialized_respond()?;
            println!("{address}\t{id}");
        },

        Action::Raw {
            address,
            command,
            payload,
        } => {
            let payload = hex::decode(payload.trim()).wrap_err("payload must be hex")?;
            let reply = client.exchange(address, command, &payload)?;

            println!("{}\t{}", reply.source(), hex::encode(reply.as_bytes()));
        },
    }

    Ok(())
}
