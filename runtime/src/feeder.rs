use std::ops::Range;

use bytes::Bytes;

use message::{
    Address,
    Command,
    FeederId,
};

use crate::{
    BusError,
    FeederBusClient,
    Reply,
    Transport,
};

/// Addresses probed by a default bus scan.
pub const DEFAULT_SCAN: Range<u8> = 1..50;

/// Result of probing one bus address during enumeration.
#[derive(Debug)]
pub struct Probe {
    pub address: Address,
    pub outcome: ProbeOutcome,
}

#[derive(Debug)]
pub enum ProbeOutcome {
    /// Nothing usable answered at this address.
    Absent(BusError),
    /// Identified, initialized and added to the registry.
    Registered(FeederId),
    /// A feeder identified itself but refused initialization.
    Rejected { id: FeederId, error: BusError },
}

impl ProbeOutcome {
    #[inline]
    pub fn registered(&self) -> Option<&FeederId> {
        match self {
            ProbeOutcome::Registered(id) => Some(id),
            _ => None,
        }
    }
}

fn expect_success(command: Command, reply: &Reply) -> Result<(), BusError> {
    match reply.status() {
        None => Err(BusError::MissingStatus {
            command,
        }),
        Some(0x00) => Ok(()),
        Some(status) => Err(BusError::DeviceRejected {
            command,
            status,
        }),
    }
}

fn identity_of(reply: &Reply) -> Result<FeederId, BusError> {
    FeederId::try_from(reply.payload()).map_err(|_| BusError::MalformedIdentity {
        len: reply.payload().len(),
    })
}

impl<T> FeederBusClient<T>
where
    T: Transport,
{
    #[tracing::instrument(skip(self), fields(%address), err(level = "debug", Display))]
    pub fn get_identity(&mut self, address: Address) -> Result<FeederId, BusError> {
        let reply = self.exchange(address, Command::GetIdentity, &[])?;
        expect_success(Command::GetIdentity, &reply)?;

        identity_of(&reply)
    }

    #[tracing::instrument(skip(self), fields(%address, %id), err(level = "warn", Display))]
    pub fn initialize(&mut self, address: Address, id: &FeederId) -> Result<(), BusError> {
        let reply = self.exchange(address, Command::Initialize, id.as_bytes())?;
        expect_success(Command::Initialize, &reply)
    }

    pub fn get_version(&mut self, address: Address) -> Result<u8, BusError> {
        let reply = self.exchange(address, Command::GetVersion, &[])?;
        expect_success(Command::GetVersion, &reply)?;

        match *reply.payload() {
            [version] => Ok(version),
            ref other => Err(BusError::UnexpectedPayload {
                command: Command::GetVersion,
                len:     other.len(),
            }),
        }
    }

    /// Advances the tape by `tenths` of a millimetre.
    #[tracing::instrument(skip(self), fields(%address), err(Display))]
    pub fn feed_forward(&mut self, address: Address, tenths: u8) -> Result<(), BusError> {
        let reply = self.exchange(address, Command::FeedForward, &[tenths])?;
        expect_success(Command::FeedForward, &reply)
    }

    #[tracing::instrument(skip(self), fields(%address), err(Display))]
    pub fn feed_backward(&mut self, address: Address, tenths: u8) -> Result<(), BusError> {
        let reply = self.exchange(address, Command::FeedBackward, &[tenths])?;
        expect_success(Command::FeedBackward, &reply)
    }

    /// Whether the last feed finished. A non-zero status reads as "not ready";
    /// transport and validation failures are still errors.
    pub fn feed_status(&mut self, address: Address) -> Result<bool, BusError> {
        let reply = self.exchange(address, Command::FeedStatus, &[])?;

        reply.status().map(|status| status == 0x00).ok_or(BusError::MissingStatus {
            command: Command::FeedStatus,
        })
    }

    /// Vendor-specific passthrough. Returns whatever follows the success status.
    pub fn vendor_options(&mut self, address: Address, payload: &[u8]) -> Result<Bytes, BusError> {
        let reply = self.exchange(address, Command::VendorOptions, payload)?;
        expect_success(Command::VendorOptions, &reply)?;

        Ok(reply.into_bytes().slice(1..))
    }

    /// Asks the feeder with `id` to make itself known (light, beep) wherever it sits.
    ///
    /// Sent to every device. The wire format has no collision handling, so this
    /// assumes only the addressed feeder answers.
    #[tracing::instrument(skip(self), fields(%id), err(Display))]
    pub fn identify(&mut self, id: &FeederId) -> Result<(), BusError> {
        let reply = self.exchange(Address::BROADCAST, Command::Identify, id.as_bytes())?;
        expect_success(Command::Identify, &reply)
    }

    /// Finds the bus address of the feeder with `id`. Broadcast, see [`Self::identify`].
    #[tracing::instrument(skip(self), fields(%id), err(Display))]
    pub fn get_address(&mut self, id: &FeederId) -> Result<Address, BusError> {
        let reply = self.exchange(Address::BROADCAST, Command::GetAddress, id.as_bytes())?;
        expect_success(Command::GetAddress, &reply)?;

        Ok(reply.source())
    }

    /// Assigns `new_address` to the feeder with `id`. Broadcast, see [`Self::identify`].
    #[tracing::instrument(skip(self), fields(%id, %new_address), err(Display))]
    pub fn program_address(&mut self, id: &FeederId, new_address: Address) -> Result<(), BusError> {
        if !new_address.is_unicast() {
            return Err(BusError::InvalidAddress(new_address));
        }

        let mut payload = Vec::with_capacity(FeederId::LEN + 1);
        payload.extend_from_slice(id.as_bytes());
        payload.push(new_address.get());

        let reply = self.exchange(Address::BROADCAST, Command::ProgramAddress, &payload)?;
        expect_success(Command::ProgramAddress, &reply)
    }

    /// Asks any feeder that has not been initialized yet to report itself.
    ///
    /// Broadcast with no collision resolution: with several uninitialized feeders on the
    /// bus, replies may collide and surface as a validation error.
    pub fn uninitialized_respond(&mut self) -> Result<(Address, FeederId), BusError> {
        let reply = self.exchange(Address::BROADCAST, Command::UninitializedRespond, &[])?;
        expect_success(Command::UninitializedRespond, &reply)?;

        Ok((reply.source(), identity_of(&reply)?))
    }

    /// Probes every unicast address in `start..end`, initializing whatever answers.
    ///
    /// One bad address never stops the scan. Registered feeders are added to the
    /// registry; everything else is reported in the returned probes.
    #[tracing::instrument(skip(self))]
    pub fn enumerate(&mut self, start: u8, end: u8) -> Vec<Probe> {
        let probes = (start..end)
            .map(Address::new)
            .filter(|address| address.is_unicast())
            .map(|address| Probe {
                address,
                outcome: self.probe(address),
            })
            .collect::<Vec<_>>();

        let registry = self.registry_mut();
        for probe in &probes {
            let Some(&id) = probe.outcome.registered() else {
                continue;
            };

            if let Some(old) = registry.insert(probe.address, id) {
                tracing::warn!(address = %probe.address, %old, new = %id, "feeder at address replaced");
            }
        }

        tracing::info!(
            probed = probes.len(),
            registered = probes.iter().filter(|p| p.outcome.registered().is_some()).count(),
            "bus scan complete"
        );

        probes
    }

    fn probe(&mut self, address: Address) -> ProbeOutcome {
        let id = match self.get_identity(address) {
            Ok(id) => id,
            Err(e) => {
                tracing::trace!(%address, error = %e, "no feeder");
                return ProbeOutcome::Absent(e);
            },
        };

        match self.initialize(address, &id) {
            Ok(()) => {
                tracing::info!(%address, %id, "initialized feeder");
                ProbeOutcome::Registered(id)
            },
            Err(error) => {
                tracing::warn!(%address, %id, %error, "found feeder but couldn't initialize");
                ProbeOutcome::Rejected {
                    id,
                    error,
                }
            },
        }
    }
}
