use std::collections::BTreeMap;

use message::{
    Address,
    FeederId,
};

/// One initialized feeder.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FeederRecord {
    pub address: Address,
    pub id:      FeederId,
}

/// Feeders found by enumeration, keyed by bus address.
///
/// Only the bus client adds records; callers can read or [`clear`](Self::clear) it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeederRegistry {
    feeders: BTreeMap<Address, FeederId>,
}

impl FeederRegistry {
    /// Returns the identity previously held at `address`, if it differed.
    pub(crate) fn insert(&mut self, address: Address, id: FeederId) -> Option<FeederId> {
        self.feeders.insert(address, id).filter(|old| *old != id)
    }

    #[inline]
    pub fn get(&self, address: Address) -> Option<&FeederId> {
        self.feeders.get(&address)
    }

    pub fn address_of(&self, id: &FeederId) -> Option<Address> {
        self.feeders.iter().find(|(_, known)| *known == id).map(|(addr, _)| *addr)
    }

    #[inline]
    pub fn contains(&self, address: Address) -> bool {
        self.feeders.contains_key(&address)
    }

    /// Records in ascending address order.
    pub fn records(&self) -> impl Iterator<Item = FeederRecord> + '_ {
        self.feeders.iter().map(|(&address, &id)| FeederRecord {
            address,
            id,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.feeders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.feeders.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.feeders.clear()
    }
}
