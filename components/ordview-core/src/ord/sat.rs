use std::ops::{Add, AddAssign};

use super::{degree::Degree, epoch::Epoch, height::Height, rarity::Rarity, *};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Sat(pub u64);

impl Sat {
    pub(crate) const LAST: Self = Self(Self::SUPPLY - 1);
    pub(crate) const SUPPLY: u64 = 2099999997690000;

    pub(crate) fn n(self) -> u64 {
        self.0
    }

    /// Only meaningful below `SUPPLY`.
    pub(crate) fn height(self) -> Height {
        self.epoch().starting_height() + self.epoch_position() / self.epoch().subsidy()
    }

    pub(crate) fn cycle(self) -> u64 {
        Epoch::from(self).0 / CYCLE_EPOCHS
    }

    pub(crate) fn epoch(self) -> Epoch {
        self.into()
    }

    pub(crate) fn third(self) -> u64 {
        self.epoch_position() % self.epoch().subsidy()
    }

    pub(crate) fn epoch_position(self) -> u64 {
        self.0 - self.epoch().starting_sat().0
    }

    pub(crate) fn degree(self) -> Degree {
        self.into()
    }

    pub(crate) fn rarity(self) -> Rarity {
        self.into()
    }
}

impl PartialEq<u64> for Sat {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<u64> for Sat {
    fn partial_cmp(&self, other: &u64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl Add<u64> for Sat {
    type Output = Self;

    fn add(self, other: u64) -> Sat {
        Sat(self.0 + other)
    }
}

impl AddAssign<u64> for Sat {
    fn add_assign(&mut self, other: u64) {
        *self = Sat(self.0 + other);
    }
}
