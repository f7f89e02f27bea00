use super::{height::Height, sat::Sat, COIN_VALUE, SUBSIDY_HALVING_INTERVAL};

lazy_static! {
    static ref STARTING_SATS: Vec<Sat> = {
        let mut starting_sats = Vec::with_capacity(Epoch::FIRST_POST_SUBSIDY.0 as usize + 1);
        let mut mined = 0;
        for epoch in 0..=Epoch::FIRST_POST_SUBSIDY.0 {
            starting_sats.push(Sat(mined));
            mined += Epoch(epoch).subsidy() * SUBSIDY_HALVING_INTERVAL;
        }
        starting_sats
    };
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
pub struct Epoch(pub u64);

impl Epoch {
    pub(crate) const FIRST_POST_SUBSIDY: Epoch = Self(33);

    pub(crate) fn subsidy(self) -> u64 {
        if self < Self::FIRST_POST_SUBSIDY {
            (50 * COIN_VALUE) >> self.0
        } else {
            0
        }
    }

    pub(crate) fn starting_sat(self) -> Sat {
        STARTING_SATS
            .get(self.0 as usize)
            .copied()
            .unwrap_or(Sat(Sat::SUPPLY))
    }

    pub(crate) fn starting_height(self) -> Height {
        Height(self.0 * SUBSIDY_HALVING_INTERVAL)
    }
}

impl From<Sat> for Epoch {
    fn from(sat: Sat) -> Self {
        let following = STARTING_SATS.partition_point(|starting_sat| *starting_sat <= sat);
        Epoch(following.saturating_sub(1) as u64)
    }
}

impl From<Height> for Epoch {
    fn from(height: Height) -> Self {
        Self(height.0 / SUBSIDY_HALVING_INTERVAL)
    }
}

impl PartialEq<u64> for Epoch {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}
