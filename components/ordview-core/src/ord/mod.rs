pub mod degree;
pub mod epoch;
pub mod height;
pub mod inscription_id;
pub mod rarity;
pub mod sat;
pub mod sat_point;

use self::{height::Height, rarity::Rarity, sat::Sat};

const DIFFCHANGE_INTERVAL: u64 = 2016;
const SUBSIDY_HALVING_INTERVAL: u64 = 210_000;
const CYCLE_EPOCHS: u64 = 6;
pub const COIN_VALUE: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatClassification {
    pub coinbase_height: u64,
    pub rarity: Rarity,
}

/// Maps an ordinal number to the height of the block that mined it and its rarity.
///
/// Total over `u64`: ordinals past the last mined sat classify as `common`
/// at the first block without subsidy.
pub fn classify(ordinal_number: u64) -> SatClassification {
    let sat = Sat(ordinal_number);
    if ordinal_number >= Sat::SUPPLY {
        return SatClassification {
            coinbase_height: Height::FIRST_POST_SUBSIDY.n(),
            rarity: Rarity::Common,
        };
    }
    SatClassification {
        coinbase_height: sat.height().n(),
        rarity: sat.rarity(),
    }
}
