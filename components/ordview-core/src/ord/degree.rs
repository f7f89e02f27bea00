use std::fmt::{Display, Formatter};

use super::{sat::Sat, DIFFCHANGE_INTERVAL, SUBSIDY_HALVING_INTERVAL};

/// Position of a sat as `hour°minute′second″third‴`.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Degree {
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
    pub third: u64,
}

impl Display for Degree {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}°{}′{}″{}‴",
            self.hour, self.minute, self.second, self.third
        )
    }
}

impl From<Sat> for Degree {
    fn from(sat: Sat) -> Self {
        let height = sat.height().n();
        Degree {
            hour: sat.cycle(),
            minute: height % SUBSIDY_HALVING_INTERVAL,
            second: height % DIFFCHANGE_INTERVAL,
            third: sat.third(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{epoch::Epoch, height::Height};
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Sat(0).degree().to_string(), "0°0′0″0‴");
        assert_eq!(Sat(1).degree().to_string(), "0°0′0″1‴");
    }

    #[test]
    fn from_sat() {
        assert_eq!(
            Degree::from(Height(2016).starting_sat()),
            Degree {
                hour: 0,
                minute: 2016,
                second: 0,
                third: 0
            }
        );
        assert_eq!(
            Degree::from(Epoch(1).starting_sat()),
            Degree {
                hour: 0,
                minute: 0,
                second: 336,
                third: 0
            }
        );
        assert_eq!(Degree::from(Epoch(6).starting_sat()).hour, 1);
    }
}
