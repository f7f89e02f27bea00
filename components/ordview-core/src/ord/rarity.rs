use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use super::{degree::Degree, sat::Sat};

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Mythic => "mythic",
        }
    }
}

impl Display for Rarity {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Sat> for Rarity {
    fn from(sat: Sat) -> Self {
        let Degree {
            hour,
            minute,
            second,
            third,
        } = sat.degree();

        if hour == 0 && minute == 0 && second == 0 && third == 0 {
            Self::Mythic
        } else if minute == 0 && second == 0 && third == 0 {
            Self::Legendary
        } else if minute == 0 && third == 0 {
            Self::Epic
        } else if second == 0 && third == 0 {
            Self::Rare
        } else if third == 0 {
            Self::Uncommon
        } else {
            Self::Common
        }
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "uncommon" => Ok(Self::Uncommon),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            "mythic" => Ok(Self::Mythic),
            _ => Err(format!("invalid rarity: {s}")),
        }
    }
}
