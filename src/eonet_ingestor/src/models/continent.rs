use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Continent labels produced by the bounding-box classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Europe,
    Africa,
    Asia,
    Oceania,
    Antarctica,
}

impl Continent {
    pub const ALL: [Continent; 7] = [
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Europe,
        Continent::Africa,
        Continent::Asia,
        Continent::Oceania,
        Continent::Antarctica,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Europe => "Europe",
            Continent::Africa => "Africa",
            Continent::Asia => "Asia",
            Continent::Oceania => "Oceania",
            Continent::Antarctica => "Antarctica",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown continent name.
#[derive(Debug, thiserror::Error)]
#[error("unknown continent: {0:?}")]
pub struct UnknownContinent(pub String);

impl FromStr for Continent {
    type Err = UnknownContinent;

    /// Case-insensitive; accepts `_`/`-` in place of spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['_', '-'], " ").to_lowercase();
        Continent::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == wanted)
            .ok_or_else(|| UnknownContinent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_spellings() {
        assert_eq!("north_america".parse::<Continent>().unwrap(), Continent::NorthAmerica);
        assert_eq!(" EUROPE ".parse::<Continent>().unwrap(), Continent::Europe);
        assert!("Atlantis".parse::<Continent>().is_err());
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Continent::SouthAmerica).unwrap();
        assert_eq!(json, "\"South America\"");
    }
}
