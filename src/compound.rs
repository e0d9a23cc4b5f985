use crate::error::StrategyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dry tyre compound. The numeric codes are the single encoding shared by
/// training-time feature preparation and prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
}

impl Compound {
    pub const ALL: [Compound; 3] = [Compound::Soft, Compound::Medium, Compound::Hard];

    /// Feature code fed to the lap-time model.
    pub fn code(self) -> u8 {
        match self {
            Compound::Soft => 0,
            Compound::Medium => 1,
            Compound::Hard => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Compound::Soft),
            1 => Some(Compound::Medium),
            2 => Some(Compound::Hard),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Compound::Soft => "Soft",
            Compound::Medium => "Medium",
            Compound::Hard => "Hard",
        }
    }
}

// timing feeds report "SOFT", the UI offers "Soft"; both land here
impl FromStr for Compound {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SOFT" => Ok(Compound::Soft),
            "MEDIUM" => Ok(Compound::Medium),
            "HARD" => Ok(Compound::Hard),
            _ => Err(StrategyError::invalid_compound(s)),
        }
    }
}

impl TryFrom<String> for Compound {
    type Error = StrategyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for compound in Compound::ALL {
            assert_eq!(Compound::from_code(compound.code()), Some(compound));
        }
        assert_eq!(Compound::from_code(3), None);
    }

    #[test]
    fn fixed_code_table() {
        assert_eq!(Compound::Soft.code(), 0);
        assert_eq!(Compound::Medium.code(), 1);
        assert_eq!(Compound::Hard.code(), 2);
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!("SOFT".parse::<Compound>().unwrap(), Compound::Soft);
        assert_eq!("Medium".parse::<Compound>().unwrap(), Compound::Medium);
        assert_eq!(" hard ".parse::<Compound>().unwrap(), Compound::Hard);
    }

    #[test]
    fn unknown_compound_is_rejected() {
        for bad in ["Wet", "INTERMEDIATE", "", "C3"] {
            let err = bad.parse::<Compound>().unwrap_err();
            assert!(matches!(err, StrategyError::InvalidCompound { .. }), "{bad}");
        }
    }

    #[test]
    fn deserializes_from_any_case() {
        let c: Compound = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(c, Compound::Medium);
        assert!(serde_json::from_str::<Compound>("\"Wet\"").is_err());
        assert_eq!(serde_json::to_string(&Compound::Hard).unwrap(), "\"Hard\"");
    }
}
