//! Defines the `EnsoPhase` enum, mapping the ENSO tags found in the station
//! spreadsheets to typed variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The El Niño–Southern Oscillation phase a monthly record belongs to.
///
/// Phases are supplied per row by the source spreadsheets (`Fase_ENSO` column);
/// this crate never computes them. The [`Display`](fmt::Display) form is the label
/// used inside the tables, so it can be fed straight back into a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnsoPhase {
    /// Warm phase, labelled `Niño`.
    Nino,
    /// Cold phase, labelled `Niña`.
    Nina,
    /// Neither warm nor cold, labelled `Neutro`.
    Neutral,
}

impl EnsoPhase {
    pub const ALL: [EnsoPhase; 3] = [EnsoPhase::Nino, EnsoPhase::Nina, EnsoPhase::Neutral];

    /// Label as it appears in the `Fase_ENSO` column.
    pub fn label(&self) -> &'static str {
        match self {
            EnsoPhase::Nino => "Niño",
            EnsoPhase::Nina => "Niña",
            EnsoPhase::Neutral => "Neutro",
        }
    }

    /// Parses a phase label, tolerating missing accents and English spellings.
    pub fn from_label(value: &str) -> Option<EnsoPhase> {
        match value.trim().to_lowercase().as_str() {
            "niño" | "nino" | "el niño" | "el nino" => Some(EnsoPhase::Nino),
            "niña" | "nina" | "la niña" | "la nina" => Some(EnsoPhase::Nina),
            "neutro" | "neutral" => Some(EnsoPhase::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for EnsoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for EnsoPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnsoPhase::from_label(s).ok_or_else(|| format!("Unknown ENSO phase '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_parser() {
        for phase in EnsoPhase::ALL {
            assert_eq!(EnsoPhase::from_label(phase.label()), Some(phase));
        }
    }

    #[test]
    fn test_unaccented_and_english_spellings() {
        assert_eq!(EnsoPhase::from_label("Nino"), Some(EnsoPhase::Nino));
        assert_eq!(EnsoPhase::from_label(" la nina "), Some(EnsoPhase::Nina));
        assert_eq!("Neutral".parse::<EnsoPhase>(), Ok(EnsoPhase::Neutral));
        assert!("Monsoon".parse::<EnsoPhase>().is_err());
    }
}
