use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Printing technique understood by the remote renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Technique {
    DirectToGarment,
    FilmTransfer,
    Embroidery,
    DigitalSublimation,
}

impl Technique {
    pub const ALL: [Technique; 4] = [
        Technique::DirectToGarment,
        Technique::FilmTransfer,
        Technique::Embroidery,
        Technique::DigitalSublimation,
    ];

    /// Wire identifier, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Technique::DirectToGarment => "direct-to-garment",
            Technique::FilmTransfer => "film-transfer",
            Technique::Embroidery => "embroidery",
            Technique::DigitalSublimation => "digital-sublimation",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown printing technique `{0}`")]
pub struct ParseTechniqueError(pub String);

impl FromStr for Technique {
    type Err = ParseTechniqueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "direct-to-garment" | "dtg" => Ok(Technique::DirectToGarment),
            "film-transfer" | "dtf" | "dtfilm" => Ok(Technique::FilmTransfer),
            "embroidery" => Ok(Technique::Embroidery),
            "digital-sublimation" | "sublimation" => Ok(Technique::DigitalSublimation),
            _ => Err(ParseTechniqueError(value.to_string())),
        }
    }
}
