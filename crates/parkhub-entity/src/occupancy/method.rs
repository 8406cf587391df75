//! Entry and exit methods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a vehicle was identified at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryMethod {
    /// Plate read by a camera.
    Ocr,
    /// Customer scanned a QR code bound to their vehicle.
    Qr,
    /// Operator typed the visitor in.
    Manual,
}

impl EntryMethod {
    /// Return the method as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Qr => "qr",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for EntryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ocr" => Ok(Self::Ocr),
            "qr" => Ok(Self::Qr),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown entry method '{other}'")),
        }
    }
}

/// How the departing session is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitMethod {
    /// By session id.
    #[serde(rename = "byId")]
    Id,
    /// By plate text.
    #[serde(rename = "byPlate")]
    Plate,
}

impl FromStr for ExitMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "byid" | "id" => Ok(Self::Id),
            "byplate" | "plate" => Ok(Self::Plate),
            other => Err(format!("unknown exit method '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!("OCR".parse::<EntryMethod>(), Ok(EntryMethod::Ocr));
        assert_eq!(" manual ".parse::<EntryMethod>(), Ok(EntryMethod::Manual));
        assert!("badge".parse::<EntryMethod>().is_err());
        assert_eq!("byId".parse::<ExitMethod>(), Ok(ExitMethod::Id));
        assert_eq!("byPlate".parse::<ExitMethod>(), Ok(ExitMethod::Plate));
        assert!("byTicket".parse::<ExitMethod>().is_err());
    }
}
