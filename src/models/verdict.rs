//! Classification labels produced by the validators.
//!
//! Every label has a total parser: codes outside the expected vocabulary
//! fall back to the safe default instead of failing.

use serde::{Deserialize, Serialize};

/// Side of the street relative to a segment's digitizing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Side {
    /// Parse a stored side code (`L`, `R`, `C`/`center`). Anything else is unknown.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "L" | "LEFT" => Side::Left,
            "R" | "RIGHT" => Side::Right,
            "C" | "CENTER" => Side::Center,
            _ => Side::Unknown,
        }
    }

    /// True for `L` and `R`
    pub fn is_lateral(&self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Mirror image: L and R swap, everything else is fixed.
    pub fn flipped(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
            Side::Center => "center",
            Side::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing declared and geometric sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideVerdict {
    Ok,
    /// The POI's link is suspect and should be reassigned
    Relink,
}

impl std::fmt::Display for SideVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideVerdict::Ok => write!(f, "ok"),
            SideVerdict::Relink => write!(f, "relink"),
        }
    }
}

/// Outcome of the multiply-digitized check for a POI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiDigitVerdict {
    Ok,
    /// Label only; nothing is ever removed
    Delete,
}

impl std::fmt::Display for MultiDigitVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultiDigitVerdict::Ok => write!(f, "ok"),
            MultiDigitVerdict::Delete => write!(f, "delete"),
        }
    }
}

/// Normalized multiply-digitized flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MultiDigit {
    Yes,
    No,
}

impl MultiDigit {
    /// Normalize a raw `MULTIDIGIT` code. `YES`/`Y` map to yes, everything
    /// else (including `NO`/`N`, blanks and garbage) maps to no.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "YES" | "Y" => MultiDigit::Yes,
            _ => MultiDigit::No,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            MultiDigit::Yes
        } else {
            MultiDigit::No
        }
    }

    pub fn is_yes(&self) -> bool {
        *self == MultiDigit::Yes
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MultiDigit::Yes => "YES",
            MultiDigit::No => "NO",
        }
    }
}

impl std::fmt::Display for MultiDigit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
