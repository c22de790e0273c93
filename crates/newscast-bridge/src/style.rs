use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Commentary style requested from the generation service.
///
/// The set is closed; the wire names are the ones the service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum StyleId {
    #[default]
    #[serde(rename = "Uwu")]
    Uwu,
    #[serde(rename = "RAP")]
    Rap,
    #[serde(rename = "Poetic")]
    Poetic,
    #[serde(rename = "Funny")]
    Funny,
    #[serde(rename = "Casual")]
    Casual,
}

/// Returned when a string does not name one of the known styles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown commentary style: {0:?}")]
pub struct UnknownStyle(pub String);

impl StyleId {
    /// Every selectable style, in display order.
    pub const ALL: [StyleId; 5] = [
        StyleId::Uwu,
        StyleId::Rap,
        StyleId::Poetic,
        StyleId::Funny,
        StyleId::Casual,
    ];

    /// Name sent on the wire and shown to the user.
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleId::Uwu => "Uwu",
            StyleId::Rap => "RAP",
            StyleId::Poetic => "Poetic",
            StyleId::Funny => "Funny",
            StyleId::Casual => "Casual",
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleId {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}
