use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KirinukiError;

static TIMESTAMP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2})$").expect("valid regex"));

/// A position inside a recording, written as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl Timestamp {
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, KirinukiError> {
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err(KirinukiError::InvalidTimestamp(format!(
                "{hours:02}:{minutes:02}:{seconds:02}"
            )));
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn as_secs(&self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }
}

impl FromStr for Timestamp {
    type Err = KirinukiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KirinukiError::InvalidTimestamp(s.to_string());
        let captures = TIMESTAMP_REGEX.captures(s).ok_or_else(invalid)?;
        let part = |i: usize| captures[i].parse::<u8>().map_err(|_| invalid());
        Self::new(part(1)?, part(2)?, part(3)?).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Timestamp {
    type Error = KirinukiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}
