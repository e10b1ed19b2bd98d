use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{KirinukiError, KirinukiResult};

/// Rectangle cut out of the source frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn validate(&self) -> KirinukiResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(KirinukiError::InvalidCrop(format!(
                "{}x{} at ({}, {})",
                self.width, self.height, self.x, self.y
            )));
        }
        Ok(())
    }

    /// Video filter in the form `crop=w:h:x:y`.
    pub fn filter(&self) -> String {
        format!(
            "crop={}:{}:{}:{}",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Parses the `w:h:x:y` form used by the ffmpeg crop filter.
impl FromStr for CropRegion {
    type Err = KirinukiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KirinukiError::InvalidCrop(s.to_string());
        let parts = s
            .split(':')
            .map(|part| part.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        let [width, height, x, y] = parts[..] else {
            return Err(invalid());
        };
        let region = Self::new(x, y, width, height);
        region.validate()?;
        Ok(region)
    }
}

/// Where the shared screen and the webcam overlay sit in a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropLayout {
    pub screen: CropRegion,
    pub webcam: CropRegion,
}

impl CropLayout {
    /// Screen is the whole frame. Webcam is a 20% x 25% box anchored at
    /// `(width, 0)`, which sits right of the frame and must usually be
    /// adjusted before rendering.
    pub fn default_for(width: u32, height: u32) -> Self {
        Self {
            screen: CropRegion::new(0, 0, width, height),
            webcam: CropRegion::new(width, 0, width / 5, height / 4),
        }
    }

    pub fn validate(&self) -> KirinukiResult<()> {
        self.screen.validate()?;
        self.webcam.validate()
    }
}
