use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Firmware build as reported by `kern.osversion`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
pub enum OsBuild {
    #[strum(serialize = "13A340")]
    V13A340,
    #[strum(serialize = "13A342")]
    V13A342,
    #[strum(serialize = "13A343")]
    V13A343,
    #[strum(serialize = "13A344")]
    V13A344,
    #[strum(serialize = "13A404")]
    V13A404,
    #[strum(serialize = "13A405")]
    V13A405,
    #[strum(serialize = "13A452")]
    V13A452,
    #[strum(serialize = "13B138")]
    V13B138,
    #[strum(serialize = "13B143")]
    V13B143,
    #[strum(serialize = "13B144")]
    V13B144,
    #[strum(serialize = "13C75")]
    V13C75,
    #[strum(serialize = "13D15")]
    V13D15,
    #[strum(serialize = "13D20")]
    V13D20,
    #[strum(serialize = "13E233")]
    V13E233,
    #[strum(serialize = "13E234")]
    V13E234,
    #[strum(serialize = "13E236")]
    V13E236,
    #[strum(serialize = "13E237")]
    V13E237,
    #[strum(serialize = "13E238")]
    V13E238,
    #[strum(serialize = "13F69")]
    V13F69,
    #[strum(serialize = "13F72")]
    V13F72,
    #[strum(serialize = "13G34")]
    V13G34,
    #[strum(serialize = "13G35")]
    V13G35,
}

impl OsBuild {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// User-facing iOS version of the build (e.g., "9.3.2")
    pub fn ios_version(&self) -> &'static str {
        match self {
            Self::V13A340 | Self::V13A342 | Self::V13A343 | Self::V13A344 => "9.0",
            Self::V13A404 | Self::V13A405 => "9.0.1",
            Self::V13A452 => "9.0.2",
            Self::V13B138 | Self::V13B143 | Self::V13B144 => "9.1",
            Self::V13C75 => "9.2",
            Self::V13D15 | Self::V13D20 => "9.2.1",
            Self::V13E233 | Self::V13E234 | Self::V13E236 | Self::V13E237 => "9.3",
            Self::V13E238 => "9.3.1",
            Self::V13F69 | Self::V13F72 => "9.3.2",
            Self::V13G34 => "9.3.3",
            Self::V13G35 => "9.3.4",
        }
    }
}
