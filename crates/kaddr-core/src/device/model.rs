use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Hardware model as reported by `hw.model`
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
#[allow(clippy::upper_case_acronyms)]
pub enum Model {
    N94AP,
    N41AP,
    N42AP,
    N48AP,
    N49AP,
    N51AP,
    N53AP,
    N61AP,
    N56AP,
    N71AP,
    N71mAP,
    N66AP,
    N66mAP,
    N69AP,
    N69uAP,

    N78AP,
    N78aAP,
    N102AP,

    K93AP,
    K94AP,
    K95AP,
    K93AAP,
    J1AP,
    J2AP,
    J2AAP,
    P101AP,
    P102AP,
    P103AP,
    J71AP,
    J72AP,
    J73AP,
    J81AP,
    J82AP,
    J98aAP,
    J99aAP,
    J127AP,
    J128AP,

    P105AP,
    P106AP,
    P107AP,
    J85AP,
    J86AP,
    J87AP,
    J85mAP,
    J86mAP,
    J87mAP,
    J96AP,
    J97AP,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Product name the model ships as
    pub fn marketing_name(&self) -> &'static str {
        match self {
            Self::N94AP => "iPhone 4s",
            Self::N41AP | Self::N42AP => "iPhone 5",
            Self::N48AP | Self::N49AP => "iPhone 5c",
            Self::N51AP | Self::N53AP => "iPhone 5s",
            Self::N61AP => "iPhone 6",
            Self::N56AP => "iPhone 6+",
            Self::N71AP | Self::N71mAP => "iPhone 6s",
            Self::N66AP | Self::N66mAP => "iPhone 6s+",
            Self::N69AP | Self::N69uAP => "iPhone SE",
            Self::N78AP | Self::N78aAP => "iPod touch 5G",
            Self::N102AP => "iPod touch 6G",
            Self::K93AP | Self::K94AP | Self::K95AP | Self::K93AAP => "iPad 2",
            Self::J1AP | Self::J2AP | Self::J2AAP => "iPad 3",
            Self::P101AP | Self::P102AP | Self::P103AP => "iPad 4",
            Self::J71AP | Self::J72AP | Self::J73AP => "iPad Air",
            Self::J81AP | Self::J82AP => "iPad Air 2",
            Self::J98aAP | Self::J99aAP => "iPad Pro (12.9)",
            Self::J127AP | Self::J128AP => "iPad Pro (9.7)",
            Self::P105AP | Self::P106AP | Self::P107AP => "iPad Mini",
            Self::J85AP | Self::J86AP | Self::J87AP => "iPad Mini 2",
            Self::J85mAP | Self::J86mAP | Self::J87mAP => "iPad Mini 3",
            Self::J96AP | Self::J97AP => "iPad Mini 4",
        }
    }
}
