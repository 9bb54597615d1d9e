use std::fmt::Display;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Set of analog video standards.
///
/// Bit assignments follow the V4L2 `v4l2_std_id` layout so the values can be
/// passed through from capture drivers unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VideoStandardSet(pub u64);

impl VideoStandardSet {
    pub const EMPTY: Self = Self(0);

    pub const PAL_B: Self = Self(0x0000_0001);
    pub const PAL_B1: Self = Self(0x0000_0002);
    pub const PAL_G: Self = Self(0x0000_0004);
    pub const PAL_H: Self = Self(0x0000_0008);
    pub const PAL_I: Self = Self(0x0000_0010);
    pub const PAL_D: Self = Self(0x0000_0020);
    pub const PAL_D1: Self = Self(0x0000_0040);
    pub const PAL_K: Self = Self(0x0000_0080);
    pub const PAL_M: Self = Self(0x0000_0100);
    pub const PAL_N: Self = Self(0x0000_0200);
    pub const PAL_NC: Self = Self(0x0000_0400);
    pub const PAL_60: Self = Self(0x0000_0800);

    pub const NTSC_M: Self = Self(0x0000_1000);
    pub const NTSC_M_JP: Self = Self(0x0000_2000);
    pub const NTSC_443: Self = Self(0x0000_4000);
    pub const NTSC_M_KR: Self = Self(0x0000_8000);

    pub const SECAM_B: Self = Self(0x0001_0000);
    pub const SECAM_D: Self = Self(0x0002_0000);
    pub const SECAM_G: Self = Self(0x0004_0000);
    pub const SECAM_H: Self = Self(0x0008_0000);
    pub const SECAM_K: Self = Self(0x0010_0000);
    pub const SECAM_K1: Self = Self(0x0020_0000);
    pub const SECAM_L: Self = Self(0x0040_0000);
    pub const SECAM_LC: Self = Self(0x0080_0000);

    pub const PAL_BG: Self = Self(Self::PAL_B.0 | Self::PAL_B1.0 | Self::PAL_G.0);
    pub const PAL_DK: Self = Self(Self::PAL_D.0 | Self::PAL_D1.0 | Self::PAL_K.0);
    pub const PAL: Self = Self(Self::PAL_BG.0 | Self::PAL_DK.0 | Self::PAL_H.0 | Self::PAL_I.0);
    pub const NTSC: Self = Self(Self::NTSC_M.0 | Self::NTSC_M_JP.0 | Self::NTSC_M_KR.0);
    pub const SECAM: Self = Self(
        Self::SECAM_B.0
            | Self::SECAM_D.0
            | Self::SECAM_G.0
            | Self::SECAM_H.0
            | Self::SECAM_K.0
            | Self::SECAM_K1.0
            | Self::SECAM_L.0
            | Self::SECAM_LC.0,
    );

    /// All 525 line, 60 field standards.
    pub const SET_525_60: Self =
        Self(Self::NTSC.0 | Self::NTSC_443.0 | Self::PAL_M.0 | Self::PAL_60.0);

    /// All 625 line, 50 field standards.
    pub const SET_625_50: Self =
        Self(Self::PAL.0 | Self::PAL_N.0 | Self::PAL_NC.0 | Self::SECAM.0);

    pub const ALL: Self = Self(Self::SET_525_60.0 | Self::SET_625_50.0);

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of lines per frame implied by this set, or `None` when the set
    /// is empty or mixes 525 and 625 line standards.
    pub const fn scanning(self) -> Option<u32> {
        let is_525 = self.intersects(Self::SET_525_60);
        let is_625 = self.intersects(Self::SET_625_50);

        match (is_525, is_625) {
            (true, false) => Some(525),
            (false, true) => Some(625),
            _ => None,
        }
    }

    /// The full standard set belonging to a line count.
    pub const fn from_scanning(scanning: u32) -> Self {
        match scanning {
            525 => Self::SET_525_60,
            625 => Self::SET_625_50,
            _ => Self::EMPTY,
        }
    }
}

impl BitOr for VideoStandardSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for VideoStandardSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for VideoStandardSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for VideoStandardSet {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl Display for VideoStandardSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scanning() {
            Some(525) => write!(f, "525/60 ({:#x})", self.0),
            Some(_) => write!(f, "625/50 ({:#x})", self.0),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

#[test]
fn scanning_from_set() {
    assert_eq!(VideoStandardSet::PAL_BG.scanning(), Some(625));
    assert_eq!(VideoStandardSet::NTSC_M_JP.scanning(), Some(525));
    assert_eq!(VideoStandardSet::EMPTY.scanning(), None);
    assert_eq!(
        (VideoStandardSet::PAL_I | VideoStandardSet::NTSC_M).scanning(),
        None
    );
    assert!(VideoStandardSet::from_scanning(625).contains(VideoStandardSet::SECAM_L));
}
