use std::fmt::Display;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};
use std::str::FromStr;

use crate::structs::videostd::VideoStandardSet;
use crate::utils::errors::ServiceParseError;

/// A data service which can be transmitted in the vertical blanking interval.
///
/// Each variant is a single bit so services combine into a [`ServiceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Service {
    TeletextBL10_625 = 0x0000_0001,
    TeletextBL25_625 = 0x0000_0002,
    Vps = 0x0000_0004,
    Caption625F1 = 0x0000_0008,
    Caption625F2 = 0x0000_0010,
    Caption525F1 = 0x0000_0020,
    Caption525F2 = 0x0000_0040,
    DoubleCaption525 = 0x0000_0080,
    Wss625 = 0x0000_0400,
    WssCpr1204 = 0x0000_0800,
    VpsF2 = 0x0000_1000,
    TeletextA = 0x0000_2000,
    TeletextC625 = 0x0000_4000,
    TeletextD625 = 0x0000_8000,
    TeletextB525 = 0x0001_0000,
    TeletextC525 = 0x0002_0000,
    TeletextD525 = 0x0004_0000,
}

/// Line code of the payload and the order bits are packed into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    /// Non-return to zero, least significant bit first.
    NrzLsb,
    /// Non-return to zero, most significant bit first.
    NrzMsb,
    /// Biphase (Manchester), least significant bit first.
    BiphaseLsb,
    /// Biphase (Manchester), most significant bit first.
    BiphaseMsb,
}

impl Modulation {
    pub const fn is_biphase(self) -> bool {
        matches!(self, Modulation::BiphaseLsb | Modulation::BiphaseMsb)
    }

    pub const fn is_msb_first(self) -> bool {
        matches!(self, Modulation::NrzMsb | Modulation::BiphaseMsb)
    }
}

/// Decoding the service requires known line numbers.
pub const SP_LINE_NUM: u32 = 1 << 0;

/// Decoding the service requires known field parity.
pub const SP_FIELD_NUM: u32 = 1 << 1;

/// Transmission parameters of a VBI data service.
///
/// Bit counts and patterns are in transmission order: the first bit on the
/// wire is the most significant bit of `cri_frc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceParams {
    pub service: Service,
    pub label: &'static str,
    pub videostd_set: VideoStandardSet,

    /// First and last ITU-R line carrying the service, per field.
    /// Zero means the service is not transmitted on that field.
    pub first: [u32; 2],
    pub last: [u32; 2],

    /// Leading edge of the clock run-in relative to 0H, in nanoseconds.
    pub offset: u32,

    pub cri_rate: u32,
    pub bit_rate: u32,

    /// Clock run-in and framing code.
    pub cri_frc: u32,
    pub cri_frc_mask: u32,
    pub cri_bits: u32,
    pub frc_bits: u32,

    /// Payload in bits.
    pub payload: u32,
    pub modulation: Modulation,

    /// [`SP_LINE_NUM`] and [`SP_FIELD_NUM`].
    pub flags: u32,
}

impl ServiceParams {
    /// The clock run-in pattern.
    pub const fn cri(&self) -> u32 {
        self.cri_frc >> self.frc_bits
    }

    pub const fn cri_mask(&self) -> u32 {
        self.cri_frc_mask >> self.frc_bits
    }

    /// The framing code pattern.
    pub const fn frc(&self) -> u32 {
        self.cri_frc & low_mask(self.frc_bits)
    }

    /// Payload size in bytes, rounded up.
    pub const fn payload_bytes(&self) -> usize {
        self.payload.div_ceil(8) as usize
    }

    /// Duration of clock run-in, framing code and payload in seconds.
    pub fn signal_duration(&self) -> f64 {
        self.cri_bits as f64 / self.cri_rate as f64
            + (self.frc_bits + self.payload) as f64 / self.bit_rate as f64
    }

    /// Whether the service is transmitted on `field` (0 or 1) at all.
    pub const fn on_field(&self, field: usize) -> bool {
        self.first[field] > 0 && self.last[field] > 0
    }

    pub const fn needs_line_numbers(&self) -> bool {
        self.flags & SP_LINE_NUM != 0
    }

    pub const fn needs_field_parity(&self) -> bool {
        self.flags & SP_FIELD_NUM != 0
    }
}

pub(crate) const fn low_mask(bits: u32) -> u32 {
    if bits >= 32 { u32::MAX } else { (1 << bits) - 1 }
}

/// The known services. Jobs and sampling parameters are derived from this
/// table only, it is never modified.
pub static SERVICE_TABLE: &[ServiceParams] = &[
    ServiceParams {
        service: Service::TeletextA,
        label: "Teletext System A",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [6, 318],
        last: [22, 335],
        offset: 10500,
        cri_rate: 6_203_125, // 397 x FH
        bit_rate: 6_203_125,
        cri_frc: 0x00AA_AAE7,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 37 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::TeletextBL10_625,
        label: "Teletext System B 625 Level 1.5",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [7, 320],
        last: [22, 335],
        offset: 10300,
        cri_rate: 6_937_500, // 444 x FH
        bit_rate: 6_937_500,
        cri_frc: 0x00AA_AAE4,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 42 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::TeletextBL25_625,
        label: "Teletext System B 625 Level 2.5",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [6, 318],
        last: [22, 335],
        offset: 10300,
        cri_rate: 6_937_500,
        bit_rate: 6_937_500,
        cri_frc: 0x00AA_AAE4,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 42 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::TeletextC625,
        label: "Teletext System C 625",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [6, 318],
        last: [22, 335],
        offset: 10480,
        cri_rate: 5_734_375, // 367 x FH
        bit_rate: 5_734_375,
        cri_frc: 0x00AA_AAE7,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 33 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::TeletextD625,
        label: "Teletext System D 625",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [6, 318],
        last: [22, 335],
        offset: 10500,
        cri_rate: 5_642_787, // 14/11 x FSC
        bit_rate: 5_642_787,
        cri_frc: 0x00AA_AAE5,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 34 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::Vps,
        label: "Video Program System",
        videostd_set: VideoStandardSet::PAL_BG,
        first: [16, 0],
        last: [16, 0],
        offset: 12500,
        cri_rate: 5_000_000, // 160 x FH
        bit_rate: 2_500_000,
        cri_frc: 0xAAAA_8A99,
        cri_frc_mask: 0x00FF_FFFF,
        cri_bits: 32,
        frc_bits: 0,
        payload: 13 * 8,
        modulation: Modulation::BiphaseMsb,
        flags: SP_FIELD_NUM,
    },
    ServiceParams {
        service: Service::VpsF2,
        label: "Pseudo-VPS on field 2",
        videostd_set: VideoStandardSet::PAL_BG,
        first: [0, 329],
        last: [0, 329],
        offset: 12500,
        cri_rate: 5_000_000,
        bit_rate: 2_500_000,
        cri_frc: 0xAAAA_8A99,
        cri_frc_mask: 0x00FF_FFFF,
        cri_bits: 32,
        frc_bits: 0,
        payload: 13 * 8,
        modulation: Modulation::BiphaseMsb,
        flags: SP_FIELD_NUM,
    },
    ServiceParams {
        service: Service::Wss625,
        label: "Wide Screen Signalling 625",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [23, 0],
        last: [23, 0],
        offset: 11000,
        cri_rate: 5_000_000, // 160/3 x FH
        bit_rate: 833_333,
        cri_frc: 0x8E3C_783E,
        cri_frc_mask: 0x2499_339C,
        cri_bits: 32,
        frc_bits: 0,
        payload: 14,
        modulation: Modulation::BiphaseLsb,
        flags: SP_FIELD_NUM | SP_LINE_NUM,
    },
    ServiceParams {
        service: Service::Caption625F1,
        label: "Closed Caption 625, field 1",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [22, 0],
        last: [22, 0],
        offset: 10500,
        cri_rate: 1_000_000, // 32 x FH
        bit_rate: 500_000,
        cri_frc: 0x0000_5551,
        cri_frc_mask: 0x7FF,
        cri_bits: 14,
        frc_bits: 2,
        payload: 2 * 8,
        modulation: Modulation::NrzLsb,
        flags: SP_FIELD_NUM,
    },
    ServiceParams {
        service: Service::Caption625F2,
        label: "Closed Caption 625, field 2",
        videostd_set: VideoStandardSet::SET_625_50,
        first: [0, 335],
        last: [0, 335],
        offset: 10500,
        cri_rate: 1_000_000,
        bit_rate: 500_000,
        cri_frc: 0x0000_5551,
        cri_frc_mask: 0x7FF,
        cri_bits: 14,
        frc_bits: 2,
        payload: 2 * 8,
        modulation: Modulation::NrzLsb,
        flags: SP_FIELD_NUM,
    },
    ServiceParams {
        service: Service::TeletextB525,
        label: "Teletext System B 525",
        videostd_set: VideoStandardSet::SET_525_60,
        first: [10, 272],
        last: [21, 284],
        offset: 10500,
        cri_rate: 5_727_272, // 364 x FH
        bit_rate: 5_727_272,
        cri_frc: 0x00AA_AAE4,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 34 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::TeletextC525,
        label: "Teletext System C 525",
        videostd_set: VideoStandardSet::SET_525_60,
        first: [10, 272],
        last: [21, 284],
        offset: 10480,
        cri_rate: 5_727_272,
        bit_rate: 5_727_272,
        cri_frc: 0x00AA_AAE7,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 33 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::TeletextD525,
        label: "Teletext System D 525",
        videostd_set: VideoStandardSet::SET_525_60,
        first: [10, 272],
        last: [21, 284],
        offset: 9780,
        cri_rate: 5_727_272,
        bit_rate: 5_727_272,
        cri_frc: 0x00AA_AAE5,
        cri_frc_mask: 0xFFFF,
        cri_bits: 18,
        frc_bits: 6,
        payload: 34 * 8,
        modulation: Modulation::NrzLsb,
        flags: 0,
    },
    ServiceParams {
        service: Service::Caption525F1,
        label: "Closed Caption 525, field 1",
        videostd_set: VideoStandardSet::SET_525_60,
        first: [21, 0],
        last: [21, 0],
        offset: 10500,
        cri_rate: 1_006_976, // 32 x FH
        bit_rate: 503_488,
        // Only the start bits are checked, some inserters emit a distorted
        // clock run-in.
        cri_frc: 0x03,
        cri_frc_mask: 0x0F,
        cri_bits: 4,
        frc_bits: 0,
        payload: 2 * 8,
        modulation: Modulation::NrzLsb,
        flags: SP_FIELD_NUM | SP_LINE_NUM,
    },
    ServiceParams {
        service: Service::Caption525F2,
        label: "Closed Caption 525, field 2",
        videostd_set: VideoStandardSet::SET_525_60,
        first: [0, 284],
        last: [0, 284],
        offset: 10500,
        cri_rate: 1_006_976,
        bit_rate: 503_488,
        cri_frc: 0x03,
        cri_frc_mask: 0x0F,
        cri_bits: 4,
        frc_bits: 0,
        payload: 2 * 8,
        modulation: Modulation::NrzLsb,
        flags: SP_FIELD_NUM | SP_LINE_NUM,
    },
    ServiceParams {
        service: Service::DoubleCaption525,
        label: "2xCaption 525",
        videostd_set: VideoStandardSet::SET_525_60,
        first: [10, 0],
        last: [21, 0],
        offset: 10500,
        cri_rate: 1_006_976, // 64 x FH
        bit_rate: 1_006_976,
        cri_frc: 0x0005_54ED,
        cri_frc_mask: 0xFFFF,
        cri_bits: 12,
        frc_bits: 8,
        payload: 4 * 8,
        modulation: Modulation::NrzLsb,
        flags: SP_FIELD_NUM,
    },
    ServiceParams {
        service: Service::WssCpr1204,
        label: "Wide Screen Signalling 525",
        videostd_set: VideoStandardSet::NTSC_M_JP,
        first: [20, 283],
        last: [20, 283],
        offset: 11200,
        cri_rate: 1_789_773, // 1/2 x FSC
        bit_rate: 447_443,   // 1/8 x FSC
        // No framing code, the payload ends in a six bit CRC.
        cri_frc: 0x0000_00F0,
        cri_frc_mask: 0xFF,
        cri_bits: 8,
        frc_bits: 0,
        payload: 20,
        modulation: Modulation::NrzMsb,
        flags: 0,
    },
];

impl Service {
    /// All services in table order.
    pub const ALL: [Service; 17] = [
        Service::TeletextA,
        Service::TeletextBL10_625,
        Service::TeletextBL25_625,
        Service::TeletextC625,
        Service::TeletextD625,
        Service::Vps,
        Service::VpsF2,
        Service::Wss625,
        Service::Caption625F1,
        Service::Caption625F2,
        Service::TeletextB525,
        Service::TeletextC525,
        Service::TeletextD525,
        Service::Caption525F1,
        Service::Caption525F2,
        Service::DoubleCaption525,
        Service::WssCpr1204,
    ];

    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Transmission parameters of this service.
    pub fn params(self) -> &'static ServiceParams {
        let index = Self::ALL
            .iter()
            .position(|&service| service == self)
            .unwrap_or_default();
        &SERVICE_TABLE[index]
    }

    pub fn from_bit(bit: u32) -> Option<Service> {
        Self::ALL.iter().copied().find(|service| service.bit() == bit)
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            Service::TeletextA => "teletext-a",
            Service::TeletextBL10_625 => "teletext-b-l10-625",
            Service::TeletextBL25_625 => "teletext-b-l25-625",
            Service::TeletextC625 => "teletext-c-625",
            Service::TeletextD625 => "teletext-d-625",
            Service::Vps => "vps",
            Service::VpsF2 => "vps-f2",
            Service::Wss625 => "wss-625",
            Service::Caption625F1 => "caption-625-f1",
            Service::Caption625F2 => "caption-625-f2",
            Service::TeletextB525 => "teletext-b-525",
            Service::TeletextC525 => "teletext-c-525",
            Service::TeletextD525 => "teletext-d-525",
            Service::Caption525F1 => "caption-525-f1",
            Service::Caption525F2 => "caption-525-f2",
            Service::DoubleCaption525 => "2xcaption-525",
            Service::WssCpr1204 => "wss-cpr1204",
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.params().label)
    }
}

/// A set of [`Service`]s, as requested from and reported by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ServiceSet(pub u32);

impl ServiceSet {
    pub const EMPTY: Self = Self(0);

    /// Teletext System B 625, Level 1.5 and 2.5.
    pub const TELETEXT_B_625: Self =
        Self(Service::TeletextBL10_625.bit() | Service::TeletextBL25_625.bit());
    pub const VPS: Self = Self(Service::Vps.bit() | Service::VpsF2.bit());
    pub const CAPTION_625: Self = Self(Service::Caption625F1.bit() | Service::Caption625F2.bit());
    pub const CAPTION_525: Self = Self(Service::Caption525F1.bit() | Service::Caption525F2.bit());
    pub const WSS: Self = Self(Service::Wss625.bit() | Service::WssCpr1204.bit());

    pub const ALL: Self = Self(0x0007_FCFF);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, service: Service) -> bool {
        self.0 & service.bit() != 0
    }

    pub const fn intersects(self, other: ServiceSet) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_subset(self, other: ServiceSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn insert(&mut self, service: Service) {
        self.0 |= service.bit();
    }

    pub fn remove(&mut self, service: Service) {
        self.0 &= !service.bit();
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Services of this set in table order.
    pub fn iter(self) -> impl Iterator<Item = Service> {
        Service::ALL
            .into_iter()
            .filter(move |service| self.contains(*service))
    }

    /// The single service in this set, if it holds exactly one.
    pub fn single(self) -> Option<Service> {
        if self.0.is_power_of_two() {
            Service::from_bit(self.0)
        } else {
            None
        }
    }

    /// Whether all services in this set may share one bit slicer: they use
    /// identical clock run-in, framing code and modulation and differ only
    /// in the lines they are transmitted on.
    pub const fn is_mergeable(self) -> bool {
        self.is_subset(Self::TELETEXT_B_625)
            || self.is_subset(Self::CAPTION_525)
            || self.is_subset(Self::CAPTION_625)
            || self.is_subset(Self::VPS)
    }
}

impl From<Service> for ServiceSet {
    fn from(service: Service) -> Self {
        Self(service.bit())
    }
}

impl FromIterator<Service> for ServiceSet {
    fn from_iter<I: IntoIterator<Item = Service>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |set, service| set | service)
    }
}

impl BitOr for ServiceSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<Service> for ServiceSet {
    type Output = Self;

    fn bitor(self, rhs: Service) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOr for Service {
    type Output = ServiceSet;

    fn bitor(self, rhs: Self) -> ServiceSet {
        ServiceSet(self.bit() | rhs.bit())
    }
}

impl BitOrAssign for ServiceSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ServiceSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ServiceSet {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Sub for ServiceSet {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

impl Not for ServiceSet {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl Display for ServiceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }

        for (i, service) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(service.short_name())?;
        }

        Ok(())
    }
}

impl FromStr for Service {
    type Err = ServiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Service::ALL
            .into_iter()
            .find(|service| service.short_name() == name)
            .ok_or_else(|| ServiceParseError(s.to_string()))
    }
}

impl FromStr for ServiceSet {
    type Err = ServiceParseError;

    /// Comma separated service names. `teletext-b`, `caption-525`,
    /// `caption-625`, `wss` and `all` name groups.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(ServiceSet::EMPTY, |set, name| {
                let group = match name.to_ascii_lowercase().as_str() {
                    "teletext-b" => Some(ServiceSet::TELETEXT_B_625),
                    "caption-525" => Some(ServiceSet::CAPTION_525),
                    "caption-625" => Some(ServiceSet::CAPTION_625),
                    "wss" => Some(ServiceSet::WSS),
                    "all" => Some(ServiceSet::ALL),
                    _ => None,
                };

                match group {
                    Some(group) => Ok(set | group),
                    None => Ok(set | name.parse::<Service>()?),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_service_order() {
        assert_eq!(SERVICE_TABLE.len(), Service::ALL.len());
        for (params, service) in SERVICE_TABLE.iter().zip(Service::ALL) {
            assert_eq!(params.service, service);
            assert_eq!(service.params().service, service);
        }

        let all: ServiceSet = Service::ALL.into_iter().collect();
        assert_eq!(all, ServiceSet::ALL);
    }

    #[test]
    fn table_invariants() {
        for params in SERVICE_TABLE {
            assert!(params.cri_bits <= 32 && params.frc_bits <= 32);
            assert!(params.payload_bytes() <= crate::structs::sliced::SLICED_DATA_SIZE);
            assert!(params.on_field(0) || params.on_field(1));
            for field in 0..2 {
                assert!(params.first[field] <= params.last[field], "{}", params.label);
            }
        }
    }

    #[test]
    fn cri_frc_split() {
        let ttx = Service::TeletextBL25_625.params();
        assert_eq!(ttx.cri(), 0x2AAAB);
        assert_eq!(ttx.cri_mask(), 0x3FF);
        assert_eq!(ttx.frc(), 0x24);

        let vps = Service::Vps.params();
        assert_eq!(vps.cri(), 0xAAAA_8A99);
        assert_eq!(vps.frc(), 0);
    }

    #[test]
    fn merge_groups() {
        assert!(ServiceSet::TELETEXT_B_625.is_mergeable());
        assert!((Service::Vps | Service::VpsF2).is_mergeable());
        assert!(!(Service::Vps | Service::Wss625).is_mergeable());
        assert!(!(Service::Caption525F1 | Service::Caption625F1).is_mergeable());
    }

    #[test]
    fn parse_service_lists() -> anyhow::Result<()> {
        let set: ServiceSet = "teletext-b, vps,wss-625".parse()?;
        assert_eq!(set, ServiceSet::TELETEXT_B_625 | Service::Vps | Service::Wss625);
        assert_eq!(set.to_string(), "teletext-b-l10-625, teletext-b-l25-625, vps, wss-625");
        assert!("teletext-z".parse::<ServiceSet>().is_err());
        Ok(())
    }
}
