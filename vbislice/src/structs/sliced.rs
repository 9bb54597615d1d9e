use crate::structs::service::{Service, ServiceSet};

/// Capacity of [`Sliced::data`], enough for the largest known payload.
pub const SLICED_DATA_SIZE: usize = 56;

/// One line of decoded VBI data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sliced {
    /// Exactly one service.
    pub id: ServiceSet,
    /// ITU-R line number, 0 if unknown.
    pub line: u32,
    /// Payload in the packing of the service modulation. Bytes past
    /// [`Sliced::payload`] carry no information.
    pub data: [u8; SLICED_DATA_SIZE],
}

impl Sliced {
    pub const EMPTY: Self = Self {
        id: ServiceSet::EMPTY,
        line: 0,
        data: [0; SLICED_DATA_SIZE],
    };

    pub fn new(service: Service, line: u32, payload: &[u8]) -> Self {
        let mut sliced = Self {
            id: service.into(),
            line,
            ..Self::EMPTY
        };
        let len = payload.len().min(SLICED_DATA_SIZE);
        sliced.data[..len].copy_from_slice(&payload[..len]);
        sliced
    }

    pub fn service(&self) -> Option<Service> {
        self.id.single()
    }

    /// The meaningful prefix of `data`.
    pub fn payload(&self) -> &[u8] {
        let len = self
            .service()
            .map_or(0, |service| service.params().payload_bytes());
        &self.data[..len]
    }
}

impl Default for Sliced {
    fn default() -> Self {
        Self::EMPTY
    }
}
