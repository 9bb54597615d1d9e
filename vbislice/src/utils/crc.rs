//! Checks applied to sliced payloads whose framing alone is too weak to
//! tell a signal from noise.

/// CRC algorithm parameters with generator polynomial, without its
/// leading term, and initial value.
pub struct Algorithm {
    poly: u8,
    init: u8,
    width: u32,
}

/// CRC-6 of CPR-1204 (IEC 61880) wide screen signalling, x^6 + x + 1,
/// preset to all ones.
pub const CRC_CPR1204_ALG: Algorithm = Algorithm {
    poly: 0x03,
    init: 0x3F,
    width: 6,
};

/// Computes the CRC of the `len` least significant bits of `value`, most
/// significant bit first.
#[inline(always)]
pub const fn crc_bits(algorithm: &Algorithm, value: u32, len: u32) -> u8 {
    let top = 1u8 << (algorithm.width - 1);
    let mask = ((1u16 << algorithm.width) - 1) as u8;
    let mut crc = algorithm.init;

    let mut i = len;
    while i > 0 {
        i -= 1;
        let bit = (value >> i) & 1 != 0;
        let feedback = (crc & top != 0) ^ bit;
        crc = (crc << 1) & mask;
        if feedback {
            crc ^= algorithm.poly;
        }
    }

    crc
}

/// Bits of a CPR-1204 payload: 14 data bits followed by the CRC.
pub const CPR1204_DATA_BITS: u32 = 14;

/// Whether the 20-bit CPR-1204 payload in `data`, as packed by the bit
/// slicer, carries a valid CRC.
pub fn cpr1204_crc_ok(data: &[u8]) -> bool {
    let [b0, b1, b2, ..] = data else {
        return false;
    };

    let word = (*b0 as u32) << 12 | (*b1 as u32) << 4 | (*b2 as u32 & 0x0F);
    let crc = crc_bits(&CRC_CPR1204_ALG, word >> 6, CPR1204_DATA_BITS);
    crc == (word & 0x3F) as u8
}

/// Packs 14 CPR-1204 data bits and their CRC the way the bit slicer does.
pub const fn cpr1204_encode(data: u16) -> [u8; 3] {
    let data = data as u32 & 0x3FFF;
    let word = data << 6 | crc_bits(&CRC_CPR1204_ALG, data, CPR1204_DATA_BITS) as u32;
    [(word >> 12) as u8, (word >> 4) as u8, (word & 0x0F) as u8]
}

/// Whether `value` has an odd number of set bits.
#[inline(always)]
pub const fn odd_parity(value: u32) -> bool {
    value.count_ones() & 1 == 1
}

/// Whether the first WSS 625 group, aspect ratio with its parity bit, is
/// intact.
pub fn wss625_parity_ok(data: &[u8]) -> bool {
    data.first()
        .is_some_and(|&group| odd_parity(group as u32 & 0x0F))
}

#[test]
fn cpr1204_crc() {
    for data in [0u16, 1, 0x1555, 0x2AAA, 0x3FFF] {
        let packed = cpr1204_encode(data);
        assert!(cpr1204_crc_ok(&packed), "{data:#x}");

        let mut corrupt = packed;
        corrupt[1] ^= 0x10;
        assert!(!cpr1204_crc_ok(&corrupt), "{data:#x}");
    }

    assert!(!cpr1204_crc_ok(&[0xFF]));
}

#[test]
fn wss625_parity() {
    assert!(wss625_parity_ok(&[0x08, 0x00]));
    assert!(wss625_parity_ok(&[0x0E, 0x00]));
    assert!(!wss625_parity_ok(&[0x09, 0x00]));
    assert!(!wss625_parity_ok(&[]));
}
