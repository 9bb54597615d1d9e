//! Conversion between sliced payload bytes and bits in transmission order.
//!
//! Octet payloads pack eight bits per byte, first bit in the least or most
//! significant position as the modulation says. Payloads which are not a
//! whole number of octets keep the trailing bits right aligned in the last
//! byte, which is what the bit slicer produces.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter, Endianness, LittleEndian};

use crate::structs::service::Modulation;

/// The first `payload` bits of `data` in transmission order.
pub fn payload_to_bits(data: &[u8], payload: u32, modulation: Modulation) -> io::Result<Vec<bool>> {
    let len = payload.div_ceil(8) as usize;
    if data.len() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("payload of {payload} bits needs {len} bytes, got {}", data.len()),
        ));
    }

    if modulation.is_msb_first() {
        read_bits(BitReader::endian(&data[..len], BigEndian), payload, true)
    } else {
        read_bits(BitReader::endian(&data[..len], LittleEndian), payload, false)
    }
}

/// Packs bits given in transmission order into payload bytes.
pub fn bits_to_payload(bits: &[bool], modulation: Modulation) -> io::Result<Vec<u8>> {
    if modulation.is_msb_first() {
        write_bits(BitWriter::endian(Vec::new(), BigEndian), bits, true)
    } else {
        write_bits(BitWriter::endian(Vec::new(), LittleEndian), bits, false)
    }
}

fn read_bits<E: Endianness>(
    mut bs: BitReader<&[u8], E>,
    payload: u32,
    msb_first: bool,
) -> io::Result<Vec<bool>> {
    let whole = payload & !7;
    let tail = payload & 7;
    let mut bits = Vec::with_capacity(payload as usize);

    for _ in 0..whole {
        bits.push(bs.read_bit()?);
    }

    if tail > 0 {
        if msb_first {
            for _ in tail..8 {
                bs.read_bit()?;
            }
        }
        for _ in 0..tail {
            bits.push(bs.read_bit()?);
        }
    }

    Ok(bits)
}

fn write_bits<E: Endianness>(
    mut bs: BitWriter<Vec<u8>, E>,
    bits: &[bool],
    msb_first: bool,
) -> io::Result<Vec<u8>> {
    let whole = bits.len() & !7;
    let tail = bits.len() & 7;

    for &bit in &bits[..whole] {
        bs.write_bit(bit)?;
    }

    if tail > 0 {
        if msb_first {
            for _ in tail..8 {
                bs.write_bit(false)?;
            }
        }
        for &bit in &bits[whole..] {
            bs.write_bit(bit)?;
        }
        bs.byte_align()?;
    }

    Ok(bs.into_writer())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_first_tail_is_right_aligned() -> anyhow::Result<()> {
        // 14 bits: 1,0,0,0,0,0,0,0 then 1,1,0,0,0,1
        let bits = [
            true, false, false, false, false, false, false, false, true, true, false, false,
            false, true,
        ];
        let payload = bits_to_payload(&bits, Modulation::BiphaseLsb)?;
        assert_eq!(payload, vec![0x01, 0b10_0011]);
        assert_eq!(payload_to_bits(&payload, 14, Modulation::BiphaseLsb)?, bits);
        Ok(())
    }

    #[test]
    fn msb_first_tail_is_right_aligned() -> anyhow::Result<()> {
        let mut bits = vec![false; 16];
        bits[0] = true;
        bits.extend([true, false, true, true]);
        let payload = bits_to_payload(&bits, Modulation::NrzMsb)?;
        assert_eq!(payload, vec![0x80, 0x00, 0b1011]);
        assert_eq!(payload_to_bits(&payload, 20, Modulation::NrzMsb)?, bits);
        Ok(())
    }

    #[test]
    fn short_data() {
        assert!(payload_to_bits(&[0u8; 2], 20, Modulation::NrzMsb).is_err());
    }
}
