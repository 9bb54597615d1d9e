//! Fixed-width serialization of binary sliced records.

pub trait WriteBytesLe {
    fn write_le(&self, dst: &mut Vec<u8>);
}

macro_rules! impl_num {
    ($($t:ty),+) => { $(
        impl WriteBytesLe for $t {
            #[inline]
            fn write_le(&self, dst: &mut Vec<u8>) {
                dst.extend_from_slice(&self.to_le_bytes());
            }
        }
    )+ }
}

impl_num!(u8, u16, u32, u64);

impl<T: WriteBytesLe, const N: usize> WriteBytesLe for [T; N] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

/// Serializes each value little endian into a new vector.
#[macro_export]
macro_rules! join_bytes_le {
    ( $($value:expr),+ $(,)? ) => {{
        let mut vec = Vec::<u8>::new();
        $( $crate::byteorder::WriteBytesLe::write_le(&$value, &mut vec); )+
        vec
    }};
}

#[cfg(test)]
mod tests {
    use crate::byteorder::WriteBytesLe;
    use vbisliced_macros::ToBytes;

    #[derive(ToBytes)]
    struct Header {
        magic: [u8; 4],
        version: u16,
        lines: u32,
    }

    #[test]
    fn field_order_little_endian() {
        let header = Header {
            magic: *b"VBI0",
            version: 0x0102,
            lines: 0x0A0B0C0D,
        };

        let mut le = Vec::new();
        header.write_le(&mut le);

        assert_eq!(le, [b'V', b'B', b'I', b'0', 0x02, 0x01, 0x0D, 0x0C, 0x0B, 0x0A]);
    }

    #[test]
    fn join_le() {
        let bytes = join_bytes_le!(1u16, 0x01020304u32, [7u8; 2]);
        assert_eq!(bytes, [1, 0, 4, 3, 2, 1, 7, 7]);
    }
}
