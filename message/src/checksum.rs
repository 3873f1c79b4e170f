/// A one-byte frame check over an arbitrary byte sequence.
pub trait Checksum {
    fn checksum(vals: &[u8]) -> u8;

    /// Checksum over several slices, as if they were one contiguous sequence.
    fn checksum_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> u8;
}

/// Feeder bus CRC-8.
///
/// Runs on a 16-bit accumulator: each byte is folded into the high half, then eight
/// rounds of "xor `0x8380` if bit 15 is set, shift left". The device firmware uses the
/// same bit order, so this must not be swapped for a table-driven CRC.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct BusCrc;

impl BusCrc {
    const POLY: u16 = 0x1070 << 3;

    #[inline]
    const fn step(mut acc: u16, byte: u8) -> u16 {
        acc ^= (byte as u16) << 8;

        let mut i = 0;
        while i < 8 {
            if acc & 0x8000 != 0 {
                acc ^= Self::POLY;
            }
            acc <<= 1;
            i += 1;
        }

        acc
    }

    #[inline]
    const fn finish(acc: u16) -> u8 {
        ((acc >> 8) & 0xff) as u8
    }
}

impl Checksum for BusCrc {
    #[inline]
    fn checksum(vals: &[u8]) -> u8 {
        Self::checksum_parts([vals])
    }

    fn checksum_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> u8 {
        let acc = parts
            .into_iter()
            .flat_map(|part| part.iter().copied())
            .fold(0u16, Self::step);

        Self::finish(acc)
    }
}
