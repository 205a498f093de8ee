use crate::proto::catalog::v1::{memory::Unit, Memory};

/// Normalization of a memory quantity to bits
pub trait MemoryExt {
    /// Value in bits using binary shifts: B=3, KB=13, MB=23, GB=33, TB=43
    ///
    /// Unspecified or unknown units normalize to 0. Results saturate at
    /// `u64::MAX`.
    fn to_bits(&self) -> u64;
}

impl MemoryExt for Memory {
    fn to_bits(&self) -> u64 {
        let shift = match Unit::try_from(self.unit) {
            Ok(Unit::Bit) => 0,
            Ok(Unit::Byte) => 3,
            Ok(Unit::Kilobyte) => 13,
            Ok(Unit::Megabyte) => 23,
            Ok(Unit::Gigabyte) => 33,
            Ok(Unit::Terabyte) => 43,
            Ok(Unit::Unspecified) | Err(_) => return 0,
        };
        self.value.saturating_mul(1u64 << shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(value: u64, unit: Unit) -> Memory {
        Memory {
            value,
            unit: unit as i32,
        }
    }

    #[test]
    fn test_to_bits() {
        assert_eq!(memory(5, Unit::Bit).to_bits(), 5);
        assert_eq!(memory(1, Unit::Byte).to_bits(), 8);
        assert_eq!(memory(1, Unit::Kilobyte).to_bits(), 8 * 1024);
        assert_eq!(memory(1, Unit::Megabyte).to_bits(), 8 * 1024 * 1024);
        assert_eq!(memory(6, Unit::Gigabyte).to_bits(), 6 * (1 << 33));
        assert_eq!(memory(2, Unit::Terabyte).to_bits(), 2 * (1 << 43));
    }

    #[test]
    fn test_unknown_units_normalize_to_zero() {
        assert_eq!(memory(16, Unit::Unspecified).to_bits(), 0);
        let unknown = Memory { value: 16, unit: 42 };
        assert_eq!(unknown.to_bits(), 0);
    }

    #[test]
    fn test_to_bits_saturates() {
        assert_eq!(memory(u64::MAX, Unit::Terabyte).to_bits(), u64::MAX);
    }

    #[test]
    fn test_units_compare_across_scales() {
        assert!(memory(8, Unit::Gigabyte).to_bits() > memory(6, Unit::Gigabyte).to_bits());
        assert_eq!(memory(1024, Unit::Megabyte).to_bits(), memory(1, Unit::Gigabyte).to_bits());
    }
}
