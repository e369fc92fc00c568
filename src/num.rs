use alloy::primitives::U256;
use fastnum::{
    bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

use crate::error::DashboardError;

/// Converter of on-chain base units into decimals of a token
/// with the given number of decimals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals as u8
    }

    /// Scales base units down by the token decimals, rounding towards zero.
    pub fn from_unsigned<const N: usize>(
        &self,
        value: U256,
    ) -> Result<UnsignedDecimal<N>, DashboardError> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .ok_or(DashboardError::Overflow(value))?;
        Ok(UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        ))
    }
}

#[cfg(test)]
mod tests {
    use fastnum::{UD64, udec64, udec128};

    use super::*;

    #[test]
    fn test_converter_scales_by_decimals() {
        assert_eq!(
            Converter::new(0).from_unsigned(U256::from(1234567890)).unwrap(),
            udec128!(1234567890)
        );
        assert_eq!(
            Converter::new(6).from_unsigned(U256::from(1234567890)).unwrap(),
            udec128!(1234.56789)
        );
        assert_eq!(
            Converter::new(18)
                .from_unsigned(U256::from(1_500_000_000_000_000_000u128))
                .unwrap(),
            udec128!(1.5)
        );
    }

    #[test]
    fn test_converter_overflow() {
        let err = Converter::new(6).from_unsigned::<1>(U256::MAX).unwrap_err();
        assert!(matches!(err, DashboardError::Overflow(v) if v == U256::MAX));

        let small: UD64 = Converter::new(2).from_unsigned(U256::from(1)).unwrap();
        assert_eq!(small, udec64!(0.01));
    }
}
