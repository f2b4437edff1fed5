use fastnum::{
    bint,
    decimal::{Context, RoundingMode},
};

/// Exact-decimal amount emitted by the pipeline.
///
/// Raw on-chain integers are scaled by the token's precision without ever
/// passing through floating point, so the storage layer's exact-decimal
/// columns receive the value the chain recorded.
pub type Amount = fastnum::UD128;

/// Fixed-point to decimal converter for one token precision.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: i32::from(decimals),
        }
    }

    /// Scale a raw on-chain integer by `10^-decimals`.
    pub fn from_raw(&self, value: u128) -> Amount {
        let unscaled = bint::UInt::<2>::from_le_slice(&value.to_le_bytes()).unwrap_or_default();
        Amount::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    /// Decimal places this converter scales by.
    pub fn decimals(&self) -> u8 {
        self.decimals as u8
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn scales_token_amounts() {
        assert_eq!(
            Converter::new(6).from_raw(101_314_781),
            udec128!(101.314781)
        );
        assert_eq!(Converter::new(6).from_raw(0), udec128!(0));
    }

    #[test]
    fn scales_native_lamport_amounts() {
        assert_eq!(
            Converter::new(9).from_raw(3_919_776_213),
            udec128!(3.919776213)
        );
    }

    #[test]
    fn zero_decimals_passes_raw_value_through() {
        assert_eq!(
            Converter::new(0).from_raw(1_234_567_890),
            udec128!(1234567890)
        );
    }

    #[test]
    fn high_precision_values_keep_all_digits() {
        assert_eq!(
            Converter::new(12).from_raw(1_234_567_890),
            udec128!(0.00123456789)
        );
    }
}
