use alloy_primitives::U256;
use serde::Serialize;
use units::{format_amount, format_crypto_value, to_f64};

/// Native currency decimals on every supported chain.
const NATIVE_DECIMALS: u8 = 18;

/// Display-only estimate of what a transaction will cost in gas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasCostEstimate {
    pub gas_units: u64,
    /// Max fee per gas unit, in wei
    pub fee_per_gas: u128,
    /// `gas_units * fee_per_gas * buffer / 100`
    pub cost_wei: U256,
    /// Cost in native currency, e.g. "0.00012"
    pub cost_native: String,
    /// Approximate fiat cost, when a reference price is known
    pub cost_usd: Option<f64>,
}

impl GasCostEstimate {
    pub fn new(
        gas_units: u64,
        fee_per_gas: u128,
        buffer_percent: u64,
        native_price: Option<f64>,
    ) -> Self {
        let cost_wei = U256::from(gas_units) * U256::from(fee_per_gas) * U256::from(buffer_percent)
            / U256::from(100u8);
        let cost_usd = native_price
            .filter(|_| !cost_wei.is_zero())
            .map(|price| to_f64(cost_wei, NATIVE_DECIMALS) * price);

        Self {
            gas_units,
            fee_per_gas,
            cost_wei,
            cost_native: format_amount(cost_wei, NATIVE_DECIMALS),
            cost_usd,
        }
    }

    /// e.g. `~0.00012 ETH (≈ $0.3 USD)`
    pub fn describe(&self, native_symbol: &str) -> String {
        let native = format_crypto_value(to_f64(self.cost_wei, NATIVE_DECIMALS), false);
        match self.cost_usd {
            Some(usd) if usd > 0.0 => {
                format!("~{native} {native_symbol} (≈ ${} USD)", format_crypto_value(usd, false))
            }
            _ => format!("~{native} {native_symbol}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_includes_buffer() {
        // 50k gas at 2 gwei with a 20% buffer = 0.00012 ETH
        let estimate = GasCostEstimate::new(50_000, 2_000_000_000, 120, Some(2500.0));

        assert_eq!(estimate.cost_wei, U256::from(120_000_000_000_000u64));
        assert_eq!(estimate.cost_native, "0.00012");
        let usd = estimate.cost_usd.unwrap();
        assert!((usd - 0.3).abs() < 1e-9);
        assert_eq!(estimate.describe("ETH"), "~0.00012 ETH (≈ $0.3 USD)");
    }

    #[test]
    fn test_zero_fee_has_no_fiat_value() {
        let estimate = GasCostEstimate::new(50_000, 0, 120, Some(2500.0));
        assert!(estimate.cost_wei.is_zero());
        assert_eq!(estimate.cost_usd, None);
        assert_eq!(estimate.describe("ETH"), "~0.00 ETH");
    }

    #[test]
    fn test_missing_reference_price() {
        let estimate = GasCostEstimate::new(21_000, 1_000_000_000, 100, None);
        assert_eq!(estimate.cost_usd, None);
        assert_eq!(estimate.cost_native, "0.000021");
    }
}
