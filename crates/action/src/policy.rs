use serde::{Deserialize, Serialize};

/// Tunable heuristics for the transaction flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowPolicy {
    /// Applied to the simulated gas limit before submitting (110 = +10%)
    pub gas_limit_margin_percent: u64,
    /// Applied to the displayed gas cost only (120 = +20%)
    pub gas_display_buffer_percent: u64,
    /// Refuse to raise a non-zero allowance until it was reset to zero
    pub reset_before_raise: bool,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            gas_limit_margin_percent: 110,
            gas_display_buffer_percent: 120,
            reset_before_raise: false,
        }
    }
}

impl FlowPolicy {
    /// Inflate a simulated gas limit by the configured margin.
    pub const fn apply_gas_margin(&self, gas_limit: u64) -> u64 {
        gas_limit.saturating_mul(self.gas_limit_margin_percent) / 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_margin() {
        let policy = FlowPolicy::default();
        assert_eq!(policy.apply_gas_margin(50_000), 55_000);
    }

    #[test]
    fn test_custom_margin() {
        let policy = FlowPolicy {
            gas_limit_margin_percent: 150,
            ..Default::default()
        };
        assert_eq!(policy.apply_gas_margin(21_000), 31_500);
    }
}
