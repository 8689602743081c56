use crate::UnitsError;
use alloy_primitives::Address;
use regex::Regex;
use std::sync::LazyLock;

static HEX_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static pattern"));

/// Parse a `0x`-prefixed address. Mixed-case input must carry a valid
/// EIP-55 checksum; all-lowercase or all-uppercase input is accepted as is.
pub fn parse_address(input: &str) -> Result<Address, UnitsError> {
    if !HEX_ADDRESS.is_match(input) {
        return Err(UnitsError::InvalidAddress(input.to_string()));
    }

    let hex = &input[2..];
    let single_case = hex == hex.to_ascii_lowercase() || hex == hex.to_ascii_uppercase();

    let parsed = if single_case {
        input.parse::<Address>().ok()
    } else {
        Address::parse_checksummed(input, None).ok()
    };

    parsed.ok_or_else(|| UnitsError::InvalidAddress(input.to_string()))
}

pub fn is_address(input: &str) -> bool {
    parse_address(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksummed_address() {
        let addr = parse_address("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238").unwrap();
        assert_eq!(
            addr.to_string(),
            "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"
        );
    }

    #[test]
    fn test_lowercase_address() {
        assert!(is_address("0x1c7d4b196cb0c7b01d743fbc6116a902379c7238"));
    }

    #[test]
    fn test_bad_checksum() {
        assert!(!is_address("0x1C7D4B196Cb0C7B01d743Fbc6116a902379C7238"));
    }

    #[test]
    fn test_malformed() {
        for input in [
            "",
            "0x",
            "1c7d4b196cb0c7b01d743fbc6116a902379c7238",
            "0x1c7d4b196cb0c7b01d743fbc6116a902379c723",
            "0xzz7d4b196cb0c7b01d743fbc6116a902379c7238",
        ] {
            assert!(!is_address(input), "{input}");
        }
    }
}
