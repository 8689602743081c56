//! Live tests against a real RPC endpoint.
//!
//! These tests read `tests/test-config.toml` and are ignored by default.
//!
//! Run with:
//! ```bash
//! cargo test --package token-dashboard --test live -- --ignored
//! ```


use action::{FlowPolicy, ProviderChain, TokenChain};
use alloy_primitives::Address;
use alloy_provider::Provider;
use balance::monitor::BalanceMonitor;
use client::WalletContext;
use config::{TokenRegistry, SEPOLIA};
use setup::{load_test_config, setup_provider, setup_wallet_provider};
use token_dashboard::{check_native_balance, check_token_balance};

#[tokio::test]
#[ignore]
async fn test_chain_id_resolves() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;

    let ctx = WalletContext::connect(&provider, None).await.unwrap();
    assert_eq!(ctx.chain_id, SEPOLIA);
    assert!(!ctx.is_connected());
}

#[tokio::test]
#[ignore]
async fn test_token_and_native_balance_query() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let monitor = BalanceMonitor::new(provider);

    let registry = TokenRegistry::builtin();
    let usdc = registry.find(SEPOLIA, "USDC").unwrap();
    let holder = Address::repeat_byte(0x01);

    let balance = check_token_balance(&monitor, usdc.address, holder)
        .await
        .expect("Failed to query USDC balance");
    assert_eq!(balance.holder, holder);
    assert_eq!(balance.asset, usdc.address);

    let native = check_native_balance(&monitor, holder)
        .await
        .expect("Failed to query native balance");
    assert_eq!(native.asset, Address::ZERO);
}

#[tokio::test]
#[ignore]
async fn test_fee_estimate() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let chain = ProviderChain::new(provider.clone());

    let fee = chain.max_fee_per_gas().await.unwrap();
    assert!(fee > 0);
    assert!(provider.get_block_number().await.unwrap() > 0);
}

#[tokio::test]
#[ignore]
async fn test_simulate_zero_transfer_to_self() {
    let config = load_test_config();
    let (provider, account) = setup_wallet_provider(&config.rpc_url);
    let chain = ProviderChain::new(provider);

    let registry = TokenRegistry::builtin();
    let usdc = registry.find(SEPOLIA, "USDC").unwrap();

    let simulation = chain
        .simulate_transfer(usdc.address, account, account, Default::default())
        .await
        .expect("zero transfer should simulate");
    assert!(FlowPolicy::default().apply_gas_margin(simulation.gas_limit) > simulation.gas_limit);
}
