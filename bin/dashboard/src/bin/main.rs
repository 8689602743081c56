use action::{
    ApproveFlow, ApproveOutcome, ChainError, FlowError, Outcome, ProviderChain, TransferFlow,
};
use alloy_primitives::Address;
use alloy_provider::Provider;
use balance::monitor::BalanceMonitor;
use clap::{Parser, Subcommand, ValueEnum};
use client::WalletContext;
use config::{explorer_url, ChainConfig, ExplorerKind, Token, TokenRegistry};
use eyre::{eyre, WrapErr};
use price::{spawn_poller, CoinGeckoClient, PriceCache};
use std::{path::PathBuf, sync::Arc};
use token_dashboard::{
    check_allowance, check_native_balance, check_token_balance,
    config::Config,
    load_card,
    metrics::{install_prometheus_exporter, Metrics},
    refresh_card, resolve_view,
    terminal::{TerminalNotifier, TerminalPrompt},
    view::exact_amount,
    DashboardView, TokenCard,
};
use tokio::time;
use tracing::{error, info, warn};
use units::{format_crypto_value, parse_address, to_f64};

#[derive(Parser, Debug)]
#[command(name = "token-dashboard", version, about = "ERC20 token dashboard")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// RPC endpoint, overrides the config file
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Key of the account to connect; without it the wallet stays disconnected
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// CoinGecko demo API key, overrides the config file
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    coingecko_api_key: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Sign transactions without asking
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show balances and prices for the connected account
    Dashboard {
        /// Token symbol or address to highlight
        #[arg(long)]
        token: Option<String>,
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// List configured tokens per chain
    Tokens,
    /// Transfer tokens to a recipient
    Transfer {
        token: String,
        recipient: String,
        /// Amount in whole tokens, e.g. 1.5
        #[arg(required_unless_present = "max")]
        amount: Option<String>,
        /// Send the full balance
        #[arg(long, conflicts_with = "amount")]
        max: bool,
    },
    /// Approve a spender
    Approve {
        token: String,
        spender: String,
        #[arg(required_unless_present = "unlimited")]
        amount: Option<String>,
        #[arg(long, conflicts_with = "amount")]
        unlimited: bool,
    },
    /// Set a spender's allowance back to zero
    ResetAllowance { token: String, spender: String },
    /// Show the allowance granted to a spender
    Allowance { token: String, spender: String },
    /// Print the wallet_watchAsset request for a token
    AddToken {
        token: String,
        #[arg(long)]
        chain_id: Option<u64>,
    },
    /// Print the block explorer link for a hash or address
    Explorer {
        value: String,
        #[arg(long, value_enum, default_value_t = LinkKind::Tx)]
        kind: LinkKind,
        #[arg(long)]
        chain_id: Option<u64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LinkKind {
    Tx,
    Address,
    Token,
}

impl From<LinkKind> for ExplorerKind {
    fn from(kind: LinkKind) -> Self {
        match kind {
            LinkKind::Tx => Self::Tx,
            LinkKind::Address => Self::Address,
            LinkKind::Token => Self::Token,
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Loading config: {}", cli.config.display());
    let mut config = Config::from_file(&cli.config)
        .wrap_err_with(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(rpc_url) = &cli.rpc_url {
        config.rpc_url.clone_from(rpc_url);
    }
    if cli.coingecko_api_key.is_some() {
        config.coingecko_api_key.clone_from(&cli.coingecko_api_key);
    }

    if let Some(port) = cli.metrics_port.or(config.metrics_port) {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }

    let registry = config.registry()?;

    // Commands that work without a connection.
    match &cli.command {
        Command::Tokens => {
            print_tokens(&registry);
            return Ok(());
        }
        Command::AddToken {
            token,
            chain_id: Some(chain_id),
        } => return print_watch_asset(&registry, *chain_id, token),
        Command::Explorer {
            value,
            kind,
            chain_id: Some(chain_id),
        } => {
            println!("{}", explorer_url(*chain_id, value, (*kind).into()));
            return Ok(());
        }
        _ => {}
    }

    match &cli.private_key {
        Some(key) => {
            let account = client::signer_address(key)?;
            let provider = client::create_wallet_provider(&config.rpc_url, key)?;
            run(provider, Some(account), &cli, &config, &registry).await
        }
        None => {
            let provider = client::create_provider(&config.rpc_url).await?;
            run(provider, None, &cli, &config, &registry).await
        }
    }
}

async fn run<P>(
    provider: P,
    account: Option<Address>,
    cli: &Cli,
    config: &Config,
    registry: &TokenRegistry,
) -> eyre::Result<()>
where
    P: Provider + Clone + 'static,
{
    let ctx = WalletContext::connect(&provider, account).await?;
    info!(chain_id = ctx.chain_id, connected = ctx.is_connected(), "Connected to RPC");

    let metrics = Metrics::new();
    let prompt = TerminalPrompt {
        assume_yes: cli.yes,
    };
    let feed = CoinGeckoClient::new(config.coingecko_api_key.clone())?;
    let cache = Arc::new(PriceCache::new(feed, config.price_stale_after()));

    match &cli.command {
        Command::Dashboard { token, watch } => {
            dashboard(
                &provider,
                &ctx,
                registry,
                cache,
                config,
                &metrics,
                token.as_deref(),
                *watch,
            )
            .await
        }
        Command::Tokens => {
            print_tokens(registry);
            Ok(())
        }
        Command::Transfer {
            token,
            recipient,
            amount,
            max,
        } => {
            let token = registry.find(ctx.chain_id, token)?.clone();
            let native_price = native_price(&cache, ctx.chain_id).await;
            transfer(
                &provider,
                &ctx,
                token,
                recipient,
                amount.as_deref(),
                *max,
                native_price,
                config,
                &prompt,
                &metrics,
            )
            .await
        }
        Command::Approve {
            token,
            spender,
            amount,
            unlimited,
        } => {
            let token = registry.find(ctx.chain_id, token)?.clone();
            approve(
                &provider,
                &ctx,
                token,
                spender,
                amount.as_deref(),
                *unlimited,
                config,
                &prompt,
                &metrics,
            )
            .await
        }
        Command::ResetAllowance { token, spender } => {
            let token = registry.find(ctx.chain_id, token)?.clone();
            reset_allowance(&provider, &ctx, token, spender, config, &prompt, &metrics).await
        }
        Command::Allowance { token, spender } => {
            let owner = ctx
                .account()
                .ok_or_else(|| eyre!("connect a wallet (PRIVATE_KEY) to read allowances"))?;
            let token = registry.find(ctx.chain_id, token)?;
            let spender = parse_address(spender)?;
            let monitor = BalanceMonitor::new(provider.clone());
            let allowance = check_allowance(&monitor, token.address, owner, spender).await?;
            println!(
                "{spender} may spend {} of {owner}",
                exact_amount(allowance.amount, token)
            );
            Ok(())
        }
        Command::AddToken { token, .. } => print_watch_asset(registry, ctx.chain_id, token),
        Command::Explorer { value, kind, .. } => {
            println!("{}", explorer_url(ctx.chain_id, value, (*kind).into()));
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn dashboard<P>(
    provider: &P,
    ctx: &WalletContext,
    registry: &TokenRegistry,
    cache: Arc<PriceCache<CoinGeckoClient>>,
    config: &Config,
    metrics: &Metrics,
    selected: Option<&str>,
    watch: bool,
) -> eyre::Result<()>
where
    P: Provider + Clone + 'static,
{
    let (tokens, selected) = match resolve_view(ctx, registry, selected) {
        DashboardView::Loading => {
            println!("Connecting...");
            return Ok(());
        }
        DashboardView::ConnectPrompt => {
            println!("Wallet not connected. Set PRIVATE_KEY or pass --private-key to connect.");
            return Ok(());
        }
        DashboardView::UnsupportedNetwork { chain_id } => {
            let supported: Vec<String> = registry.chain_ids().map(|id| id.to_string()).collect();
            println!(
                "Chain {chain_id} is not supported. Please switch to one of: {}",
                supported.join(", ")
            );
            return Ok(());
        }
        DashboardView::Tokens { tokens, selected } => (tokens, selected),
    };
    let Some(owner) = ctx.account() else {
        return Ok(());
    };

    let monitor = BalanceMonitor::new(provider.clone());
    let chain = ChainConfig::from_chain_id(ctx.chain_id);
    let native_symbol = chain.map_or("ETH", |c| c.native_symbol);

    match check_native_balance(&monitor, owner).await {
        Ok(native) => println!(
            "{owner}: {} {native_symbol}\n",
            format_crypto_value(to_f64(native.amount, 18), false)
        ),
        Err(e) => warn!(error = %e, "Failed to load native balance"),
    }
    println!("Prices provided by CoinGecko might be unavailable due to the API's rate limits.\n");

    let mut cards = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let card = load_card(&monitor, cache.as_ref(), token, owner).await;
        metrics.record_price_fetch(card.price.snapshot().is_some());
        cards.push(card);
    }
    print_cards(&cards, &selected, metrics);

    if !watch {
        return Ok(());
    }

    let ids: Vec<String> = tokens.iter().map(|t| t.price_id.clone()).collect();
    let poll_metrics = metrics.clone();
    let poller = spawn_poller(
        Arc::clone(&cache),
        ids,
        config.price_refresh_interval(),
        move |e| {
            warn!(error = %e, "Failed to fetch token price");
            poll_metrics.record_price_fetch(false);
        },
    );

    let mut interval = time::interval(config.price_refresh_interval());
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut refreshed = Vec::with_capacity(cards.len());
                for card in &cards {
                    refreshed.push(refresh_card(&monitor, cache.as_ref(), card, owner).await);
                }
                cards = refreshed;
                print_cards(&cards, &selected, metrics);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                poller.abort();
                return Ok(());
            }
        }
    }
}

fn print_cards(cards: &[TokenCard], selected: &Token, metrics: &Metrics) {
    for card in cards {
        let marker = if card.token.address == selected.address {
            "*"
        } else {
            " "
        };
        println!("{marker} {card}\n");
        if let Some(balance) = card.balance_f64() {
            metrics.set_token_balance(&card.token.symbol, balance);
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn transfer<P>(
    provider: &P,
    ctx: &WalletContext,
    token: Token,
    recipient: &str,
    amount: Option<&str>,
    max: bool,
    native_price: Option<f64>,
    config: &Config,
    prompt: &TerminalPrompt,
    metrics: &Metrics,
) -> eyre::Result<()>
where
    P: Provider + Clone + 'static,
{
    let owner = ctx
        .account()
        .ok_or_else(|| eyre!("connect a wallet (PRIVATE_KEY) to transfer"))?;
    let monitor = BalanceMonitor::new(provider.clone());
    let balance = check_token_balance(&monitor, token.address, owner)
        .await
        .map(|b| b.amount)
        .ok();

    let chain = ProviderChain::new(provider.clone());
    let symbol = token.symbol.clone();
    let mut flow = TransferFlow::new(
        chain,
        TerminalNotifier,
        ctx,
        token,
        balance,
        config.policy,
    )?;

    flow.set_recipient(recipient);
    if max {
        flow.max_amount();
    } else if let Some(amount) = amount {
        flow.set_amount(amount);
    }
    flow.validate().map_err(FlowError::Form)?;
    flow.simulate().await?;

    let native_symbol = ChainConfig::from_chain_id(ctx.chain_id).map_or("ETH", |c| c.native_symbol);
    match flow.estimate_gas_cost(native_price).await {
        Ok(Some(estimate)) => println!("Estimated gas: {}", estimate.describe(native_symbol)),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Failed to estimate gas cost"),
    }
    println!("Sending {} {symbol} to {}", flow.amount(), flow.recipient());

    let hash = match flow.submit(prompt).await {
        Ok(hash) => hash,
        Err(e) => return Err(record_submit_error(e, "transfer", metrics)),
    };
    metrics.record_tx_submitted("transfer");
    println!("Submitted: {}", explorer_url(ctx.chain_id, hash, ExplorerKind::Tx));

    let outcome = flow.wait_for_receipt(config.receipt_poll_interval()).await?;
    metrics.record_tx_outcome("transfer", outcome == Outcome::Success);
    if let Some(balance) = flow.balance() {
        println!("New balance: {}", exact_amount(balance, flow.token()));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn approve<P>(
    provider: &P,
    ctx: &WalletContext,
    token: Token,
    spender: &str,
    amount: Option<&str>,
    unlimited: bool,
    config: &Config,
    prompt: &TerminalPrompt,
    metrics: &Metrics,
) -> eyre::Result<()>
where
    P: Provider + Clone + 'static,
{
    let chain = ProviderChain::new(provider.clone());
    let mut flow = ApproveFlow::new(chain, TerminalNotifier, ctx, token, config.policy)?;

    flow.set_spender(spender);
    if unlimited {
        flow.set_unlimited();
    } else if let Some(amount) = amount {
        flow.set_amount(amount);
    }
    if let Some(current) = flow.refresh_allowance().await? {
        println!("Current allowance: {}", exact_amount(current, flow.token()));
    }

    let hash = match flow.submit(prompt).await {
        Ok(ApproveOutcome::AlreadySufficient) => return Ok(()),
        Ok(ApproveOutcome::Submitted(hash)) => hash,
        Err(FlowError::ResetRequired { current }) => {
            return Err(eyre!(
                "current allowance is {}; run reset-allowance first",
                exact_amount(current, flow.token())
            ));
        }
        Err(e) => return Err(record_submit_error(e, "approve", metrics)),
    };
    metrics.record_tx_submitted("approve");
    println!("Submitted: {}", explorer_url(ctx.chain_id, hash, ExplorerKind::Tx));

    let outcome = flow.wait_for_receipt(config.receipt_poll_interval()).await?;
    metrics.record_tx_outcome("approve", outcome == Outcome::Success);
    if let Some(current) = flow.current_allowance() {
        println!("Allowance: {}", exact_amount(current, flow.token()));
    }
    Ok(())
}

async fn reset_allowance<P>(
    provider: &P,
    ctx: &WalletContext,
    token: Token,
    spender: &str,
    config: &Config,
    prompt: &TerminalPrompt,
    metrics: &Metrics,
) -> eyre::Result<()>
where
    P: Provider + Clone + 'static,
{
    let chain = ProviderChain::new(provider.clone());
    let mut flow = ApproveFlow::new(chain, TerminalNotifier, ctx, token, config.policy)?;
    flow.set_spender(spender);
    flow.refresh_allowance().await?;

    if !flow.can_reset() {
        println!("No allowance to reset.");
        return Ok(());
    }

    let hash = match flow.reset_to_zero(prompt).await {
        Ok(hash) => hash,
        Err(e) => return Err(record_submit_error(e, "reset", metrics)),
    };
    metrics.record_tx_submitted("reset");

    let outcome = flow.wait_for_receipt(config.receipt_poll_interval()).await?;
    metrics.record_tx_outcome("reset", outcome == Outcome::Success);
    info!(%hash, "Allowance reset");
    Ok(())
}

fn record_submit_error(e: FlowError, flow: &str, metrics: &Metrics) -> eyre::Report {
    if matches!(e, FlowError::Chain(ChainError::Rejected)) {
        metrics.record_rejection(flow);
    } else {
        error!(flow, error = %e, "Submission failed");
    }
    e.into()
}

async fn native_price(cache: &PriceCache<CoinGeckoClient>, chain_id: u64) -> Option<f64> {
    let chain = ChainConfig::from_chain_id(chain_id)?;
    match cache.get(chain.native_price_id).await {
        Ok(snapshot) => snapshot.price,
        Err(e) => {
            warn!(error = %e, "Failed to fetch native price");
            None
        }
    }
}

fn print_tokens(registry: &TokenRegistry) {
    for chain_id in registry.chain_ids() {
        let name = ChainConfig::from_chain_id(chain_id).map_or("Unknown", |c| c.name);
        println!("{name} ({chain_id})");
        for token in registry.tokens(chain_id) {
            println!(
                "  {:<6} {} ({} decimals) {}",
                token.symbol, token.address, token.decimals, token.name
            );
        }
    }
}

fn print_watch_asset(registry: &TokenRegistry, chain_id: u64, query: &str) -> eyre::Result<()> {
    let token = registry.find(chain_id, query)?;
    let request = serde_json::to_string_pretty(&token.watch_asset_request())?;
    println!("{request}");
    Ok(())
}
