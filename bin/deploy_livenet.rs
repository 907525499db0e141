//! Deploy the AMT protocol to Casper livenet/testnet using Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!
//! Protocol configuration:
//!   PAYER_WALLET=account-hash-...        rent payer
//!   BURN_VAULT=account-hash-...          vault participation receiver
//!   SETTLEMENT_TOKEN=hash-...            CEP-18 the rent is paid in
//!   LOAN_ASSET=hash-...                  CEP-18 lent out by the loan protocol
//!   REFERENCE_FEED=hash-...              optional, deploys a ReferenceFeed when unset
//!   REFERENCE_FEED_DECIMALS=8            used for a deployed ReferenceFeed
//!   REFERENCE_FEED_ANSWER=5000000000000  used for a deployed ReferenceFeed
//!   SEED_AMT_AMOUNT, SEED_SETTLEMENT_AMOUNT   initial pool liquidity (smallest units)
//!   LOAN_RATIO_MIN=2, LOAN_RATIO_MAX=5

use std::str::FromStr;

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::*;
use thiserror::Error;

use amt_protocol_contracts::interfaces::Cep18TokenHostRef;
use amt_protocol_contracts::loan_protocol::{LoanProtocol, LoanProtocolInitArgs};
use amt_protocol_contracts::market_pool::{MarketPool, MarketPoolInitArgs};
use amt_protocol_contracts::master::{Master, MasterInitArgs};
use amt_protocol_contracts::oracle::{TwapOracle, TwapOracleInitArgs};
use amt_protocol_contracts::price_feeder::{PriceFeeder, PriceFeederInitArgs};
use amt_protocol_contracts::reference_feed::{ReferenceFeed, ReferenceFeedInitArgs};
use amt_protocol_contracts::snapshot_token::{SnapshotToken, SnapshotTokenInitArgs};

#[derive(Debug, Error)]
enum DeployError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("{name} is not a valid address: {value}")]
    InvalidAddress { name: &'static str, value: String },
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

fn required(name: &'static str) -> Result<String, DeployError> {
    std::env::var(name).map_err(|_| DeployError::MissingVar(name))
}

fn address_var(name: &'static str) -> Result<Address, DeployError> {
    let value = required(name)?;
    Address::from_str(&value).map_err(|_| DeployError::InvalidAddress { name, value })
}

fn optional_address_var(name: &'static str) -> Result<Option<Address>, DeployError> {
    match std::env::var(name) {
        Ok(value) => Address::from_str(&value)
            .map(Some)
            .map_err(|_| DeployError::InvalidAddress { name, value }),
        Err(_) => Ok(None),
    }
}

fn number_var<T: FromStr>(name: &'static str, default: T) -> Result<T, DeployError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| DeployError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}

fn amount_var(name: &'static str) -> Result<U256, DeployError> {
    let value = required(name)?;
    U256::from_dec_str(&value).map_err(|_| DeployError::InvalidNumber { name, value })
}

fn main() -> Result<(), DeployError> {
    // Load environment from .env file
    dotenv::dotenv().ok();

    println!("=== AMT Protocol Livenet Deployment ===");
    println!();

    let payer_wallet = address_var("PAYER_WALLET")?;
    let burn_vault = address_var("BURN_VAULT")?;
    let settlement = address_var("SETTLEMENT_TOKEN")?;
    let loan_asset = address_var("LOAN_ASSET")?;
    let reference_feed = optional_address_var("REFERENCE_FEED")?;
    let seed_amt = amount_var("SEED_AMT_AMOUNT")?;
    let seed_settlement = amount_var("SEED_SETTLEMENT_AMOUNT")?;
    let loan_ratio_min: u32 = number_var("LOAN_RATIO_MIN", 2)?;
    let loan_ratio_max: u32 = number_var("LOAN_RATIO_MAX", 5)?;

    // Initialize Odra livenet environment
    let env = odra_casper_livenet_env::env();

    // Configure payment amount for deployments/calls (required for Casper 2.0 txs)
    let payment_amount: u64 = number_var("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT", 200_000_000_000)?;
    env.set_gas(payment_amount);

    let deployer = env.caller();
    println!("Deployer: {:?}", deployer);
    println!();

    // ==================== Phase 1: Ledgers & Market ====================
    println!("=== Phase 1: Deploying Ledgers & Market ===");
    println!();

    println!("Deploying AMT...");
    let mut amt = SnapshotToken::deploy(
        &env,
        SnapshotTokenInitArgs {
            name: "AMT".to_string(),
            symbol: "AMT".to_string(),
            decimals: 18,
        },
    );
    let amt_addr = amt.address().clone();
    println!("AMT deployed at: {:?}", amt_addr);

    println!("Deploying liqAMT...");
    let mut liquidity_token = SnapshotToken::deploy(
        &env,
        SnapshotTokenInitArgs {
            name: "AMT Liquidity".to_string(),
            symbol: "liqAMT".to_string(),
            decimals: 18,
        },
    );
    let liquidity_token_addr = liquidity_token.address().clone();
    println!("liqAMT deployed at: {:?}", liquidity_token_addr);

    println!("Deploying MarketPool...");
    let pool = MarketPool::deploy(
        &env,
        MarketPoolInitArgs {
            token0: amt_addr,
            token1: settlement,
        },
    );
    let pool_addr = pool.address().clone();
    println!("MarketPool deployed at: {:?}", pool_addr);

    let reference_feed_addr = match reference_feed {
        Some(addr) => addr,
        None => {
            println!("Deploying ReferenceFeed...");
            let feed = ReferenceFeed::deploy(
                &env,
                ReferenceFeedInitArgs {
                    decimals: number_var("REFERENCE_FEED_DECIMALS", 8)?,
                    initial_answer: U256::from(number_var::<u64>(
                        "REFERENCE_FEED_ANSWER",
                        5_000_000_000_000,
                    )?),
                },
            );
            let addr = feed.address().clone();
            println!("ReferenceFeed deployed at: {:?}", addr);
            addr
        }
    };

    println!();

    // ==================== Phase 2: Dividend Ledger ====================
    println!("=== Phase 2: Deploying Master ===");
    println!();

    let mut master = Master::deploy(
        &env,
        MasterInitArgs {
            amt: amt_addr,
            settlement,
            burn_vault,
            liquidity_token: liquidity_token_addr,
            payer_wallet,
            pool: pool_addr,
        },
    );
    let master_addr = master.address().clone();
    println!("Master deployed at: {:?}", master_addr);

    println!("Handing ledger ownership to Master...");
    amt.transfer_ownership(master_addr);
    liquidity_token.transfer_ownership(master_addr);
    println!("Done.");

    // The oracle needs non-empty reserves
    println!("Seeding pool liquidity...");
    master.mint_master(deployer, seed_amt);
    amt.approve(master_addr, seed_amt);
    Cep18TokenHostRef::new(settlement, env.clone()).approve(master_addr, seed_settlement);
    let seeded = master.add_liquidity(seed_amt, seed_settlement);
    println!("Done. liqAMT minted: {}", seeded);

    println!();

    // ==================== Phase 3: Pricing & Lending ====================
    println!("=== Phase 3: Deploying Pricing & Lending ===");
    println!();

    let oracle = TwapOracle::deploy(
        &env,
        TwapOracleInitArgs {
            pool: pool_addr,
            token_a: amt_addr,
            token_b: settlement,
        },
    );
    let oracle_addr = oracle.address().clone();
    println!("TwapOracle deployed at: {:?}", oracle_addr);

    let price_feeder = PriceFeeder::deploy(
        &env,
        PriceFeederInitArgs {
            oracle: oracle_addr,
            amt: amt_addr,
            settlement,
            reference_feed: reference_feed_addr,
            pool: pool_addr,
        },
    );
    let price_feeder_addr = price_feeder.address().clone();
    println!("PriceFeeder deployed at: {:?}", price_feeder_addr);

    let loan_protocol = LoanProtocol::deploy(
        &env,
        LoanProtocolInitArgs {
            settlement,
            loan_asset,
            amt: amt_addr,
            master: master_addr,
            price_feeder: price_feeder_addr,
            loan_ratio_min,
            loan_ratio_max,
        },
    );
    println!("LoanProtocol deployed at: {:?}", loan_protocol.address().clone());

    println!();
    println!("=== Deployment Complete ===");
    println!();
    println!("Contract Addresses:");
    println!("  AMT:            {:?}", amt_addr);
    println!("  liqAMT:         {:?}", liquidity_token_addr);
    println!("  MarketPool:     {:?}", pool_addr);
    println!("  ReferenceFeed:  {:?}", reference_feed_addr);
    println!("  Master:         {:?}", master_addr);
    println!("  TwapOracle:     {:?}", oracle_addr);
    println!("  PriceFeeder:    {:?}", price_feeder_addr);
    println!("  LoanProtocol:   {:?}", loan_protocol.address().clone());
    println!();
    println!("Run TwapOracle.update() once per hour to keep the TWAP current.");
    Ok(())
}
