//! AMT Protocol Contracts
//!
//! Casper-native dividend-paying real-estate token with a TWAP-priced
//! lending market on top.
//!
//! ## Architecture
//!
//! - **SnapshotToken**: CEP-18 ledger with historical snapshots (AMT and liqAMT)
//! - **MarketPool**: Constant-product AMT/settlement pair with cumulative prices
//! - **ReferenceFeed**: Pushed reference price of the settlement asset
//! - **TwapOracle**: Time-weighted average price over the market pool
//! - **PriceFeeder**: Bounded fair price of AMT in the loan asset
//! - **Master**: Rent payments, holder and liquidity dividends, liquidity lock
//! - **LoanProtocol**: AMT-collateralized loans and liquidation
//!
//! ## Payment Flow
//!
//! Each rent payment snapshots both ledgers. Holders and liquidity
//! providers then claim their pro-rata share of that payment against the
//! snapshot; rounding remainders are collected by the owner as dust.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod interfaces;
pub mod math;

// Collaborators
pub mod snapshot_token;
pub mod market_pool;
pub mod reference_feed;

// Contract modules
pub mod oracle;
pub mod price_feeder;
pub mod master;
pub mod loan_protocol;
