//! Protocol error definitions.

use odra::prelude::*;

/// AMT protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProtocolError {
    // Configuration errors (1xx)
    ZeroPayerWallet = 100,
    ZeroBeneficiary = 101,
    ZeroMaster = 102,
    ZeroAmt = 103,
    ZeroSettlement = 104,
    ZeroLoanAsset = 105,
    ZeroOracle = 106,
    ZeroReferenceFeed = 107,
    ZeroPool = 108,
    ZeroPriceFeeder = 109,
    ZeroPauseAdmin = 110,
    ZeroBurnVault = 111,
    ZeroLiquidityToken = 112,
    ZeroLoanRatio = 113,
    InvalidLoanRatio = 114,
    LoanRatioRange = 115,
    ParticipationTooHigh = 116,
    MintToZeroAddress = 117,
    ZeroNewOwner = 118,

    // Dividend ledger errors (2xx)
    AmountTooSmall = 200,
    InsufficientSettlementBalance = 201,
    AlreadyCharged = 202,
    NothingToCharge = 203,
    NothingToTransfer = 204,
    InvalidSnapshotRange = 205,
    NothingToCollect = 206,
    PaymentOverclaimed = 207,
    SnapshotOutOfSync = 208,
    PaymentNotFound = 209,

    // Liquidity errors (3xx)
    NotEnoughAmt = 300,
    NotEnoughSettlement = 301,
    AmtAmountTooSmall = 302,
    SettlementAmountTooSmall = 303,
    NotEnoughLiquidityTokens = 304,
    LiquidityAlreadyLocked = 305,
    LockNotMatured = 306,
    NoTokensToRelease = 307,
    NoLiquidityLock = 308,

    // Loan errors (4xx)
    CollateralAmountZero = 400,
    NotEnoughCollateral = 401,
    LoanAmountTooSmall = 402,
    ProtocolBalanceTooLow = 403,
    RepayAmountZero = 404,
    InvalidLoanIndex = 405,
    RepayExceedsBorrowed = 406,
    InsufficientRepayBalance = 407,
    LoanNotLiquidable = 408,
    NotEnoughLoanAsset = 409,

    // Oracle and pricing errors (5xx)
    NoReserves = 500,
    PeriodNotElapsed = 501,
    InvalidToken = 502,
    InvalidAmountIn = 503,
    ReferencePriceUnavailable = 504,
    ArithmeticOverflow = 505,

    // Access control errors (6xx)
    NotOwner = 600,
    NotPayerWallet = 601,
    NotPauseAdmin = 602,
    Paused = 603,
    NotFeeder = 604,

    // Token errors (7xx)
    InsufficientBalance = 700,
    InsufficientAllowance = 701,
    InvalidSnapshotId = 702,

    // Pool errors (8xx)
    PoolInsufficientLiquidity = 800,
    PoolInsufficientOutput = 801,
    PoolInsufficientInput = 802,
    PoolInsufficientLiquidityMinted = 803,
    PoolInsufficientLiquidityBurned = 804,
    PoolIdenticalTokens = 805,
}

impl ProtocolError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Configuration
            ProtocolError::ZeroPayerWallet => "Payer wallet must not be the zero address",
            ProtocolError::ZeroBeneficiary => "Beneficiary must not be the zero address",
            ProtocolError::ZeroMaster => "Master address must not be the zero address",
            ProtocolError::ZeroAmt => "Amt must not be the zero address",
            ProtocolError::ZeroSettlement => "Settlement asset must not be the zero address",
            ProtocolError::ZeroLoanAsset => "Loan asset must not be the zero address",
            ProtocolError::ZeroOracle => "Oracle must not be the zero address",
            ProtocolError::ZeroReferenceFeed => "Reference feed must not be the zero address",
            ProtocolError::ZeroPool => "Pool must not be the zero address",
            ProtocolError::ZeroPriceFeeder => "Price feeder address must not be the zero address",
            ProtocolError::ZeroPauseAdmin => "Pause admin must not be the zero address",
            ProtocolError::ZeroBurnVault => "Burn vault must not be the zero address",
            ProtocolError::ZeroLiquidityToken => "Liquidity token must not be the zero address",
            ProtocolError::ZeroLoanRatio => "Loan ratio must not be zero",
            ProtocolError::InvalidLoanRatio => "Loan ratio out of the allowed range",
            ProtocolError::LoanRatioRange => "Loan ratio minimum must not exceed maximum",
            ProtocolError::ParticipationTooHigh => "vaultParticipation cannot be higher than 100",
            ProtocolError::MintToZeroAddress => "Can not mint to zero address",
            ProtocolError::ZeroNewOwner => "New owner must not be the zero address",

            // Dividend ledger
            ProtocolError::AmountTooSmall => "amount too small",
            ProtocolError::InsufficientSettlementBalance => "Insufficient amount of settlement asset",
            ProtocolError::AlreadyCharged => "Already charged",
            ProtocolError::NothingToCharge => "Nothing to charge",
            ProtocolError::NothingToTransfer => "There was nothing to transfer",
            ProtocolError::InvalidSnapshotRange => "Select a valid snapshot range",
            ProtocolError::NothingToCollect => "Nothing to collect from dust",
            ProtocolError::PaymentOverclaimed => "Payment portion already distributed",
            ProtocolError::SnapshotOutOfSync => "Ledger snapshots out of sync",
            ProtocolError::PaymentNotFound => "Payment not found",

            // Liquidity
            ProtocolError::NotEnoughAmt => "Not enough AMT",
            ProtocolError::NotEnoughSettlement => "Not enough settlement asset",
            ProtocolError::AmtAmountTooSmall => "AMT amount is too small",
            ProtocolError::SettlementAmountTooSmall => "Settlement amount is too small",
            ProtocolError::NotEnoughLiquidityTokens => "Not enough liqAMT",
            ProtocolError::LiquidityAlreadyLocked => "Liquidity already locked",
            ProtocolError::LockNotMatured => "Current time is before release time",
            ProtocolError::NoTokensToRelease => "No tokens to release",
            ProtocolError::NoLiquidityLock => "No liquidity lock",

            // Loans
            ProtocolError::CollateralAmountZero => "amtAmount must be greater than zero",
            ProtocolError::NotEnoughCollateral => "Not enough AMT balance",
            ProtocolError::LoanAmountTooSmall => "Loan amount too small",
            ProtocolError::ProtocolBalanceTooLow => "Loan protocol has not enough balance",
            ProtocolError::RepayAmountZero => "Amount must not be zero",
            ProtocolError::InvalidLoanIndex => "Invalid loan index",
            ProtocolError::RepayExceedsBorrowed => "Amount exceeds borrowed amount",
            ProtocolError::InsufficientRepayBalance => "Insufficient loan asset to repay loan",
            ProtocolError::LoanNotLiquidable => "Loan not liquidable",
            ProtocolError::NotEnoughLoanAsset => "Not enough loan asset",

            // Oracle and pricing
            ProtocolError::NoReserves => "Oracle: NO_RESERVES",
            ProtocolError::PeriodNotElapsed => "Oracle: PERIOD_NOT_ELAPSED",
            ProtocolError::InvalidToken => "Oracle: INVALID_TOKEN",
            ProtocolError::InvalidAmountIn => "Invalid amountIn",
            ProtocolError::ReferencePriceUnavailable => "Reference price unavailable",
            ProtocolError::ArithmeticOverflow => "Arithmetic overflow",

            // Access control
            ProtocolError::NotOwner => "Ownable: caller is not the owner",
            ProtocolError::NotPayerWallet => "Only PayerWallet can make the payments",
            ProtocolError::NotPauseAdmin => "Caller is not the pause admin",
            ProtocolError::Paused => "Pausable: paused",
            ProtocolError::NotFeeder => "Caller is not the feeder",

            // Token
            ProtocolError::InsufficientBalance => "Token: transfer amount exceeds balance",
            ProtocolError::InsufficientAllowance => "Token: insufficient allowance",
            ProtocolError::InvalidSnapshotId => "Snapshot: nonexistent id",

            // Pool
            ProtocolError::PoolInsufficientLiquidity => "Pool: insufficient liquidity",
            ProtocolError::PoolInsufficientOutput => "Pool: insufficient output amount",
            ProtocolError::PoolInsufficientInput => "Pool: insufficient input amount",
            ProtocolError::PoolInsufficientLiquidityMinted => "Pool: insufficient liquidity minted",
            ProtocolError::PoolInsufficientLiquidityBurned => "Pool: insufficient liquidity burned",
            ProtocolError::PoolIdenticalTokens => "Pool: identical tokens",
        }
    }
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<ProtocolError> for OdraError {
    fn from(error: ProtocolError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
