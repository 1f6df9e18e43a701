// markets
pub const VBNB_MARKET: &str = "0xa07c5b74c9b40447a954e1466938b865b6bbea36";
pub const VUSDC_MARKET: &str = "0xeca88125a5adbe82614ffc12d0db554e2e2867c8";

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// native asset descriptors
pub const NATIVE_NAME: &str = "Binance Coin";
pub const NATIVE_SYMBOL: &str = "BNB";
pub const NATIVE_DECIMALS: u8 = 18;

// fixed-point precision
pub const MANTISSA_DECIMALS: u8 = 18;
pub const VTOKEN_DECIMALS: u8 = 8;

// market kinds, as stored on the record
pub const NATIVE_MARKET_KIND: &str = "native";
pub const STABLECOIN_MARKET_KIND: &str = "stablecoin";
pub const STANDARD_MARKET_KIND: &str = "standard";

// diagnostic names of revertible calls
pub const TRY_INTEREST_RATE_MODEL: &str = "try_interestRateModel";
pub const TRY_RESERVE_FACTOR_MANTISSA: &str = "try_reserveFactorMantissa";
pub const TRY_TOTAL_SUPPLY: &str = "try_totalSupply";
pub const TRY_EXCHANGE_RATE_STORED: &str = "try_exchangeRateStored";
pub const TRY_BORROW_INDEX: &str = "try_borrowIndex";
pub const TRY_TOTAL_RESERVES: &str = "try_totalReserves";
pub const TRY_TOTAL_BORROWS: &str = "try_totalBorrows";
pub const TRY_GET_CASH: &str = "try_getCash";
pub const TRY_BORROW_RATE_PER_BLOCK: &str = "try_borrowRatePerBlock";
pub const TRY_SUPPLY_RATE_PER_BLOCK: &str = "try_supplyRatePerBlock";
pub const TRY_MARKETS: &str = "try_markets";
