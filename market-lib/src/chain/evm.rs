use crate::chain::{
    abi::{Comptroller, VToken, BEP20},
    BlockSource, CallOutcome, MarketCall, MarketReader, PriceOracle,
};
use crate::{chain::abi, utils};

use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    transports::http::reqwest::Url,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// JSON-RPC backed implementation of the chain interfaces.
pub struct EvmChain {
    provider: DynProvider,
    comptroller: Option<Address>,
    price_oracle: Address,
}

impl EvmChain {
    /// Connects to `rpc_url`. The price oracle is taken from configuration
    /// when given, otherwise it is read from the comptroller.
    pub async fn connect(
        rpc_url: &str,
        comptroller: Option<Address>,
        price_oracle: Option<Address>,
    ) -> Result<Self> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| anyhow!("Invalid RPC url {}: {}", rpc_url, e))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        let price_oracle = match (price_oracle, comptroller) {
            (Some(oracle), _) => oracle,
            (None, Some(comptroller)) => {
                let oracle = Comptroller::new(comptroller, provider.clone())
                    .oracle()
                    .call()
                    .await
                    .map_err(|e| anyhow!("Failed to read comptroller oracle: {}", e))?;
                info!(
                    "Resolved price oracle {} from comptroller {}",
                    utils::format_address(&oracle),
                    utils::format_address(&comptroller)
                );
                oracle
            }
            (None, None) => {
                return Err(anyhow!(
                    "Either comptroller.address or comptroller.price_oracle must be configured"
                ))
            }
        };

        Ok(EvmChain {
            provider,
            comptroller,
            price_oracle,
        })
    }

    pub fn price_oracle(&self) -> Address {
        self.price_oracle
    }
}

/// Whether a failed call is an on-chain revert rather than a transport or
/// decoding problem.
fn is_revert(error: &alloy::contract::Error) -> bool {
    if error.as_revert_data().is_some() {
        return true;
    }

    match error {
        alloy::contract::Error::TransportError(e) => e
            .as_error_resp()
            .is_some_and(|payload| payload.message.to_lowercase().contains("revert")),
        // calling a selector the contract does not implement returns no data
        alloy::contract::Error::ZeroData(..) => true,
        _ => false,
    }
}

fn into_outcome<T>(
    result: Result<T, alloy::contract::Error>,
    market: Address,
    call_name: impl Display,
) -> Result<CallOutcome<T>> {
    match result {
        Ok(value) => Ok(CallOutcome::Success(value)),
        Err(e) if is_revert(&e) => {
            debug!(
                "{} reverted on {}: {}",
                call_name,
                utils::format_address(&market),
                e
            );
            Ok(CallOutcome::Reverted)
        }
        Err(e) => Err(anyhow!(
            "{} failed on {}: {}",
            call_name,
            utils::format_address(&market),
            e
        )),
    }
}

fn block_id(block: Option<u64>) -> BlockId {
    block.map(BlockId::number).unwrap_or_else(BlockId::latest)
}

#[async_trait]
impl MarketReader for EvmChain {
    async fn underlying(&self, market: Address) -> Result<Address> {
        VToken::new(market, self.provider.clone())
            .underlying()
            .call()
            .await
            .map_err(|e| anyhow!("underlying() failed on {}: {}", market, e))
    }

    async fn market_name(&self, market: Address) -> Result<String> {
        VToken::new(market, self.provider.clone())
            .name()
            .call()
            .await
            .map_err(|e| anyhow!("name() failed on {}: {}", market, e))
    }

    async fn market_symbol(&self, market: Address) -> Result<String> {
        VToken::new(market, self.provider.clone())
            .symbol()
            .call()
            .await
            .map_err(|e| anyhow!("symbol() failed on {}: {}", market, e))
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        BEP20::new(token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(|e| anyhow!("decimals() failed on {}: {}", token, e))
    }

    async fn token_name(&self, token: Address) -> Result<String> {
        BEP20::new(token, self.provider.clone())
            .name()
            .call()
            .await
            .map_err(|e| anyhow!("name() failed on {}: {}", token, e))
    }

    async fn token_symbol(&self, token: Address) -> Result<String> {
        BEP20::new(token, self.provider.clone())
            .symbol()
            .call()
            .await
            .map_err(|e| anyhow!("symbol() failed on {}: {}", token, e))
    }

    async fn interest_rate_model(&self, market: Address) -> Result<CallOutcome<Address>> {
        let result = VToken::new(market, self.provider.clone())
            .interestRateModel()
            .call()
            .await;

        into_outcome(result, market, crate::constant::TRY_INTEREST_RATE_MODEL)
    }

    async fn accrual_block_number(&self, market: Address, block: u64) -> Result<u64> {
        let value = VToken::new(market, self.provider.clone())
            .accrualBlockNumber()
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(|e| anyhow!("accrualBlockNumber() failed on {}: {}", market, e))?;

        u64::try_from(value)
            .map_err(|_| anyhow!("accrualBlockNumber {} of {} overflows u64", value, market))
    }

    async fn call_uint(
        &self,
        market: Address,
        call: MarketCall,
        block: Option<u64>,
    ) -> Result<CallOutcome<U256>> {
        let contract = VToken::new(market, self.provider.clone());
        let block = block_id(block);

        let result = match call {
            MarketCall::ReserveFactorMantissa => {
                contract.reserveFactorMantissa().block(block).call().await
            }
            MarketCall::TotalSupply => contract.totalSupply().block(block).call().await,
            MarketCall::ExchangeRateStored => {
                contract.exchangeRateStored().block(block).call().await
            }
            MarketCall::BorrowIndex => contract.borrowIndex().block(block).call().await,
            MarketCall::TotalReserves => contract.totalReserves().block(block).call().await,
            MarketCall::TotalBorrows => contract.totalBorrows().block(block).call().await,
            MarketCall::GetCash => contract.getCash().block(block).call().await,
            MarketCall::BorrowRatePerBlock => {
                contract.borrowRatePerBlock().block(block).call().await
            }
            MarketCall::SupplyRatePerBlock => {
                contract.supplyRatePerBlock().block(block).call().await
            }
        };

        into_outcome(result, market, call)
    }

    async fn collateral_factor_mantissa(
        &self,
        market: Address,
        block: u64,
    ) -> Result<CallOutcome<U256>> {
        let Some(comptroller) = self.comptroller else {
            warn!("No comptroller configured, collateral factor of {} unavailable", market);
            return Ok(CallOutcome::Reverted);
        };

        let result = Comptroller::new(comptroller, self.provider.clone())
            .markets(market)
            .block(BlockId::number(block))
            .call()
            .await
            .map(|listing| listing.collateralFactorMantissa);

        into_outcome(result, market, crate::constant::TRY_MARKETS)
    }
}

#[async_trait]
impl BlockSource for EvmChain {
    async fn latest_block(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| anyhow!("Failed to get latest block number: {}", e))
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64> {
        let block_data = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block))
            .await
            .map_err(|e| anyhow!("Failed to get block #{}: {}", block, e))?
            .ok_or_else(|| anyhow!("Block #{} not found", block))?;

        Ok(block_data.header.timestamp)
    }

    async fn listed_markets(&self) -> Result<Vec<Address>> {
        let comptroller = self
            .comptroller
            .ok_or_else(|| anyhow!("No comptroller configured"))?;

        Comptroller::new(comptroller, self.provider.clone())
            .getAllMarkets()
            .call()
            .await
            .map_err(|e| anyhow!("Failed to list comptroller markets: {}", e))
    }
}

#[async_trait]
impl PriceOracle for EvmChain {
    async fn get_underlying_price(&self, market: Address, block: u64) -> Result<U256> {
        abi::PriceOracle::new(self.price_oracle, self.provider.clone())
            .getUnderlyingPrice(market)
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(|e| {
                anyhow!(
                    "getUnderlyingPrice({}) failed on oracle {}: {}",
                    market,
                    self.price_oracle,
                    e
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{rpc::json_rpc::ErrorPayload, transports::TransportError};

    fn rpc_error(code: i64, message: &'static str) -> alloy::contract::Error {
        let payload: ErrorPayload = ErrorPayload {
            code,
            message: message.into(),
            data: None,
        };
        alloy::contract::Error::TransportError(TransportError::ErrorResp(payload))
    }

    #[test]
    fn empty_return_data_is_a_revert() {
        let error = alloy::contract::Error::ZeroData(
            "totalSupply".to_string(),
            alloy::sol_types::Error::Overrun.into(),
        );

        let outcome =
            into_outcome::<U256>(Err(error), Address::ZERO, MarketCall::TotalSupply).unwrap();

        assert_eq!(outcome, CallOutcome::Reverted);
    }

    #[test]
    fn execution_reverted_response_is_a_revert() {
        let error = rpc_error(3, "execution reverted");

        let outcome =
            into_outcome::<U256>(Err(error), Address::ZERO, MarketCall::GetCash).unwrap();

        assert_eq!(outcome, CallOutcome::Reverted);
    }

    #[test]
    fn unrelated_rpc_failure_is_an_error() {
        let error = rpc_error(-32000, "header not found");

        let result = into_outcome::<U256>(Err(error), Address::ZERO, MarketCall::GetCash);

        assert!(result.is_err());
    }

    #[test]
    fn successful_call_is_passed_through() {
        let outcome =
            into_outcome(Ok(U256::from(7u64)), Address::ZERO, MarketCall::BorrowIndex).unwrap();

        assert_eq!(outcome, CallOutcome::Success(U256::from(7u64)));
    }
}
