use alloy::sol;

sol! {
    #[sol(rpc)]
    interface VToken {
        function underlying() external view returns (address);
        function name() external view returns (string);
        function symbol() external view returns (string);
        function interestRateModel() external view returns (address);
        function reserveFactorMantissa() external view returns (uint256);
        function accrualBlockNumber() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function exchangeRateStored() external view returns (uint256);
        function borrowIndex() external view returns (uint256);
        function totalReserves() external view returns (uint256);
        function totalBorrows() external view returns (uint256);
        function getCash() external view returns (uint256);
        function borrowRatePerBlock() external view returns (uint256);
        function supplyRatePerBlock() external view returns (uint256);
    }

    #[sol(rpc)]
    interface BEP20 {
        function decimals() external view returns (uint8);
        function name() external view returns (string);
        function symbol() external view returns (string);
    }

    #[sol(rpc)]
    interface PriceOracle {
        function getUnderlyingPrice(address vToken) external view returns (uint256);
    }

    #[sol(rpc)]
    interface Comptroller {
        function oracle() external view returns (address);
        function getAllMarkets() external view returns (address[]);
        function markets(address vToken)
            external
            view
            returns (bool isListed, uint256 collateralFactorMantissa, bool isVenus);
    }
}
