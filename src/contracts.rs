//! Contract Bindings
//!
//! `sol!`-generated bindings for the on-chain surfaces the bot touches:
//! Uniswap V2 style pairs and routers, and the arbitrage executor contract
//! that replays the encoded swap legs atomically.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function swap(uint256 amount0Out, uint256 amount1Out, address to, bytes data) external;
    }

    #[sol(rpc)]
    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts);
        function getAmountsIn(uint256 amountOut, address[] path) external view returns (uint256[] amounts);
    }

    #[sol(rpc)]
    interface IArbitrageExecutor {
        function executeArbitrage(
            uint256 volumeIn,
            uint256 minerPayment,
            address[] targets,
            bytes[] payloads
        ) external payable;
    }
}
