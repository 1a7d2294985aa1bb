//! Centralized Contract Definitions
//!
//! Solidity interfaces for the two venues and the pair tokens, defined with
//! alloy's `sol!` macro. Only call encoding/decoding is generated here; all
//! RPC goes through [`crate::chain::ChainClient`] so the adapters can be
//! driven against an in-memory chain in tests.

use alloy::primitives::aliases::{I24, U24};
use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

// ── Uniswap v4 ───────────────────────────────────────────────────────

sol! {
    struct PoolKey {
        address currency0;
        address currency1;
        uint24 fee;
        int24 tickSpacing;
        address hooks;
    }

    struct QuoteExactSingleParams {
        PoolKey poolKey;
        bool zeroForOne;
        uint128 exactAmount;
        bytes hookData;
    }

    struct ExactInputSingleParams {
        PoolKey poolKey;
        bool zeroForOne;
        address recipient;
        uint256 deadline;
        uint128 amountIn;
        uint128 amountOutMinimum;
        bytes hookData;
    }

    interface IV4Quoter {
        function quoteExactInputSingle(QuoteExactSingleParams memory params) external returns (uint256 amountOut, uint256 gasEstimate);
    }

    interface IV4Router {
        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }
}

// ── Balancer V2 Vault ────────────────────────────────────────────────

sol! {
    interface IBalancerVault {
        enum SwapKind { GIVEN_IN, GIVEN_OUT }

        struct BatchSwapStep {
            bytes32 poolId;
            uint256 assetInIndex;
            uint256 assetOutIndex;
            uint256 amount;
            bytes userData;
        }

        struct FundManagement {
            address sender;
            bool fromInternalBalance;
            address recipient;
            bool toInternalBalance;
        }

        struct SingleSwap {
            bytes32 poolId;
            SwapKind kind;
            address assetIn;
            address assetOut;
            uint256 amount;
            bytes userData;
        }

        function getPoolTokens(bytes32 poolId) external view returns (address[] memory tokens, uint256[] memory balances, uint256 lastChangeBlock);
        function queryBatchSwap(SwapKind kind, BatchSwapStep[] memory swaps, address[] memory assets, FundManagement memory funds) external returns (int256[] memory assetDeltas);
        function swap(SingleSwap memory singleSwap, FundManagement memory funds, uint256 limit, uint256 deadline) external payable returns (uint256 amountCalculated);
    }
}

/// Convert a u32 fee (pips) to the `uint24` used in pool keys.
/// Uses from_limbs() because Uint<24, 1> doesn't impl From<u32>.
pub fn fee_to_u24(fee: u32) -> U24 {
    debug_assert!(fee <= 0xFFFFFF, "fee {} exceeds U24 max (16777215)", fee);
    U24::from_limbs([fee as u64])
}

/// Convert a tick spacing to `int24`; None when out of range
pub fn tick_spacing_to_i24(spacing: i32) -> Option<I24> {
    I24::try_from(spacing).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn test_erc20_approve_selector() {
        // approve(address,uint256)
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
    }

    #[test]
    fn test_fee_and_tick_conversion() {
        assert_eq!(fee_to_u24(3000).to::<u32>(), 3000);
        assert!(tick_spacing_to_i24(60).is_some());
        assert!(tick_spacing_to_i24(-60).is_some());
        assert!(tick_spacing_to_i24(1 << 24).is_none());
    }
}
