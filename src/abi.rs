//! Minimal contract interfaces the dashboard reads and writes.
//!
//! Only the methods consumed by [`crate::views`] are declared.

pub mod smart_yield {
    alloy::sol! {
        #[derive(Debug)]
        interface SmartYield {
            struct Abond {
                uint256 principal;
                uint256 gain;
                uint256 issuedAt;
                uint256 maturesAt;
                bool liquidated;
            }

            function balanceOf(address owner) external view returns (uint256);
            function abond() external view returns (Abond memory);
            function juniorBonds(uint256 jBondId) external view returns (uint256 tokens, uint256 maturesAt);
            function redeemJuniorBond(uint256 jBondId) external;
        }
    }
}

pub mod junior_bond {
    alloy::sol! {
        #[derive(Debug)]
        interface JuniorBond {
            function balanceOf(address owner) external view returns (uint256);
            function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
        }
    }
}

pub mod yield_farm {
    alloy::sol! {
        #[derive(Debug)]
        interface YieldFarm {
            function NR_OF_EPOCHS() external view returns (uint128);
            function TOTAL_DISTRIBUTED_AMOUNT() external view returns (uint256);
            function getCurrentEpoch() external view returns (uint128);
            function getPoolSize(uint128 epochId) external view returns (uint256);
            function getEpochStake(address userAddress, uint128 epochId) external view returns (uint256);
            function massHarvest() external returns (uint256);
        }
    }
}

pub mod erc20 {
    alloy::sol! {
        #[derive(Debug)]
        interface Erc20 {
            function balanceOf(address owner) external view returns (uint256);
        }
    }
}

pub mod uniswap_v2 {
    alloy::sol! {
        #[derive(Debug)]
        interface UniswapV2 {
            function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
            function token0() external view returns (address);
            function token1() external view returns (address);
            function totalSupply() external view returns (uint256);
        }
    }
}
