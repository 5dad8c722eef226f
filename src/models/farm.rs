use serde::{Deserialize, Serialize};

/// A liquidity mining pool as reported by the farm endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPool {
    pub id: u64,
    pub name: String,
    /// Annual percentage rate, already expressed as a percentage
    pub apr: f64,
    pub total_staked: String,
    pub user_stake: String,
    pub pending_rewards: String,
}

/// Wrapper object the farm endpoint returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmPools {
    pub pools: Vec<FarmPool>,
}
