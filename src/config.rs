// 8.0 config.rs: network token identities and indexer settings in one place.
// 8.1 NetworkConfig names the pricing anchors (native, stables, secondary references) and where the
// native/USD rate comes from. presets per network, overridable from JSON.

use crate::types::{Address, ProtocolId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Mainnet,
    Arbitrum,
    Base,
}

impl Network {
    pub fn config(&self) -> IndexerConfig {
        IndexerConfig::for_network(self.network_config())
    }

    pub fn network_config(&self) -> NetworkConfig {
        match self {
            Network::Mainnet => NetworkConfig::mainnet(),
            Network::Arbitrum => NetworkConfig::arbitrum(),
            Network::Base => NetworkConfig::base(),
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "ethereum" => Ok(Network::Mainnet),
            "arbitrum" | "arbitrum-one" => Ok(Network::Arbitrum),
            "base" => Ok(Network::Base),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Token identities used as pricing anchors on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network: Network,
    // Wrapped native asset. priced at 1 in the native numeraire
    pub native_token: Address,
    // Indexed native/USD pair used by the reference price resolver. deployment specific, so
    // every preset leaves it unset and it has to come from the config file; until then the
    // resolver only reads `fallback_pool`
    pub reference_pair: Option<Address>,
    // External native/USD pool read directly while the reference pair is not indexed
    pub fallback_pool: Option<Address>,
    // Canonical USD stablecoins
    pub stable_tokens: Vec<Address>,
    // Bridged stablecoins this network also treats as USD
    pub bridged_stable_tokens: Vec<Address>,
    // Tokens with a known native price that can price their counterparts (liquid staking etc.)
    pub secondary_reference_tokens: Vec<Address>,
}

// presets are compile-time literals, covered by the preset tests below
fn preset(hex: &str) -> Address {
    hex.parse().expect("preset address literal")
}

impl NetworkConfig {
    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            native_token: preset("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            reference_pair: None,
            // uniswap v2 USDC/WETH
            fallback_pool: Some(preset("0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc")),
            stable_tokens: vec![
                preset("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), // USDC
                preset("0xdAC17F958D2ee523a2206206994597C13D831ec7"), // USDT
                preset("0x6B175474E89094C44Da98b954EedeAC495271d0F"), // DAI
            ],
            bridged_stable_tokens: Vec::new(),
            secondary_reference_tokens: vec![
                preset("0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0"), // wstETH
            ],
        }
    }

    pub fn arbitrum() -> Self {
        Self {
            network: Network::Arbitrum,
            native_token: preset("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
            reference_pair: None,
            // sushiswap WETH/USDC.e
            fallback_pool: Some(preset("0x905dfCD5649217c42684f23958568e533C711Aa3")),
            stable_tokens: vec![
                preset("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"), // USDC
                preset("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"), // USDT
                preset("0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1"), // DAI
            ],
            bridged_stable_tokens: vec![
                preset("0xFF970A61A04b1cA14834A43f5dE4533eBDDB5CC8"), // USDC.e
            ],
            secondary_reference_tokens: vec![
                preset("0x5979D7b546E38E414F7E9822514be443A4800529"), // wstETH
            ],
        }
    }

    pub fn base() -> Self {
        Self {
            network: Network::Base,
            native_token: preset("0x4200000000000000000000000000000000000006"),
            reference_pair: None,
            fallback_pool: Some(preset("0x88A43bbDF9D098eEC7bCEda4e2494615dfD9bB9C")),
            stable_tokens: vec![
                preset("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"), // USDC
            ],
            bridged_stable_tokens: vec![
                preset("0xd9aAEc86B65D86f6A7B5B1b0c42FFA531710b6CA"), // USDbC
            ],
            secondary_reference_tokens: vec![
                preset("0xc1CBa3fCea344f92D9239c08C0568f6F2F0ee452"), // wstETH
                preset("0x2Ae3F1Ec7F1F5012CFEab0185bfc7aa3cf0DEc22"), // cbETH
            ],
        }
    }

    pub fn is_native(&self, token: &Address) -> bool {
        self.native_token == *token
    }

    pub fn is_stable(&self, token: &Address) -> bool {
        self.stable_tokens.contains(token) || self.bridged_stable_tokens.contains(token)
    }

    pub fn is_secondary_reference(&self, token: &Address) -> bool {
        self.secondary_reference_tokens.contains(token)
    }
}

/// Complete indexer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub network: NetworkConfig,
    // AMM protocols whose pairs are tracked. empty tracks everything
    pub tracked_protocols: Vec<ProtocolId>,
    // Decimals of lending pool shares
    pub share_decimals: u32,
    // Log every notification at debug level
    pub verbose: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Network::Arbitrum.config()
    }
}

impl IndexerConfig {
    pub fn for_network(network: NetworkConfig) -> Self {
        Self {
            network,
            tracked_protocols: Vec::new(),
            share_decimals: 18,
            verbose: false,
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_protocol_tracked(&self, protocol: ProtocolId) -> bool {
        self.tracked_protocols.is_empty() || self.tracked_protocols.contains(&protocol)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let net = &self.network;
        if net.native_token.is_zero() {
            return Err(ConfigError::InvalidNativeToken);
        }

        let roles: [(&str, &Vec<Address>); 3] = [
            ("stable", &net.stable_tokens),
            ("bridged stable", &net.bridged_stable_tokens),
            ("secondary reference", &net.secondary_reference_tokens),
        ];
        for (i, (name, tokens)) in roles.iter().enumerate() {
            if tokens.contains(&net.native_token) {
                return Err(ConfigError::OverlappingRoles {
                    token: net.native_token,
                    reason: format!("native token listed as {name}"),
                });
            }
            for (other_name, other) in roles.iter().skip(i + 1) {
                if let Some(token) = tokens.iter().find(|t| other.contains(t)) {
                    return Err(ConfigError::OverlappingRoles {
                        token: *token,
                        reason: format!("listed as both {name} and {other_name}"),
                    });
                }
            }
        }

        // past 36 the decimal conversion drops every fractional digit a share could carry
        if self.share_decimals > 36 {
            return Err(ConfigError::InvalidShareDecimals(self.share_decimals));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("native token must be a non-zero address")]
    InvalidNativeToken,

    #[error("token {token:?} has overlapping pricing roles: {reason}")]
    OverlappingRoles { token: Address, reason: String },

    #[error("share decimals {0} out of range")]
    InvalidShareDecimals(u32),

    #[error("unknown network {0:?}")]
    UnknownNetwork(String),

    #[error("config parse error: {0}")]
    Parse(String),
}
