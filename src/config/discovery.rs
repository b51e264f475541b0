use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Only track the local server; never subscribe to the network registry
    #[serde(default)]
    pub local_only: bool,
}
