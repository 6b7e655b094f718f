pub mod client;
pub mod deployment;
pub mod network;

pub use client::EvmClient;
pub use deployment::DeploymentInfo;
pub use network::NetworkConfig;

use crate::infra::config::Config;

/// Event factory address: `EVENT_FACTORY_ADDRESS`, else the `deployment.json`
/// artifact, else `None`.
pub fn resolve_factory_address(config: &Config) -> Option<String> {
    if let Some(addr) = &config.event_factory_address {
        return Some(addr.clone());
    }
    match DeploymentInfo::load(&config.deployment_file) {
        Ok(info) => info.event_factory_address().map(str::to_string),
        Err(e) => {
            tracing::debug!(error = %e, "no deployment artifact");
            None
        }
    }
}
