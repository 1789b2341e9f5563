use crate::config::BenchctlConfig;
use crate::prelude::*;
use crate::registry::RegistryClient;

pub async fn run(config: &BenchctlConfig) -> Result<()> {
    let registry = RegistryClient::new(&config.registry.url, config.registry.timeout()?)?;

    start_group!("Checking the image registry");
    let alive = registry.check_alive().await;
    end_group!();

    alive?;
    info!("Registry at {} is reachable", registry.base_url());
    Ok(())
}
