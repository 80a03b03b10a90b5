//! Token -> aggregate -> group, rebuilt from scratch on every run

use crate::aggregate::{group_by_device, into_devices, into_things, Aggregator};
use crate::arduino::{ApiClient, ApiConfig, Credentials, TokenProvider};
use crate::config::{AggregationStrategy, ArduinoConfig};
use crate::error::AppError;
use crate::models::Device;

#[derive(Debug)]
pub struct DevicePipeline {
    client: ApiClient,
    credentials: Credentials,
    strategy: AggregationStrategy,
}

impl DevicePipeline {
    pub fn new(client: ApiClient, credentials: Credentials, strategy: AggregationStrategy) -> Self {
        Self {
            client,
            credentials,
            strategy,
        }
    }

    pub fn from_settings(settings: &ArduinoConfig) -> Result<Self, AppError> {
        let client = ApiClient::new(ApiConfig::from_settings(settings)?)?;
        Ok(Self::new(
            client,
            Credentials::from_settings(settings),
            settings.strategy,
        ))
    }

    pub async fn run(&self) -> Result<Vec<Device>, AppError> {
        let token = TokenProvider::new(&self.client)
            .fetch_token(&self.credentials)
            .await?;
        let aggregator = Aggregator::new(&self.client, &token);

        let devices = match self.strategy {
            AggregationStrategy::Things => {
                group_by_device(into_things(aggregator.things_with_properties().await?))
            }
            AggregationStrategy::Devices => into_devices(aggregator.devices_with_things().await?),
        };

        tracing::info!("Aggregated {} devices", devices.len());
        Ok(devices)
    }
}
