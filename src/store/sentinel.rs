//! Redis store resolved through Sentinel
//!
//! Sentinel is asked for the current primary of the configured master name,
//! then a multiplexed connection is opened to it. Both hops authenticate with
//! the same password.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::sentinel::{SentinelClient, SentinelNodeConnectionInfo, SentinelServerType};
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisResult};

use super::SmokeStore;
use crate::config::SentinelConfig;
use crate::error::{ConfigError, SmokeError, StoreError};

/// Connection to the primary node, located through Sentinel.
///
/// Nothing touches the network until the first command; a Sentinel or
/// primary that cannot be reached surfaces as that command's error.
pub struct RedisSentinelStore {
    client: SentinelClient,
    connection: Option<MultiplexedConnection>,
    command_timeout: Option<Duration>,
}

impl RedisSentinelStore {
    /// Prepare a store for `config`. Fails only on a malformed address.
    pub fn new(config: &SentinelConfig) -> Result<Self, SmokeError> {
        Ok(Self {
            client: sentinel_client(config)?,
            connection: None,
            command_timeout: config.command_timeout,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn connection(&mut self) -> Result<&mut MultiplexedConnection, StoreError> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                tracing::debug!("Resolving primary through sentinel");
                let connection =
                    bounded(self.command_timeout, self.client.get_async_connection()).await?;
                tracing::info!("Connected to primary");
                connection
            }
        };
        Ok(self.connection.insert(connection))
    }
}

/// Build the Sentinel client without touching the network.
fn sentinel_client(config: &SentinelConfig) -> Result<SentinelClient, SmokeError> {
    let (host, port) = config.endpoint()?;

    let sentinel = ConnectionInfo {
        addr: ConnectionAddr::Tcp(host, port),
        redis: RedisConnectionInfo {
            password: Some(config.password.clone()),
            ..Default::default()
        },
    };

    let node = SentinelNodeConnectionInfo {
        redis_connection_info: Some(RedisConnectionInfo {
            db: config.database,
            password: Some(config.password.clone()),
            ..Default::default()
        }),
        ..Default::default()
    };

    SentinelClient::build(
        vec![sentinel],
        config.master_name.clone(),
        Some(node),
        SentinelServerType::Master,
    )
    .map_err(|e| {
        ConfigError::InvalidAddress {
            address: config.address.clone(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Await `fut`, giving up after `limit` when one is set.
async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| StoreError::Timeout { after })?
            .map_err(StoreError::from),
        None => fut.await.map_err(StoreError::from),
    }
}

#[async_trait]
impl SmokeStore for RedisSentinelStore {
    async fn ping(&mut self) -> Result<String, StoreError> {
        let limit = self.command_timeout;
        let connection = self.connection().await?;
        bounded(limit, redis::cmd("PING").query_async(connection)).await
    }

    async fn del(&mut self, key: &str) -> Result<i64, StoreError> {
        let limit = self.command_timeout;
        let connection = self.connection().await?;
        bounded(limit, connection.del(key)).await
    }

    async fn sadd(&mut self, key: &str, member: &str) -> Result<i64, StoreError> {
        let limit = self.command_timeout;
        let connection = self.connection().await?;
        bounded(limit, connection.sadd(key, member)).await
    }

    async fn spop(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let limit = self.command_timeout;
        let connection = self.connection().await?;
        bounded(limit, connection.spop(key)).await
    }

    async fn exists(&mut self, key: &str) -> Result<i64, StoreError> {
        let limit = self.command_timeout;
        let connection = self.connection().await?;
        bounded(limit, connection.exists(key)).await
    }
}
