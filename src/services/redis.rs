use redis::{aio::ConnectionManager, Client};

use crate::errors::Result;

#[derive(Clone)]
pub struct RedisService {
    connection_manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection_manager = ConnectionManager::new(client).await?;

        Ok(Self { connection_manager })
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }
}
