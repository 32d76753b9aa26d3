//! NATS reply publisher

use crate::types::prediction::Reply;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes prediction replies back to requesters
#[derive(Clone)]
pub struct ReplyPublisher {
    client: Client,
}

impl ReplyPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish a reply to the requester's inbox
    pub async fn publish(&self, reply_to: Subject, reply: &Reply) -> Result<()> {
        let payload = serde_json::to_vec(reply)?;

        self.client.publish(reply_to.clone(), payload.into()).await?;

        debug!(
            reply_to = %reply_to,
            success = matches!(reply, Reply::Prediction(_)),
            "Published reply"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
