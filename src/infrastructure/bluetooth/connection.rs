//! BLE Connection Module
//!
//! Opens the GATT link to a discovered hub and writes motor commands to it.

use crate::domain::error::HubError;
use crate::infrastructure::bluetooth::protocol::{self, HUB_CHAR_UUID};
use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, ValueNotification, WriteType};
use btleplug::platform::Peripheral;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Write side of a hub connection
#[async_trait]
pub trait HubLink: Send {
    /// Write one command, waiting for the hub to acknowledge it
    async fn write_command(&mut self, command: &[u8]) -> Result<(), HubError>;

    /// Tear the link down
    async fn close(&mut self) -> Result<(), HubError>;
}

/// Live GATT connection to a train hub
pub struct BleHubLink {
    peripheral: Peripheral,
    characteristic: Characteristic,
    notification_task: Option<JoinHandle<()>>,
}

impl BleHubLink {
    /// Connect, locate the hub characteristic and subscribe to its notifications
    pub async fn open(peripheral: Peripheral) -> Result<Self, HubError> {
        peripheral.connect().await.map_err(HubError::Connection)?;

        let (characteristic, notifications) = match Self::subscribe(&peripheral).await {
            Ok(subscription) => subscription,
            Err(e) => {
                if let Err(de) = peripheral.disconnect().await {
                    debug!("Disconnect after failed setup failed: {}", de);
                }
                return Err(e);
            }
        };
        let notification_task = tokio::spawn(log_notifications(notifications));

        Ok(Self {
            peripheral,
            characteristic,
            notification_task: Some(notification_task),
        })
    }

    async fn subscribe(
        peripheral: &Peripheral,
    ) -> Result<(Characteristic, Pin<Box<dyn Stream<Item = ValueNotification> + Send>>), HubError>
    {
        // Step 1: Locate the characteristic
        peripheral
            .discover_services()
            .await
            .map_err(HubError::Connection)?;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == HUB_CHAR_UUID)
            .ok_or(HubError::CharacteristicMissing(HUB_CHAR_UUID))?;

        // Step 2: Notifications are only logged
        let notifications = peripheral
            .notifications()
            .await
            .map_err(HubError::Connection)?;
        peripheral
            .subscribe(&characteristic)
            .await
            .map_err(HubError::Connection)?;

        Ok((characteristic, notifications))
    }
}

#[async_trait]
impl HubLink for BleHubLink {
    async fn write_command(&mut self, command: &[u8]) -> Result<(), HubError> {
        self.peripheral
            .write(&self.characteristic, command, WriteType::WithResponse)
            .await
            .map_err(HubError::Write)
    }

    async fn close(&mut self) -> Result<(), HubError> {
        if let Some(task) = self.notification_task.take() {
            task.abort();
        }

        if let Err(e) = self.peripheral.unsubscribe(&self.characteristic).await {
            debug!("Unsubscribe failed: {}", e);
        }

        match self.peripheral.is_connected().await {
            Ok(false) => {
                warn!("Hub already dropped the connection");
                Ok(())
            }
            _ => self
                .peripheral
                .disconnect()
                .await
                .map_err(HubError::Connection),
        }
    }
}

impl Drop for BleHubLink {
    fn drop(&mut self) {
        if let Some(task) = self.notification_task.take() {
            task.abort();
        }
    }
}

async fn log_notifications<S>(mut notifications: S)
where
    S: Stream<Item = ValueNotification> + Unpin,
{
    while let Some(notification) = notifications.next().await {
        if notification.uuid == HUB_CHAR_UUID {
            debug!(
                "Received notification: {}",
                protocol::format_notification(&notification.value)
            );
        }
    }
    info!("Notification stream closed");
}
