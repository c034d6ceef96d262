//! Train Hub Service Module
//!
//! Owns the hub link together with the speed the hub last acknowledged.

use crate::domain::error::HubError;
use crate::domain::models::TrainState;
use crate::domain::settings::HubSettings;
use crate::infrastructure::bluetooth::{
    connection::{BleHubLink, HubLink},
    protocol,
    scanner::HubScanner,
};
use crate::infrastructure::shutdown::Signal;
use btleplug::platform::Peripheral;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{error, info};

/// Fixed waits the hub firmware needs between operations
#[derive(Debug, Clone, Copy)]
pub struct CommandTiming {
    pub settle_delay: Duration,
    pub write_delay: Duration,
}

impl From<&HubSettings> for CommandTiming {
    fn from(settings: &HubSettings) -> Self {
        Self {
            settle_delay: settings.settle_delay(),
            write_delay: settings.write_delay(),
        }
    }
}

/// A single train hub and its motor state
pub struct TrainHub<L = BleHubLink> {
    link: Option<L>,
    state: TrainState,
    timing: CommandTiming,
}

impl TrainHub<BleHubLink> {
    /// Discover the first hub matching the configured name and connect to it.
    ///
    /// Returns `Ok(false)` when `interrupt` fires before a hub was found.
    pub async fn connect<F>(
        &mut self,
        settings: &HubSettings,
        interrupt: Pin<&mut F>,
    ) -> Result<bool, HubError>
    where
        F: Future<Output = Signal>,
    {
        let result = self
            .establish(
                Self::discover(settings),
                |(peripheral, name)| Self::open_link(peripheral, name),
                interrupt,
            )
            .await;

        if let Err(e) = &result {
            error!("Error connecting to hub: {}", e);
        }
        result
    }

    async fn discover(settings: &HubSettings) -> Result<(Peripheral, String), HubError> {
        let scanner = HubScanner::new().await?;
        scanner.find_hub(settings).await
    }

    async fn open_link(peripheral: Peripheral, name: String) -> Result<BleHubLink, HubError> {
        let link = BleHubLink::open(peripheral).await?;
        info!("Connected to hub: {}", name);
        Ok(link)
    }
}

impl<L: HubLink> TrainHub<L> {
    pub fn new(timing: CommandTiming) -> Self {
        Self {
            link: None,
            state: TrainState::default(),
            timing,
        }
    }

    /// Race `discover` against `interrupt`, then open and attach the link.
    ///
    /// Opening is never cancelled, so a hub that accepted the connection is
    /// always attached and a later [`disconnect`](Self::disconnect) closes it.
    pub async fn establish<T, D, O, OFut, F>(
        &mut self,
        discover: D,
        open: O,
        interrupt: Pin<&mut F>,
    ) -> Result<bool, HubError>
    where
        D: Future<Output = Result<T, HubError>>,
        O: FnOnce(T) -> OFut,
        OFut: Future<Output = Result<L, HubError>>,
        F: Future<Output = Signal>,
    {
        let found = tokio::select! {
            found = discover => found?,
            signal = interrupt => {
                info!("Interrupted while scanning ({:?})", signal);
                return Ok(false);
            }
        };

        let link = open(found).await?;
        self.attach(link).await;
        Ok(true)
    }

    /// Take ownership of an open link and wait for the hub to settle
    pub async fn attach(&mut self, link: L) {
        self.link = Some(link);
        self.state.connected = true;
        tokio::time::sleep(self.timing.settle_delay).await;
    }

    pub fn state(&self) -> TrainState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    pub fn current_speed(&self) -> i32 {
        self.state.current_speed
    }

    /// Send a motor command; `current_speed` only changes once the hub acknowledged it
    pub async fn set_speed(&mut self, speed: i32) -> Result<i32, HubError> {
        let command = protocol::motor_command(speed)?;
        let link = self.link.as_mut().ok_or(HubError::NotConnected)?;

        link.write_command(&command).await?;
        self.state.current_speed = speed;

        tokio::time::sleep(self.timing.write_delay).await;
        Ok(speed)
    }

    pub async fn stop(&mut self) -> Result<i32, HubError> {
        self.set_speed(0).await
    }

    pub async fn increase_speed(&mut self, step: i32) -> Result<i32, HubError> {
        self.set_speed(self.state.accelerated(step)).await
    }

    pub async fn decrease_speed(&mut self, step: i32) -> Result<i32, HubError> {
        self.set_speed(self.state.decelerated(step)).await
    }

    pub async fn reverse_direction(&mut self) -> Result<i32, HubError> {
        self.set_speed(self.state.reversed()).await
    }

    /// Stop the motor if it still runs, then close the link
    pub async fn disconnect(&mut self) -> Result<(), HubError> {
        if !self.state.connected {
            return Ok(());
        }

        if self.state.current_speed != 0 {
            if let Err(e) = self.stop().await {
                error!("Error stopping train before disconnect: {}", e);
            }
        }

        self.state.connected = false;
        if let Some(mut link) = self.link.take() {
            link.close().await?;
        }
        info!("Disconnected from hub");
        Ok(())
    }
}
