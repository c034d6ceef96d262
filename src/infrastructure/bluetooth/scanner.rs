//! BLE Scanner Module
//!
//! Finds the first advertising peripheral whose name looks like a train hub.

use crate::domain::error::HubError;
use crate::domain::settings::HubSettings;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tracing::{debug, info, warn};

/// Case-insensitive substring match of an advertised name against `pattern`
pub fn name_matches(name: &str, pattern: &str) -> bool {
    name.to_uppercase().contains(&pattern.to_uppercase())
}

/// Pick the first candidate whose advertised name matches `pattern`
pub fn select_hub<P>(
    candidates: impl IntoIterator<Item = (P, Option<String>)>,
    pattern: &str,
) -> Option<(P, String)> {
    candidates.into_iter().find_map(|(peripheral, name)| {
        let name = name?;
        name_matches(&name, pattern).then_some((peripheral, name))
    })
}

/// Error for a scan window that closed without a match
pub fn not_found(settings: &HubSettings) -> HubError {
    HubError::NotFound {
        pattern: settings.name_pattern.clone(),
        timeout_ms: settings.scan_timeout_ms,
    }
}

/// BLE scanner bound to the first available adapter
pub struct HubScanner {
    adapter: Adapter,
}

impl HubScanner {
    /// Open the first Bluetooth adapter on this host
    pub async fn new() -> Result<Self, HubError> {
        let manager = Manager::new().await.map_err(HubError::Scan)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(HubError::Scan)?
            .into_iter()
            .next()
            .ok_or(HubError::NoAdapter)?;

        Ok(Self { adapter })
    }

    /// Scan until a matching hub shows up or the scan window closes
    pub async fn find_hub(&self, settings: &HubSettings) -> Result<(Peripheral, String), HubError> {
        info!("Scanning for Train Hub...");

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(HubError::Scan)?;

        let found = tokio::time::timeout(
            settings.scan_timeout(),
            self.search(&settings.name_pattern),
        )
        .await;

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop BLE scan: {}", e);
        }

        match found {
            Ok(Ok(Some((peripheral, name)))) => {
                info!("Found Train Hub: {}", name);
                Ok((peripheral, name))
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(None)) | Err(_) => Err(not_found(settings)),
        }
    }

    async fn search(&self, pattern: &str) -> Result<Option<(Peripheral, String)>, HubError> {
        let mut events = self.adapter.events().await.map_err(HubError::Scan)?;

        // Peripherals the platform already knows about come first
        let mut known = Vec::new();
        for peripheral in self.adapter.peripherals().await.map_err(HubError::Scan)? {
            let name = Self::advertised_name(&peripheral).await;
            known.push((peripheral, name));
        }
        if let Some(found) = select_hub(known, pattern) {
            return Ok(Some(found));
        }

        while let Some(event) = events.next().await {
            let id = match event {
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                _ => continue,
            };
            let peripheral = match self.adapter.peripheral(&id).await {
                Ok(peripheral) => peripheral,
                Err(e) => {
                    debug!("Discovered peripheral vanished: {}", e);
                    continue;
                }
            };
            let name = Self::advertised_name(&peripheral).await;
            if let Some(found) = select_hub([(peripheral, name)], pattern) {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    async fn advertised_name(peripheral: &Peripheral) -> Option<String> {
        let name = peripheral.properties().await.ok()??.local_name?;
        debug!("Saw peripheral {:?}", name);
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_case_insensitive() {
        assert!(name_matches("Train Base Hub", "HUB"));
        assert!(name_matches("HUB NO.4", "hub"));
        assert!(name_matches("smart_hub", "HUB"));
    }

    #[test]
    fn test_name_matches_rejects_others() {
        assert!(!name_matches("Gear VR Controller", "HUB"));
        assert!(!name_matches("", "HUB"));
    }

    #[test]
    fn test_select_hub_takes_first_match() {
        let candidates = vec![
            (1, None),
            (2, Some("Gear VR Controller".to_string())),
            (3, Some("Smart Hub".to_string())),
            (4, Some("HUB NO.4".to_string())),
        ];
        assert_eq!(
            select_hub(candidates, "HUB"),
            Some((3, "Smart Hub".to_string()))
        );
    }

    #[test]
    fn test_select_hub_without_match() {
        assert_eq!(select_hub(Vec::<(u8, Option<String>)>::new(), "HUB"), None);
        assert_eq!(
            select_hub(vec![(1, Some("Speaker".to_string())), (2, None)], "HUB"),
            None
        );
    }

    #[test]
    fn test_not_found_names_pattern_and_window() {
        let settings = HubSettings::default();
        let err = not_found(&settings);
        assert!(matches!(
            &err,
            HubError::NotFound { pattern, timeout_ms: 5000 } if pattern == "HUB"
        ));
        assert!(err.to_string().contains("\"HUB\""));
    }
}
