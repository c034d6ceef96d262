//! Bluetooth Module
//!
//! Provides BLE communication with the train hub.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       TrainHub                           │
//! │      (motor state + public API for the input loop)       │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │  Scanner  │  │ Connection │  │ Protocol │
//! │           │  │            │  │          │
//! │ - BLE     │  │ - GATT     │  │ - UUID   │
//! │  discovery│  │   write    │  │ - Motor  │
//! │ - Name    │  │ - Notify   │  │  command │
//! │   match   │  │   logging  │  │          │
//! └───────────┘  └────────────┘  └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Characteristic UUID and motor command encoding
//! - [`scanner`] - BLE discovery of the hub by advertised name
//! - [`connection`] - GATT link, command writes and notification logging
//! - [`service`] - Hub state and speed operations

pub mod connection;
pub mod protocol;
pub mod scanner;
pub mod service;

// Re-export main service for convenience
pub use service::{CommandTiming, TrainHub};
