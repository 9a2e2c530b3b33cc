// ABOUTME: Configuration module for the form coach runtime
// ABOUTME: Environment-driven settings layered over the core threshold catalog
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment variable parsing and runtime settings
pub mod environment;

pub use environment::{DeliveryConfig, Environment, FormCoachConfig, RetryConfig};
pub use pierre_form_core::config::{ConfigError, ThresholdCatalog};
