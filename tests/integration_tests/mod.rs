//! Integration tests module
//!
//! This module provides end-to-end integration tests for cubewatch,
//! including:
//! - Complete resolve → fetch → diff → store → notify cycle
//! - Error handling and recovery scenarios

pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
