//! Gantry Core
//!
//! Core types shared by every Gantry component.
//!
//! This crate contains:
//! - Domain types: revisions, image references, scan verdicts, runs and logs
//! - DTOs: data transfer objects for the webhook server API

pub mod domain;
pub mod dto;
