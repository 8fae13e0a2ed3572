//! Data Transfer Objects for the server API
//!
//! DTOs are lightweight request and response shapes. Domain types that are
//! already transport friendly (Run, LogEntry, SourceInfo) are sent as is.

pub mod run;
