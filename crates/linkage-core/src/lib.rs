//! # linkage-core
//!
//! Core types, ID helpers, and error types for intake entity linking.
//!
//! This crate provides the foundational types shared across all linkage crates:
//! - Entity structs (`EntityLink`, `AuditEntry`, `LinkSuggestion`)
//! - Entity/link type enums with link-type constraints
//! - Request/response contracts of the link store API
//! - Batch outcomes and reverse-lookup pages
//! - Boundary validation for AI suggestion payloads
//! - ID prefix constants and temporary-id helpers
//! - Trail operation envelope for JSONL persistence
//! - Audit detail sub-types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod requests;
pub mod responses;
pub mod suggestions;
pub mod trail;
