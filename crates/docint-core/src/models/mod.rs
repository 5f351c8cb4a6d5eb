//! Data models for documents, the parameter catalog, reports and configuration.

pub mod catalog;
pub mod config;
pub mod document;
pub mod report;
