pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod detail;
pub mod domain;
pub mod error;
pub mod filter;
pub mod group;
pub mod ingest;
pub mod normalize;
pub mod report;
pub mod sort;
pub mod source;
pub mod stats;
