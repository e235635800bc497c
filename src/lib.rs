pub mod aggregation;
pub mod batch;
pub mod cache;
pub mod cgds;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod expression;
pub mod fs_util;
pub mod hpa;
pub mod output;
pub mod profile;
pub mod progress;
pub mod retry;
pub mod table;
pub mod tcga;
