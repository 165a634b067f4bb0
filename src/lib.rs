//! TradeSignal worker
//!
//! Stores trading tasks in Postgres, pulls email jobs from a Redis-backed
//! queue and delivers welcome / trade-signal emails through MailerSend or SMTP.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod mail;
pub mod metrics;
pub mod models;
