pub mod case;
pub mod classify;
pub mod cli;
pub mod compare;
pub mod config;
pub mod discover;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod golden;
pub mod i18n;
pub mod report;
pub mod runner;
pub mod types;

// Re-export the localization macros
pub use crate::i18n::{t, t_with_args};
