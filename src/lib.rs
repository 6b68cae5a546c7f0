#[macro_use]
extern crate log;
#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod platform;
pub mod service;
pub mod state;
pub mod storage;
mod utils;
