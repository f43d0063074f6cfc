// src/lib.rs

pub mod app;
pub mod auth;
pub mod chat;
pub mod chat_message;
pub mod config;
pub mod constants;
pub mod errors;
pub mod key_handlers;
pub mod logging;
pub mod login;
pub mod models;
pub mod personas;
pub mod status_indicator;
pub mod store;
pub mod typewriter;
pub mod ui;
pub mod webhook;
