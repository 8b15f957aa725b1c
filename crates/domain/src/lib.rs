//! `rc-domain`: types shared by every research-chat crate: the error
//! type, provider-agnostic conversation types, and configuration.

pub mod config;
pub mod error;
pub mod tool;
