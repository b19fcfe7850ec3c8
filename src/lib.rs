//! Mockup generation and caching engine for print-on-demand storefronts.
//!
//! The engine asks an external renderer to composite a design onto product
//! photos, keeping within the renderer's request budget and reusing results it
//! has already produced.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
