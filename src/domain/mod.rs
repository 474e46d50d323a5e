//! Domain layer containing business entities and the storage contract.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click tracking event model and bounded queue
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler records a [`click_event::ClickEvent`] without waiting
//! 2. [`click_worker::run_click_worker`] applies it with retry
//! 3. Events that do not fit in the queue are dropped and counted

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
