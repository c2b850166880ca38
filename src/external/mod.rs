//! Clients for services outside the hub.

pub mod client;

pub use client::HTTP_CLIENT;
