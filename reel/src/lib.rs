#![deny(clippy::all)]

pub mod auth;
pub mod catalog;
pub mod domain;
pub mod ports;
