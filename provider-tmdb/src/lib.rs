pub mod client;

pub use client::TmdbProvider;
