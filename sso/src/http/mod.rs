//! HTTP request helper.

mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
