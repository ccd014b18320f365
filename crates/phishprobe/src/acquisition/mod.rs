//! Network acquisition helpers shared by the HTTP-backed sources.

pub mod http_client;

pub use http_client::{HeadResponse, HttpClient, HttpResponse};
