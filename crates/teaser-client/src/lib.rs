//! Backend client for Teaser.
//!
//! [`HttpChatClient`] implements [`teaser_core::ChatSender`] against the
//! brain-teaser HTTP API.

pub mod http_client;

pub use http_client::HttpChatClient;
