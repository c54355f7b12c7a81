//! HTTP transport for the Kodi JSON-RPC API.

pub mod client;
pub mod rpc;

pub use client::KodiRpcClient;
