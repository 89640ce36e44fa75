//! Streaming Nmap XML parsing and scan-intent inference.

pub mod intent;
pub mod nmap;
