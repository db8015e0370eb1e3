//! Utility functions for code generation, URL checks and request handling.
//!
//! - [`code_generator`] - Alphabet encoding, slug validation, charset and secret generation
//! - [`long_url`] - Long URL syntax checks
//! - [`client_ip`] - Client address extraction from HTTP requests

pub mod client_ip;
pub mod code_generator;
pub mod long_url;
