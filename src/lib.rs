// src/lib.rs

//! Blackbird: a small reconnaissance toolkit.
//!
//! The `core` module holds the task engine (port scanning, page fetching and
//! subdomain probing) and knows nothing about how its events are displayed.
//! The binary in `main.rs` wires it to a terminal front end.

pub mod core;
pub mod logging;
