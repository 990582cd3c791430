//! # CLI Command Implementations
//!
//! `mirrorsync` has a single command, implemented in [`sync`]. It takes the
//! parsed arguments, drives the library, and prints one line per record.

pub mod sync;
