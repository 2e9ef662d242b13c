//! Infrastructure adapters: concrete operation providers.

pub mod fs;
