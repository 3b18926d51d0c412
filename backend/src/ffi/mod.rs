//! Python bindings (feature `pyo3`)
//!
//! Inputs and configuration cross the boundary as JSON strings; results come
//! back as CSV text, the same artifacts the CLI writes.

pub mod scoring;
