//! Shared test utilities for ocrbatch integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated batch runs with temp directories and an
//!   in-memory audit database
//! - fake OCR engine and PDF rasterizer, so no Tesseract or poppler install
//!   is needed
//! - builders for PNG/JPEG/PDF fixtures

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FakeEngine, FakeRasterizer, TestHarness};
