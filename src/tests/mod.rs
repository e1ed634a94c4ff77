//! Unit tests for the harness plumbing. Suites that talk to a (mock)
//! server live under `tests/`.

mod asserts;
mod config;
mod data;
mod error;
mod retry;
