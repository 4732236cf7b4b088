//! Integration Tests Module
//!
//! End-to-end audit runs with mock narrative providers, the deterministic
//! tools against the built-in tables, and output persistence.

// Shared mock providers and transcript builders
mod support;

// Full pipeline runs: routing, escalation, patterns, coaching, degradation
mod flow_test;

// Cancellation and worker pool bounds
mod concurrency_test;

// Scanner, scorecard and pattern properties over the built-in tables
mod tools_test;

// Output files and configuration loading
mod output_test;
