//! Integration tests for SEO-Reach
//!
//! These tests use wiremock to stand up mock sites and exercise the real
//! HTTP clients end to end.

mod crawl_tests;
mod fetch_tests;
