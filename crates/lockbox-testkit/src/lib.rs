//! # Lockbox Testkit
//!
//! Testing utilities for Lockbox.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Record hashes and integrity roots every client must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use lockbox_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, hex);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use lockbox_testkit::generators::{leaves_from_params, LeafSetParams};
//! use lockbox_core::{IntegrityRoot, LeafPolicy};
//!
//! proptest! {
//!     #[test]
//!     fn root_is_deterministic(params: LeafSetParams) {
//!         let leaves = leaves_from_params(&params);
//!         let a = IntegrityRoot::compute(&leaves, LeafPolicy::default(), 0);
//!         let b = IntegrityRoot::compute(&leaves, LeafPolicy::default(), 0);
//!         prop_assert_eq!(a, b);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use lockbox_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new("ada");
//!     fixture.save_notes(3).await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use generators::{leaves_from_params, record, LeafSetParams};
pub use vectors::{all_vectors, root_vectors, verify_all_vectors, GoldenVector, RootVector};
