// ABOUTME: Extraction strategies for listing pages: review blocks, review fields, and app metadata.
// ABOUTME: Every cascade is expressed as a FallbackChain of named strategies.

//! Extraction module.
//!
//! Submodules:
//! - `chain`: the [`chain::Strategy`] trait and ordered [`chain::FallbackChain`].
//! - `blocks`: locating candidate review units in a page.
//! - `review`: turning a block into a normalized review.
//! - `metadata`: app name, developer and rating from the landing page.
//! - `fields` / `compiled`: selector helpers shared by the above.

pub mod blocks;
pub mod chain;
pub mod compiled;
pub mod fields;
pub mod metadata;
pub mod review;
