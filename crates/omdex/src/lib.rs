//! Omdex: typed entities over search-indexed key/value stores.
//!
//! ## Crate layout
//! - `core`: schemas, typed values, record conversion, query compilation,
//!   and result materialization.
//!
//! The `prelude` module mirrors the surface application code uses day to
//! day; the execution seam (`SearchExecutor`) rides along so store adapters
//! need only this crate.

pub use omdex_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use omdex_core::{DEFAULT_PAGE_SIZE, error::Error};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        executor::SearchExecutor,
        prelude::*,
        results::{Entity, SearchPage},
    };
}
