//! # Clubstore
//!
//! Access to the sports club's single-file database.
//!
//! Clubstore provides:
//! - Store path resolution with fail-fast validation
//! - Driver discovery by family, with an optional pinned driver
//! - Read, write and batch execution with strict commit/rollback discipline
//! - A typed error taxonomy with stable codes and operator hints
//! - Driver diagnostics for operators
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clubstore::prelude::*;
//!
//! fn main() -> Result<(), StoreError> {
//!     let manager = ConnectionManager::new(StoreConfig::file("sports_management_system.db"))?;
//!
//!     let teams = manager.query(&Statement::new(
//!         "SELECT TeamID, TeamName FROM TEAMS ORDER BY TeamID",
//!     ))?;
//!
//!     manager.execute_write(
//!         &Statement::new("INSERT INTO TEAMS (TeamName) VALUES (?)").bind("Falcons"),
//!     )?;
//!
//!     println!("{} teams before insert", teams.len());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Connection manager, drivers and configuration.
pub mod store {
    pub use clubstore_store::*;
}

/// Operator diagnostics.
pub mod diagnose {
    pub use clubstore_store::diagnose::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::store::{
        ConnectionManager, ExecutionResult, FromValue, ResultMode, Row, Statement, StoreConfig,
        StoreError, StoreResult, Value,
    };
}

// Re-export key types at the crate root
pub use store::{ConnectionManager, StoreConfig, StoreError, StoreResult};
