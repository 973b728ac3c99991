//! Infrastructure Database Layer
//!
//! This crate provides the database infrastructure for the invoice
//! traceability system on PostgreSQL using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: the domain's storage port
//! is implemented here, hiding SQL and row mapping from the domain
//! layer. A short-TTL worklist cache fronts the bulk list query, with
//! an explicit invalidation hook callers hit after every mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, InvoiceRepository};
//!
//! let pool = create_pool_from_url("postgres://localhost/facturas").await?;
//! let repo = InvoiceRepository::new(pool);
//! repo.init_schema().await?;
//! ```

pub mod cache;
pub mod error;
pub mod pool;
pub mod repositories;

pub use cache::WorklistCache;
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::InvoiceRepository;
