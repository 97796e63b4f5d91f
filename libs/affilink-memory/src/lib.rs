//! # AffiLink In-Memory Adapters
//!
//! Implementations of the domain ports that live entirely in process
//! memory:
//!
//! - [`InMemoryStore`]: transactional store with all-or-nothing units of work
//! - [`InMemoryDirectory`]: companies, categories and marketers
//! - [`ManualClock`], [`RecordingAuditSink`], [`RecordingNotifier`]: test doubles
//!
//! Units of work are serialised by one store-wide mutex. Concurrency tests
//! on this store check the services' all-or-nothing behaviour, not row
//! locking; the PostgreSQL locks are covered by the ignored tests in
//! `affilink-postgres`.
//!
//! ## Example
//!
//! ```rust
//! use affilink_domain::{Marketplace, MarketplaceConfig, ServiceContext};
//! use affilink_memory::{InMemoryDirectory, InMemoryStore, RecordingAuditSink, RecordingNotifier};
//! use std::sync::Arc;
//!
//! let ctx = ServiceContext::new(
//!     Arc::new(RecordingAuditSink::default()),
//!     Arc::new(RecordingNotifier::default()),
//!     MarketplaceConfig::default(),
//! );
//! let marketplace = Marketplace::new(InMemoryStore::new(), InMemoryDirectory::new(), ctx);
//! # let _ = marketplace;
//! ```

mod directory;
mod recording;
mod store;

pub use directory::InMemoryDirectory;
pub use recording::{ManualClock, RecordingAuditSink, RecordingNotifier};
pub use store::{InMemoryStore, InMemoryUnitOfWork};
