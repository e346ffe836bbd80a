//! Infrastructure layer: persistence, tabular input, document artifacts, config.

pub mod config;
pub mod document;
pub mod store;
pub mod tabular;

pub use config::Settings;
pub use document::{DocumentError, DocumentRef, DocumentRenderer, JsonArtifactRenderer};
pub use store::{
    ActorDirectory, InMemoryStore, InvoiceRepository, JsonFileStore, PaymentRepository,
    StoreError, StoreSnapshot, Transaction, UnitOfWork,
};
pub use tabular::{CsvTabularSource, TabularError, TabularRow, TabularSource};
