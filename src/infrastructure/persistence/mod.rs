//! Document store adapters

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreRestStore;
pub use memory::InMemoryDocumentStore;
