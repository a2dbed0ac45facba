//! Firestore REST v1 adapter

mod rest_store;
pub mod value;

pub use rest_store::FirestoreRestStore;
