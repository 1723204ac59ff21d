//! tokengate-file - File-backed credential store.

mod store;

pub use store::FileCredentialStore;
