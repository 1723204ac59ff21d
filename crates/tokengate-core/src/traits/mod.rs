//! Collaborator traits consumed by the request pipeline.

mod backend;
mod navigator;
mod store;
mod transport;

pub use backend::AuthBackend;
pub use navigator::Navigator;
pub use store::CredentialStore;
pub use transport::Transport;
