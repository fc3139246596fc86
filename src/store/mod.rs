//! Local persistence of the API key.

mod settings;

pub use settings::{CREDENTIAL_KEY, CredentialStore, StoreError};
