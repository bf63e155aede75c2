pub mod auth;
pub mod contact;
pub mod error;
pub mod photos;
pub mod sms;

pub use auth::{Identity, IdentityProvider, Role, Session, SignUp, SupabaseAuthClient, SupabaseAuthConfig};
pub use contact::{ContactMessage, ContactRelay, FormRelayClient};
pub use error::{GatewayError, Result};
pub use photos::{PhotoStorage, SupabaseStorageClient, SupabaseStorageConfig};
pub use sms::{Notifier, SolapiClient, SolapiConfig};
