//! A synchronous client for the exmdb mailbox store wire protocol:
//! connection/framing (`client`), the compound table-lifecycle
//! operations built on it (`queries`), and the error taxonomy and
//! convenience return shapes both lean on (`error`, `types`).

pub mod client;
pub mod error;
pub mod queries;
pub mod types;

pub use client::{AUTO_RECONNECT, ConnectionParams, ExmdbClient, ExmdbClientBuilder, WriteOutcome};
pub use error::{Error, Result};
pub use queries::ExmdbQueries;
pub use types::{Folder, FolderList, FolderMember, FolderMemberList, SyncData};
