//! Convenience shapes returned by [`crate::queries::ExmdbQueries`]
//! (spec.md §2, §4.6).

use std::collections::HashMap;

use exmdb_proto::tagged_propval::TaggedPropval;

/// One row of a folder hierarchy/content query: the requested propvals
/// in request order.
pub type Folder = Vec<TaggedPropval<'static>>;

/// The result of a table-backed folder listing.
#[derive(Debug, Default)]
pub struct FolderList {
    pub folders: Vec<Folder>,
}

/// One row of a permission table: grantee propvals plus the access
/// rights mask carried among them (callers locate the rights tag
/// themselves — this type doesn't interpret propval semantics, per
/// spec.md §1's "interpreting property semantics" non-goal).
pub type FolderMember = Vec<TaggedPropval<'static>>;

#[derive(Debug, Default)]
pub struct FolderMemberList {
    pub members: Vec<FolderMember>,
}

/// `displayName -> body` accumulated by `get_sync_data` (spec.md §4.6).
#[derive(Debug, Default)]
pub struct SyncData {
    pub device_state: HashMap<String, Vec<u8>>,
}
