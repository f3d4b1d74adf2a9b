//! [`ExmdbQueries`]: the multi-round-trip operations of spec.md §4.6,
//! built on [`ExmdbClient`] with strict "open table / query / unload"
//! discipline (P5).

use std::collections::HashMap;

use binrw::BinWrite;
use binrw::io::Cursor;

use exmdb_dtyp::{Guid, PRIVATE_ROOT, PUBLIC_ROOT, SizedXid, make_eid, nt_now, value_to_gc};
use exmdb_proto::permission::PermissionData;
use exmdb_proto::requests::{cn, folder, message, permission, table};
use exmdb_proto::restriction::{CompareOp, FuzzyLevel, Restriction};
use exmdb_proto::tagged_propval::{PropvalValue, TaggedPropval};
use exmdb_proto::tags;

use crate::client::ExmdbClient;
use crate::error::{Error, Result};
use crate::types::{Folder, FolderList, FolderMember, FolderMemberList, SyncData};

/// Depth flag bit for `LoadHierarchyTable`'s `table_flags`: descend into
/// subfolders rather than list only immediate children.
const TABLE_FLAG_DEPTH: u8 = 0x01;

/// `LoadContentTable`'s `table_flags` value `get_sync_data` uses to pick
/// up the associated "devicedata" message alongside normal messages.
const CONTENT_TABLE_FLAGS_ASSOCIATED: u8 = 0x02;

const DEVICE_DATA_NAME: &str = "devicedata";
const DEVICE_STATE_MESSAGE_CLASS: &str = "IPM.Note.GrommunioState";

/// Member ids spec.md §4.6 excludes from every permission edit: the
/// default/anonymous rows a store always carries.
const SPECIAL_MEMBER_IDS: [u64; 2] = [0, u64::MAX];

/// Wraps an [`ExmdbClient`] with the compound operations spec.md §4.6
/// names. Every method that loads a table unloads it before returning,
/// on both the success and error path.
pub struct ExmdbQueries {
    client: ExmdbClient,
}

impl ExmdbQueries {
    pub fn new(client: ExmdbClient) -> Self {
        ExmdbQueries { client }
    }

    pub fn client(&mut self) -> &mut ExmdbClient {
        &mut self.client
    }

    pub fn into_client(self) -> ExmdbClient {
        self.client
    }

    /// Runs `body` against the already-loaded `table_id`, then unloads
    /// it regardless of `body`'s outcome — the scoped-release discipline
    /// P5 requires, without needing a second mutable borrow of `client`
    /// for a `Drop` guard to hold.
    fn with_loaded_table<T>(
        &mut self,
        homedir: &str,
        table_id: u32,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let result = body(self);
        if let Err(e) = self.client.send(|buf| table::write_unload(buf, homedir, table_id)) {
            log::warn!("exmdb: failed to unload table {table_id}: {e}");
        }
        result
    }

    pub fn list_folders(
        &mut self,
        homedir: &str,
        parent: u64,
        recursive: bool,
        proptags: &[u32],
        offset: u32,
        limit: u32,
        restriction: Option<&Restriction>,
    ) -> Result<FolderList> {
        let table_flags = if recursive { TABLE_FLAG_DEPTH } else { 0 };
        let mut response = self
            .client
            .send(|buf| table::hierarchy::write(buf, homedir, parent, None, table_flags, restriction))?;
        let loaded = table::hierarchy::parse(&mut response)?;

        let effective_limit = if offset == 0 && limit == 0 { loaded.row_count } else { limit };

        self.with_loaded_table(homedir, loaded.table_id, |this| {
            let mut response = this.client.send(|buf| {
                table::write_query(buf, homedir, None, 0, loaded.table_id, proptags, offset, effective_limit)
            })?;
            let parsed = table::parse_query(&mut response)?;
            Ok(FolderList { folders: parsed.entries })
        })
    }

    pub fn find_folder(
        &mut self,
        homedir: &str,
        name: &str,
        parent: u64,
        recursive: bool,
        fuzzy_level: FuzzyLevel,
        proptags: &[u32],
    ) -> Result<FolderList> {
        let parent = if parent == 0 { make_eid(1, PRIVATE_ROOT) } else { parent };
        let name_propval = TaggedPropval::wstring_owned(tags::DISPLAY_NAME, name)?;
        let restriction = Restriction::content(fuzzy_level, 0, name_propval);
        self.list_folders(homedir, parent, recursive, proptags, 0, 0, Some(&restriction))
    }

    pub fn create_folder(&mut self, homedir: &str, domain_id: u32, name: &str, container: &str, comment: &str) -> Result<u64> {
        let mut cn_response = self.client.send(cn::write)?;
        let change_num = cn::Response::parse(&mut cn_response)?.change_num;

        // The big-endian wire value was already normalized to a plain
        // host integer by `IoBuffer::pop_u64_be` in `cn::Response::parse`,
        // so `value_to_gc` is applied directly with no further byte swap.
        let xid = SizedXid::new(22, Guid::from_domain_id(domain_id), value_to_gc(change_num))?;
        let mut xid_bytes = Vec::new();
        xid.write_le(&mut Cursor::new(&mut xid_bytes))
            .map_err(|e| Error::Connection(format!("encoding change key: {e}")))?;

        let parent = make_eid(1, PUBLIC_ROOT);
        let now = nt_now();
        let mut propvals = vec![
            TaggedPropval::uint64(tags::PARENT_FOLDER_ID, parent)?,
            TaggedPropval::uint32(tags::FOLDER_TYPE, tags::FOLDER_TYPE_GENERIC)?,
            TaggedPropval::wstring_owned(tags::DISPLAY_NAME, name)?,
            TaggedPropval::wstring_owned(tags::COMMENT, comment)?,
            TaggedPropval::filetime(tags::CREATION_TIME, now)?,
            TaggedPropval::filetime(tags::LAST_MODIFICATION_TIME, now)?,
            TaggedPropval::uint64(tags::CHANGE_NUMBER, change_num)?,
            TaggedPropval::binary_owned(tags::CHANGE_KEY, xid_bytes.clone())?,
            TaggedPropval::binary_owned(tags::PREDECESSOR_CHANGE_LIST, xid_bytes)?,
        ];
        if !container.is_empty() {
            propvals.push(TaggedPropval::wstring_owned(tags::CONTAINER_CLASS, container)?);
        }

        let mut response = self
            .client
            .send(|buf| folder::create_by_properties::write(buf, homedir, 0, &propvals))?;
        Ok(folder::create_by_properties::parse(&mut response)?.folder_id)
    }

    pub fn delete_folder(&mut self, homedir: &str, folder_id: u64, clear: bool) -> Result<bool> {
        if clear {
            self.client
                .send(|buf| folder::empty::write(buf, homedir, 0, None, folder_id, true, true, true, true))?;
        }
        let mut response = self.client.send(|buf| folder::delete::write(buf, homedir, 0, folder_id, true))?;
        Ok(folder::delete::parse(&mut response)?.success)
    }

    /// An explicit public operation (unlike the other table-lifecycle
    /// helpers): callers need the raw member list for permission edits
    /// that `set_folder_member`/`set_folder_members` alone can't express
    /// (auditing, listing grantees).
    pub fn get_folder_member_list(&mut self, homedir: &str, folder_id: u64) -> Result<FolderMemberList> {
        let mut response = self.client.send(|buf| table::permission::write(buf, homedir, folder_id, 0))?;
        let loaded = table::permission::parse(&mut response)?;

        self.with_loaded_table(homedir, loaded.table_id, |this| {
            let proptags = [tags::MEMBER_ID, tags::MEMBER_RIGHTS];
            let mut response = this.client.send(|buf| {
                table::write_query(buf, homedir, None, 0, loaded.table_id, &proptags, 0, loaded.row_count)
            })?;
            let parsed = table::parse_query(&mut response)?;
            Ok(FolderMemberList { members: parsed.entries })
        })
    }

    /// Edits a single member's rights: `remove == false` grants `rights`
    /// (OR); `remove == true` revokes them (`AND NOT`). A no-op edit (new
    /// rights equal old) produces no `UpdateFolderPermission` call at
    /// all (spec.md §4.6's per-call-site diff, not the `setFolderMembers`
    /// reconciliation below).
    pub fn set_folder_member(&mut self, homedir: &str, folder_id: u64, member_id: u64, rights: u32, remove: bool) -> Result<()> {
        if SPECIAL_MEMBER_IDS.contains(&member_id) {
            return Ok(());
        }
        let current = self.get_folder_member_list(homedir, folder_id)?;
        let existing = current.members.iter().find(|row| member_id_of(row) == Some(member_id));
        let old = existing.and_then(member_rights_of).unwrap_or(0);
        let new = if remove { old & !rights } else { old | rights };
        if new == old {
            return Ok(());
        }
        let propvals = vec![
            TaggedPropval::uint64(tags::MEMBER_ID, member_id)?,
            TaggedPropval::uint32(tags::MEMBER_RIGHTS, new)?,
        ];
        let row = if existing.is_none() {
            PermissionData::add_row(propvals)
        } else if new == 0 {
            PermissionData::remove_row(propvals)
        } else {
            PermissionData::modify_row(propvals)
        };
        self.client.send(|buf| permission::write(buf, homedir, folder_id, false, &[row]))?;
        Ok(())
    }

    /// Reconciles a folder's membership to exactly `users` holding
    /// `rights` (spec.md §4.6/P6): every member in `users` ends up with
    /// `rights` granted on top of whatever it already had
    /// (`old | rights`); every other existing member has `rights`
    /// stripped (`old & !rights`), removed outright iff that leaves it
    /// with zero rights. Special members are never touched. Batches
    /// every resulting edit into one `UpdateFolderPermission` call; a
    /// reconciliation that changes nothing sends no call at all.
    pub fn set_folder_members(&mut self, homedir: &str, folder_id: u64, users: &[u64], rights: u32) -> Result<()> {
        let current = self.get_folder_member_list(homedir, folder_id)?;

        let mut rows = Vec::new();
        for &id in users {
            if SPECIAL_MEMBER_IDS.contains(&id) {
                continue;
            }
            let existing = current.members.iter().find(|row| member_id_of(row) == Some(id));
            let old = existing.and_then(member_rights_of).unwrap_or(0);
            let new = old | rights;
            if new == old {
                continue;
            }
            let propvals = vec![
                TaggedPropval::uint64(tags::MEMBER_ID, id)?,
                TaggedPropval::uint32(tags::MEMBER_RIGHTS, new)?,
            ];
            rows.push(if existing.is_none() {
                PermissionData::add_row(propvals)
            } else {
                PermissionData::modify_row(propvals)
            });
        }

        for row in &current.members {
            let Some(id) = member_id_of(row) else { continue };
            if SPECIAL_MEMBER_IDS.contains(&id) || users.contains(&id) {
                continue;
            }
            let old = member_rights_of(row).unwrap_or(0);
            let new = old & !rights;
            if new == old {
                continue;
            }
            let propvals = vec![
                TaggedPropval::uint64(tags::MEMBER_ID, id)?,
                TaggedPropval::uint32(tags::MEMBER_RIGHTS, new)?,
            ];
            rows.push(if new == 0 {
                PermissionData::remove_row(propvals)
            } else {
                PermissionData::modify_row(propvals)
            });
        }

        if rows.is_empty() {
            return Ok(());
        }
        self.client.send(|buf| permission::write(buf, homedir, folder_id, false, &rows))?;
        Ok(())
    }

    /// Device-state enumeration (spec.md §4.6): one `displayName -> body`
    /// entry per device subfolder carrying a `devicedata` state message.
    pub fn get_sync_data(&mut self, homedir: &str, folder_name: &str) -> Result<SyncData> {
        let public_root = make_eid(1, PUBLIC_ROOT);
        let mut response = self
            .client
            .send(|buf| folder::get_by_name::write(buf, homedir, public_root, folder_name))?;
        let sync_folder_id = folder::get_by_name::parse(&mut response)?.folder_id;

        let proptags = [tags::FOLDER_ID, tags::DISPLAY_NAME];
        let subfolders = self.list_folders(homedir, sync_folder_id, false, &proptags, 0, 0, None)?;

        let mut device_state = HashMap::new();
        for subfolder in subfolders.folders {
            let (Some(folder_id), Some(name)) = (folder_id_of(&subfolder), display_name_of(&subfolder)) else {
                continue;
            };
            let Some(message_id) = self.find_device_data_message(homedir, folder_id)? else {
                continue;
            };
            let mut response = self
                .client
                .send(|buf| message::get_properties::write(buf, homedir, None, 0, message_id, &[tags::BODY]))?;
            let body = body_bytes_of(&message::get_properties::parse(&mut response)?.propvals).unwrap_or_default();
            device_state.insert(name, body);
        }
        Ok(SyncData { device_state })
    }

    /// Locates the single message in `folder_id` matching
    /// `DISPLAYNAME="devicedata"` and `MESSAGECLASS="IPM.Note.GrommunioState"`.
    fn find_device_data_message(&mut self, homedir: &str, folder_id: u64) -> Result<Option<u64>> {
        let dd_filter = Restriction::And(vec![
            Restriction::property(CompareOp::Eq, 0, TaggedPropval::wstring_owned(tags::DISPLAY_NAME, DEVICE_DATA_NAME)?),
            Restriction::property(
                CompareOp::Eq,
                0,
                TaggedPropval::wstring_owned(tags::MESSAGE_CLASS, DEVICE_STATE_MESSAGE_CLASS)?,
            ),
        ]);
        let mut response = self.client.send(|buf| {
            table::content::write(buf, homedir, 0, folder_id, None, CONTENT_TABLE_FLAGS_ASSOCIATED, Some(&dd_filter))
        })?;
        let loaded = table::content::parse(&mut response)?;
        self.with_loaded_table(homedir, loaded.table_id, |this| {
            let mut response = this
                .client
                .send(|buf| table::write_query(buf, homedir, None, 0, loaded.table_id, &[tags::MID], 0, loaded.row_count))?;
            let parsed = table::parse_query(&mut response)?;
            Ok(parsed.entries.first().and_then(|row| mid_of(row)))
        })
    }

    /// `locate -> empty -> delete` the device subfolder. A running device
    /// re-syncs on its next contact with the server.
    pub fn remove_device(&mut self, homedir: &str, folder_name: &str, device_id: &str) -> Result<()> {
        let Some(folder_id) = self.find_device_folder(homedir, folder_name, device_id)? else {
            return Ok(());
        };
        self.client
            .send(|buf| folder::empty::write(buf, homedir, 0, None, folder_id, true, true, true, true))?;
        self.client.send(|buf| folder::delete::write(buf, homedir, 0, folder_id, true))?;
        Ok(())
    }

    /// Deletes every message in the device folder except the
    /// `devicedata` state message, forcing a full resync. Returns
    /// `true` iff the server reports the deletion completed in full.
    pub fn resync_device(&mut self, homedir: &str, folder_name: &str, device_id: &str, user_id: u32) -> Result<bool> {
        let Some(folder_id) = self.find_device_folder(homedir, folder_name, device_id)? else {
            return Ok(true);
        };
        let not_dd = Restriction::Not(Box::new(Restriction::property(
            CompareOp::Eq,
            0,
            TaggedPropval::wstring_owned(tags::DISPLAY_NAME, DEVICE_DATA_NAME)?,
        )));
        let mut response = self
            .client
            .send(|buf| table::content::write(buf, homedir, 0, folder_id, None, 0, Some(&not_dd)))?;
        let loaded = table::content::parse(&mut response)?;
        let message_ids = self.with_loaded_table(homedir, loaded.table_id, |this| {
            let mut response = this
                .client
                .send(|buf| table::write_query(buf, homedir, None, 0, loaded.table_id, &[tags::MID], 0, loaded.row_count))?;
            let parsed = table::parse_query(&mut response)?;
            Ok(parsed.entries.iter().filter_map(|row| mid_of(row)).collect::<Vec<_>>())
        })?;

        let mut response = self
            .client
            .send(|buf| message::delete::write(buf, homedir, user_id, 0, None, folder_id, &message_ids, true))?;
        Ok(!message::delete::parse(&mut response)?.partial)
    }

    fn find_device_folder(&mut self, homedir: &str, folder_name: &str, device_id: &str) -> Result<Option<u64>> {
        let public_root = make_eid(1, PUBLIC_ROOT);
        let mut response = self
            .client
            .send(|buf| folder::get_by_name::write(buf, homedir, public_root, folder_name))?;
        let sync_folder_id = folder::get_by_name::parse(&mut response)?.folder_id;
        let mut response = self
            .client
            .send(|buf| folder::get_by_name::write(buf, homedir, sync_folder_id, device_id))?;
        let folder_id = folder::get_by_name::parse(&mut response)?.folder_id;
        Ok(if folder_id == 0 { None } else { Some(folder_id) })
    }
}

fn find_tag<'a>(row: &'a [TaggedPropval<'static>], tag: u32) -> Option<&'a PropvalValue<'static>> {
    row.iter().find(|p| p.tag == tag).map(|p| &p.value)
}

fn as_uint64(v: Option<&PropvalValue<'static>>) -> Option<u64> {
    match v {
        Some(PropvalValue::Uint64(x)) => Some(*x),
        _ => None,
    }
}

fn as_uint32(v: Option<&PropvalValue<'static>>) -> Option<u32> {
    match v {
        Some(PropvalValue::Uint32(x)) => Some(*x),
        _ => None,
    }
}

fn as_text(v: Option<&PropvalValue<'static>>) -> Option<String> {
    match v {
        Some(PropvalValue::String(s)) | Some(PropvalValue::WString(s)) => Some(String::from_utf8_lossy(s).into_owned()),
        _ => None,
    }
}

fn as_bytes(v: Option<&PropvalValue<'static>>) -> Option<Vec<u8>> {
    match v {
        Some(PropvalValue::String(s)) | Some(PropvalValue::WString(s)) | Some(PropvalValue::Binary(s)) => Some(s.to_vec()),
        _ => None,
    }
}

fn member_id_of(row: &FolderMember) -> Option<u64> {
    as_uint64(find_tag(row, tags::MEMBER_ID))
}

fn member_rights_of(row: &FolderMember) -> Option<u32> {
    as_uint32(find_tag(row, tags::MEMBER_RIGHTS))
}

fn folder_id_of(row: &Folder) -> Option<u64> {
    as_uint64(find_tag(row, tags::FOLDER_ID))
}

fn display_name_of(row: &Folder) -> Option<String> {
    as_text(find_tag(row, tags::DISPLAY_NAME))
}

fn mid_of(row: &[TaggedPropval<'static>]) -> Option<u64> {
    as_uint64(find_tag(row, tags::MID))
}

fn body_bytes_of(propvals: &[TaggedPropval<'static>]) -> Option<Vec<u8>> {
    as_bytes(find_tag(propvals, tags::BODY))
}
