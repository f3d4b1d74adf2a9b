//! Table lifecycle calls: `LoadHierarchyTable`, `LoadContentTable`,
//! `LoadPermissionTable`, `QueryTable`, `UnloadTable` (spec.md §4.4).
//!
//! State machine: `idle --Load...Table--> loaded(table_id, row_count)`,
//! `loaded --QueryTable--> loaded` (repeatable, paged by offset/limit),
//! `loaded --UnloadTable--> idle`, always taken on success or error.

use super::{opcode, pop_propval_list, push_proptags, push_restriction, push_username};
use crate::error::Result;
use crate::io_buffer::IoBuffer;
use crate::restriction::Restriction;
use crate::tagged_propval::TaggedPropval;

/// Shared by every `Load...Table` call: the handle and row count the
/// server reports.
pub struct LoadTableResponse {
    pub table_id: u32,
    pub row_count: u32,
}

impl LoadTableResponse {
    fn parse(buf: &mut IoBuffer) -> Result<Self> {
        Ok(LoadTableResponse {
            table_id: buf.pop_u32()?,
            row_count: buf.pop_u32()?,
        })
    }
}

pub mod hierarchy {
    use super::*;

    pub fn write(
        buf: &mut IoBuffer,
        homedir: &str,
        folder_id: u64,
        username: Option<&str>,
        table_flags: u8,
        restriction: Option<&Restriction>,
    ) -> Result<()> {
        buf.push_u8(opcode::LOAD_HIERARCHY_TABLE);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u64(folder_id);
        push_username(buf, username);
        buf.push_u8(table_flags);
        push_restriction(buf, restriction)
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<LoadTableResponse> {
        LoadTableResponse::parse(buf)
    }
}

pub mod content {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    pub fn write(
        buf: &mut IoBuffer,
        homedir: &str,
        cpid: u32,
        folder_id: u64,
        username: Option<&str>,
        table_flags: u8,
        restriction: Option<&Restriction>,
    ) -> Result<()> {
        buf.push_u8(opcode::LOAD_CONTENT_TABLE);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
        buf.push_u64(folder_id);
        push_username(buf, username);
        buf.push_u8(table_flags);
        push_restriction(buf, restriction)
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<LoadTableResponse> {
        LoadTableResponse::parse(buf)
    }
}

pub mod permission {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, folder_id: u64, flags: u8) {
        buf.push_u8(opcode::LOAD_PERMISSION_TABLE);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u64(folder_id);
        buf.push_u8(flags);
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<LoadTableResponse> {
        LoadTableResponse::parse(buf)
    }
}

pub struct QueryTableResponse {
    pub entries: Vec<Vec<TaggedPropval<'static>>>,
}

#[allow(clippy::too_many_arguments)]
pub fn write_query(
    buf: &mut IoBuffer,
    homedir: &str,
    username: Option<&str>,
    cpid: u32,
    table_id: u32,
    proptags: &[u32],
    row_offset: u32,
    row_count: u32,
) {
    buf.push_u8(opcode::QUERY_TABLE);
    buf.push_cstr(homedir.as_bytes());
    push_username(buf, username);
    buf.push_u32(cpid);
    buf.push_u32(table_id);
    push_proptags(buf, proptags);
    buf.push_u32(row_offset);
    buf.push_u32(row_count);
}

pub fn parse_query(buf: &mut IoBuffer) -> Result<QueryTableResponse> {
    let n = buf.pop_u32()? as usize;
    let mut entries = Vec::with_capacity(n);
    for _ in 0..n {
        entries.push(pop_propval_list(buf)?);
    }
    Ok(QueryTableResponse { entries })
}

pub fn write_unload(buf: &mut IoBuffer, homedir: &str, table_id: u32) {
    buf.push_u8(opcode::UNLOAD_TABLE);
    buf.push_cstr(homedir.as_bytes());
    buf.push_u32(table_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_table_response_parses_handle_and_row_count() {
        let mut buf = IoBuffer::new();
        buf.push_u32(5);
        buf.push_u32(42);
        let response = LoadTableResponse::parse(&mut buf).unwrap();
        assert_eq!(response.table_id, 5);
        assert_eq!(response.row_count, 42);
    }

    #[test]
    fn query_table_response_parses_nested_rows() {
        let mut buf = IoBuffer::new();
        buf.push_u32(2); // two rows
        buf.push_u32(0); // row 0: no propvals
        buf.push_u32(0); // row 1: no propvals
        let response = parse_query(&mut buf).unwrap();
        assert_eq!(response.entries.len(), 2);
        assert!(response.entries[0].is_empty());
    }

    #[test]
    fn unload_writes_opcode_homedir_and_table_id() {
        let mut buf = IoBuffer::new();
        write_unload(&mut buf, "h", 9);
        let bytes = buf.as_slice();
        assert_eq!(bytes[0], opcode::UNLOAD_TABLE);
        assert_eq!(&bytes[1..3], b"h\0");
        assert_eq!(u32::from_le_bytes(bytes[3..7].try_into().unwrap()), 9);
    }
}
