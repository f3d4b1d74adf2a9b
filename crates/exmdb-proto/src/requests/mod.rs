//! The request/response catalog (spec.md §4.4).
//!
//! Every call is a pair: a `write_*` free function that appends the
//! opcode and arguments to an [`IoBuffer`](crate::io_buffer::IoBuffer)
//! request body, and a response type with a `parse` constructor that
//! reads the typed response body. [`opcode`] is the single source of
//! truth for the opcode byte each call leads with; a real deployment
//! takes its complete id list from the server's published call-code
//! table, this catalog covers the calls spec.md names plus the
//! same-family supplements noted in the expanded specification.

pub mod cn;
pub mod folder;
pub mod message;
pub mod named_property;
pub mod permission;
pub mod ping;
pub mod properties;
pub mod session;
pub mod table;

use crate::error::Result;
use crate::io_buffer::IoBuffer;

/// Opcode catalog: the first byte of every request body.
pub mod opcode {
    pub const CONNECT: u8 = 0x00;
    pub const PING: u8 = 0x01;
    pub const ALLOCATE_CN: u8 = 0x02;
    pub const LOAD_HIERARCHY_TABLE: u8 = 0x03;
    pub const LOAD_CONTENT_TABLE: u8 = 0x04;
    pub const LOAD_PERMISSION_TABLE: u8 = 0x05;
    pub const QUERY_TABLE: u8 = 0x06;
    pub const UNLOAD_TABLE: u8 = 0x07;
    pub const GET_FOLDER_BY_NAME: u8 = 0x08;
    pub const CREATE_FOLDER_BY_PROPERTIES: u8 = 0x09;
    pub const DELETE_FOLDER: u8 = 0x0a;
    pub const EMPTY_FOLDER: u8 = 0x0b;
    pub const SET_FOLDER_PROPERTIES: u8 = 0x0c;
    pub const GET_FOLDER_PROPERTIES: u8 = 0x0d;
    pub const SET_STORE_PROPERTIES: u8 = 0x0e;
    pub const GET_STORE_PROPERTIES: u8 = 0x0f;
    pub const GET_ALL_STORE_PROPERTIES: u8 = 0x10;
    pub const REMOVE_STORE_PROPERTIES: u8 = 0x11;
    pub const UPDATE_FOLDER_PERMISSION: u8 = 0x12;
    pub const GET_MESSAGE_PROPERTIES: u8 = 0x13;
    pub const DELETE_MESSAGES: u8 = 0x14;
    pub const RESOLVE_NAMED_PROPERTIES: u8 = 0x15;
    pub const GET_NAMED_PROPERTY_IDS: u8 = 0x16;
    pub const GET_PROPERTY_NAMES: u8 = 0x17;
}

/// Appends a `u32` count followed by each tag, the `VArray<u32>` shape
/// spec.md §4.1 describes for proptag lists.
pub(crate) fn push_proptags(buf: &mut IoBuffer, proptags: &[u32]) {
    buf.push_u32(proptags.len() as u32);
    for tag in proptags {
        buf.push_u32(*tag);
    }
}

pub(crate) fn pop_proptags(buf: &mut IoBuffer) -> Result<Vec<u32>> {
    let n = buf.pop_u32()? as usize;
    let mut tags = Vec::with_capacity(n);
    for _ in 0..n {
        tags.push(buf.pop_u32()?);
    }
    Ok(tags)
}

/// Empty string means "no username" / store-owner context, the
/// convention this catalog uses for the optional `username` argument
/// several calls carry.
pub(crate) fn push_username(buf: &mut IoBuffer, username: Option<&str>) {
    buf.push_cstr(username.unwrap_or("").as_bytes());
}

pub(crate) fn push_restriction(buf: &mut IoBuffer, restriction: Option<&crate::restriction::Restriction>) -> Result<()> {
    match restriction {
        Some(r) => {
            buf.push_u8(1);
            r.serialize(buf)
        }
        None => {
            buf.push_u8(0);
            Ok(())
        }
    }
}

pub(crate) fn pop_propval_list(buf: &mut IoBuffer) -> Result<Vec<crate::tagged_propval::TaggedPropval<'static>>> {
    let n = buf.pop_u32()? as usize;
    let mut propvals = Vec::with_capacity(n);
    for _ in 0..n {
        propvals.push(crate::tagged_propval::TaggedPropval::read_from(buf)?);
    }
    Ok(propvals)
}

pub(crate) fn push_propval_list(buf: &mut IoBuffer, propvals: &[crate::tagged_propval::TaggedPropval]) -> Result<()> {
    buf.push_u32(propvals.len() as u32);
    for propval in propvals {
        propval.write_to(buf)?;
    }
    Ok(())
}
