//! `ResolveNamedProperties` and its inverse-direction supplements,
//! `GetNamedPropertyIds` / `GetPropertyNames` (spec.md §4.4;
//! SPEC_FULL.md's "Requests catalog" module note).

use exmdb_dtyp::{Guid, PropertyName, PropertyNameKind};

use super::opcode;
use crate::error::Result;
use crate::io_buffer::IoBuffer;

fn push_guid(buf: &mut IoBuffer, guid: &Guid) {
    buf.push_u32(guid.time_low);
    buf.push_u16(guid.time_mid);
    buf.push_u16(guid.time_hi_version);
    buf.push_raw(&guid.clock_seq);
    buf.push_raw(&guid.node);
}

fn pop_guid(buf: &mut IoBuffer) -> Result<Guid> {
    Ok(Guid {
        time_low: buf.pop_u32()?,
        time_mid: buf.pop_u16()?,
        time_hi_version: buf.pop_u16()?,
        clock_seq: buf.pop_bytes(2)?.try_into().unwrap(),
        node: buf.pop_bytes(6)?.try_into().unwrap(),
    })
}

fn push_property_name(buf: &mut IoBuffer, name: &PropertyName) {
    buf.push_u8(name.kind as u8);
    push_guid(buf, &name.guid);
    match name.kind {
        PropertyNameKind::Id => buf.push_u32(name.lid),
        PropertyNameKind::Name => buf.push_cstr(name.name.as_bytes()),
    }
}

fn pop_property_name(buf: &mut IoBuffer) -> Result<PropertyName> {
    let kind = buf.pop_u8()?;
    let guid = pop_guid(buf)?;
    Ok(match kind {
        0 => PropertyName::by_id(guid, buf.pop_u32()?),
        _ => PropertyName::by_name(guid, String::from_utf8_lossy(buf.pop_cstr()?).into_owned()),
    })
}

fn push_property_names(buf: &mut IoBuffer, names: &[PropertyName]) {
    buf.push_u32(names.len() as u32);
    for name in names {
        push_property_name(buf, name);
    }
}

fn pop_propids(buf: &mut IoBuffer) -> Result<Vec<u16>> {
    let n = buf.pop_u32()? as usize;
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        ids.push(buf.pop_u16()?);
    }
    Ok(ids)
}

pub mod resolve {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, create: bool, propnames: &[PropertyName]) {
        buf.push_u8(opcode::RESOLVE_NAMED_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u8(u8::from(create));
        push_property_names(buf, propnames);
    }

    pub struct Response {
        pub propids: Vec<u16>,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            propids: pop_propids(buf)?,
        })
    }
}

pub mod get_ids {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, propnames: &[PropertyName]) {
        buf.push_u8(opcode::GET_NAMED_PROPERTY_IDS);
        buf.push_cstr(homedir.as_bytes());
        push_property_names(buf, propnames);
    }

    pub struct Response {
        pub propids: Vec<u16>,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            propids: pop_propids(buf)?,
        })
    }
}

pub mod get_names {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, propids: &[u16]) {
        buf.push_u8(opcode::GET_PROPERTY_NAMES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(propids.len() as u32);
        for id in propids {
            buf.push_u16(*id);
        }
    }

    pub struct Response {
        pub propnames: Vec<PropertyName>,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        let n = buf.pop_u32()? as usize;
        let mut propnames = Vec::with_capacity(n);
        for _ in 0..n {
            propnames.push(pop_property_name(buf)?);
        }
        Ok(Response { propnames })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_name_round_trips_by_id() {
        let name = PropertyName::by_id(Guid::from_domain_id(1), 0x8001);
        let mut buf = IoBuffer::new();
        push_property_name(&mut buf, &name);
        let mut reader = IoBuffer::from_vec(buf.into_vec());
        assert_eq!(pop_property_name(&mut reader).unwrap(), name);
    }

    #[test]
    fn property_name_round_trips_by_name() {
        let name = PropertyName::by_name(Guid::from_domain_id(1), "urn:x");
        let mut buf = IoBuffer::new();
        push_property_name(&mut buf, &name);
        let mut reader = IoBuffer::from_vec(buf.into_vec());
        assert_eq!(pop_property_name(&mut reader).unwrap(), name);
    }

    #[test]
    fn get_names_parses_response_list() {
        let mut buf = IoBuffer::new();
        buf.push_u32(1);
        push_property_name(&mut buf, &PropertyName::by_id(Guid::from_domain_id(2), 5));
        let mut reader = IoBuffer::from_vec(buf.into_vec());
        let response = get_names::parse(&mut reader).unwrap();
        assert_eq!(response.propnames.len(), 1);
        assert_eq!(response.propnames[0].lid, 5);
    }
}
