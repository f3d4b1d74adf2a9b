//! `GetMessageProperties`, `DeleteMessages` (spec.md §4.4).

use super::{opcode, pop_propval_list, push_proptags, push_username};
use crate::error::Result;
use crate::io_buffer::IoBuffer;
use crate::tagged_propval::TaggedPropval;

pub mod get_properties {
    use super::*;

    pub fn write(
        buf: &mut IoBuffer,
        homedir: &str,
        username: Option<&str>,
        cpid: u32,
        message_id: u64,
        proptags: &[u32],
    ) {
        buf.push_u8(opcode::GET_MESSAGE_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        push_username(buf, username);
        buf.push_u32(cpid);
        buf.push_u64(message_id);
        push_proptags(buf, proptags);
    }

    pub struct Response {
        pub propvals: Vec<TaggedPropval<'static>>,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            propvals: pop_propval_list(buf)?,
        })
    }
}

pub mod delete {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    pub fn write(
        buf: &mut IoBuffer,
        homedir: &str,
        account_id: u32,
        cpid: u32,
        username: Option<&str>,
        folder_id: u64,
        message_ids: &[u64],
        hard: bool,
    ) {
        buf.push_u8(opcode::DELETE_MESSAGES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(account_id);
        buf.push_u32(cpid);
        push_username(buf, username);
        buf.push_u64(folder_id);
        buf.push_u32(message_ids.len() as u32);
        for id in message_ids {
            buf.push_u64(*id);
        }
        buf.push_u8(u8::from(hard));
    }

    pub struct Response {
        pub partial: bool,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            partial: buf.pop_u8()? != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_writes_message_id_array() {
        let mut buf = IoBuffer::new();
        delete::write(&mut buf, "h", 1, 0, None, 9, &[10, 11], true);
        let bytes = buf.as_slice();
        assert_eq!(*bytes.last().unwrap(), 1);
    }

    #[test]
    fn delete_parses_partial_flag() {
        let mut buf = IoBuffer::new();
        buf.push_u8(1);
        assert!(delete::parse(&mut buf).unwrap().partial);
    }
}
