//! Folder lifecycle calls: `GetFolderByName`, `CreateFolderByProperties`,
//! `DeleteFolder`, `EmptyFolder` (spec.md §4.4).

use super::{opcode, push_propval_list, push_username};
use crate::error::Result;
use crate::io_buffer::IoBuffer;
use crate::tagged_propval::TaggedPropval;

pub mod get_by_name {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, parent_folder_id: u64, folder_name: &str) {
        buf.push_u8(opcode::GET_FOLDER_BY_NAME);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u64(parent_folder_id);
        buf.push_cstr(folder_name.as_bytes());
    }

    pub struct Response {
        pub folder_id: u64,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            folder_id: buf.pop_u64()?,
        })
    }
}

pub mod create_by_properties {
    use super::*;

    pub fn write(
        buf: &mut IoBuffer,
        homedir: &str,
        cpid: u32,
        propvals: &[TaggedPropval],
    ) -> Result<()> {
        buf.push_u8(opcode::CREATE_FOLDER_BY_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
        push_propval_list(buf, propvals)
    }

    pub struct Response {
        pub folder_id: u64,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            folder_id: buf.pop_u64()?,
        })
    }
}

pub mod delete {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, cpid: u32, folder_id: u64, hard: bool) {
        buf.push_u8(opcode::DELETE_FOLDER);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
        buf.push_u64(folder_id);
        buf.push_u8(u8::from(hard));
    }

    pub struct Response {
        pub success: bool,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            success: buf.pop_u8()? != 0,
        })
    }
}

pub mod empty {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    pub fn write(
        buf: &mut IoBuffer,
        homedir: &str,
        cpid: u32,
        username: Option<&str>,
        folder_id: u64,
        hard: bool,
        normal: bool,
        associated: bool,
        subfolders: bool,
    ) {
        buf.push_u8(opcode::EMPTY_FOLDER);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
        push_username(buf, username);
        buf.push_u64(folder_id);
        buf.push_u8(u8::from(hard));
        buf.push_u8(u8::from(normal));
        buf.push_u8(u8::from(associated));
        buf.push_u8(u8::from(subfolders));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_by_name_parses_folder_id() {
        let mut buf = IoBuffer::new();
        buf.push_u64(0x1122_3344_5566_7788);
        let response = get_by_name::parse(&mut buf).unwrap();
        assert_eq!(response.folder_id, 0x1122_3344_5566_7788);
    }

    #[test]
    fn delete_parses_success_flag() {
        let mut buf = IoBuffer::new();
        buf.push_u8(1);
        assert!(delete::parse(&mut buf).unwrap().success);
    }

    #[test]
    fn empty_writes_all_four_bool_flags() {
        let mut buf = IoBuffer::new();
        empty::write(&mut buf, "h", 0, None, 1, true, false, true, false);
        let bytes = buf.as_slice();
        let flags = &bytes[bytes.len() - 4..];
        assert_eq!(flags, &[1, 0, 1, 0]);
    }
}
