//! Folder- and store-level property get/set/remove calls (spec.md
//! §4.4), including the `PropertyProblem` batch-failure reporting the
//! expanded specification wires into the two `Set*Properties` calls.

use exmdb_dtyp::PropertyProblem;

use super::{opcode, pop_propval_list, push_proptags, push_propval_list};
use crate::error::Result;
use crate::io_buffer::IoBuffer;
use crate::tagged_propval::TaggedPropval;

fn parse_problems(buf: &mut IoBuffer) -> Result<Vec<PropertyProblem>> {
    let n = buf.pop_u32()? as usize;
    let mut problems = Vec::with_capacity(n);
    for _ in 0..n {
        problems.push(PropertyProblem {
            index: buf.pop_u16()?,
            proptag: buf.pop_u32()?,
            error_code: buf.pop_u32()?,
        });
    }
    Ok(problems)
}

pub mod set_folder {
    use super::*;

    pub fn write(
        buf: &mut IoBuffer,
        homedir: &str,
        cpid: u32,
        folder_id: u64,
        propvals: &[TaggedPropval],
    ) -> Result<()> {
        buf.push_u8(opcode::SET_FOLDER_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
        buf.push_u64(folder_id);
        push_propval_list(buf, propvals)
    }

    pub struct Response {
        pub problems: Vec<PropertyProblem>,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            problems: parse_problems(buf)?,
        })
    }
}

pub mod get_folder {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, cpid: u32, folder_id: u64, proptags: &[u32]) {
        buf.push_u8(opcode::GET_FOLDER_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
        buf.push_u64(folder_id);
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

pub mod set_store {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, cpid: u32, propvals: &[TaggedPropval]) -> Result<()> {
        buf.push_u8(opcode::SET_STORE_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
        push_propval_list(buf, propvals)
    }

    pub struct Response {
        pub problems: Vec<PropertyProblem>,
    }

    pub fn parse(buf: &mut IoBuffer) -> Result<Response> {
        Ok(Response {
            problems: parse_problems(buf)?,
        })
    }
}

pub mod get_store {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, cpid: u32, proptags: &[u32]) {
        buf.push_u8(opcode::GET_STORE_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
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

pub mod get_all_store {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, cpid: u32) {
        buf.push_u8(opcode::GET_ALL_STORE_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        buf.push_u32(cpid);
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

pub mod remove_store {
    use super::*;

    pub fn write(buf: &mut IoBuffer, homedir: &str, proptags: &[u32]) {
        buf.push_u8(opcode::REMOVE_STORE_PROPERTIES);
        buf.push_cstr(homedir.as_bytes());
        push_proptags(buf, proptags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_problem_list() {
        let mut buf = IoBuffer::new();
        buf.push_u32(0);
        assert!(parse_problems(&mut buf).unwrap().is_empty());
    }

    #[test]
    fn parses_one_problem() {
        let mut buf = IoBuffer::new();
        buf.push_u32(1);
        buf.push_u16(3);
        buf.push_u32(0x3001_0003);
        buf.push_u32(0x80004005);
        let problems = parse_problems(&mut buf).unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].index, 3);
        assert_eq!(problems[0].proptag, 0x3001_0003);
        assert_eq!(problems[0].error_code, 0x80004005);
    }
}
