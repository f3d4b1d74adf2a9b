//! `AllocateCn`: allocates the next change number for a store
//! (spec.md §3/§4.4/§6).
//!
//! The wire value is big-endian, the one documented exception to the
//! protocol's little-endian default. Parsing it with
//! [`IoBuffer::pop_u64_be`] yields the numeric change number directly —
//! no separate byte-swap call is needed before handing it to
//! [`exmdb_dtyp::xid::value_to_gc`], which expects a plain (already
//! host-order) counter value.

use super::opcode;
use crate::error::Result;
use crate::io_buffer::IoBuffer;

pub fn write(buf: &mut IoBuffer) {
    buf.push_u8(opcode::ALLOCATE_CN);
}

pub struct Response {
    pub change_num: u64,
}

impl Response {
    pub fn parse(buf: &mut IoBuffer) -> Result<Self> {
        Ok(Response {
            change_num: buf.pop_u64_be()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_big_endian_change_num() {
        let mut buf = IoBuffer::from_vec(vec![0, 0, 0, 0, 0, 0, 0, 7]);
        let response = Response::parse(&mut buf).unwrap();
        assert_eq!(response.change_num, 7);
    }
}
