//! `Connect`: must be the first call issued on a fresh socket
//! (spec.md §4.4).

use super::opcode;
use crate::io_buffer::IoBuffer;

pub fn write(buf: &mut IoBuffer, prefix: &str, is_private: bool) {
    buf.push_u8(opcode::CONNECT);
    buf.push_cstr(prefix.as_bytes());
    buf.push_u8(u8::from(is_private));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_opcode_prefix_and_mode_flag() {
        let mut buf = IoBuffer::new();
        write(&mut buf, "exmdb", true);
        let bytes = buf.as_slice();
        assert_eq!(bytes[0], opcode::CONNECT);
        assert_eq!(&bytes[1..6], b"exmdb");
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes[7], 1);
    }
}
