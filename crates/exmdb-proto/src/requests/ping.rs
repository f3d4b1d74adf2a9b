//! `Ping`: zero-argument liveness probe (SPEC_FULL.md supplement).
//!
//! Not named in spec.md; used by `ExmdbClient::ping` as a cheap way to
//! confirm a connection is still live before an AUTO_RECONNECT-sensitive
//! batch.

use super::opcode;
use crate::io_buffer::IoBuffer;

pub fn write(buf: &mut IoBuffer) {
    buf.push_u8(opcode::PING);
}
