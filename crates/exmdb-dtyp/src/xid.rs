//! [`SizedXid`] and the change-number / entity-id (EID) algebra of
//! spec.md §3 and §9.

use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinWrite, Endian};

use crate::error::{DtypError, Result};
use crate::guid::Guid;

/// `{size, guid, local_id}`. `size` is the on-wire byte count of
/// `guid ‖ local_id_prefix` (`16 + local_id_len`), so it ranges `17..=24`
/// for a 1..=8 byte local id prefix.
///
/// Serialized as `size: u8 ‖ guid ‖ first (size - 16) little-endian bytes
/// of local_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedXid {
    pub size: u8,
    pub guid: Guid,
    pub local_id: u64,
}

impl SizedXid {
    pub const MIN_SIZE: u8 = 17;
    pub const MAX_SIZE: u8 = 24;

    pub fn new(size: u8, guid: Guid, local_id: u64) -> Result<Self> {
        if !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size) {
            return Err(DtypError::InvalidXidSize(size));
        }
        Ok(SizedXid { size, guid, local_id })
    }

    /// Length, in bytes, of the `local_id` prefix actually written.
    pub fn local_id_len(&self) -> usize {
        (self.size - Guid::SIZE as u8) as usize
    }
}

impl BinRead for SizedXid {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let pos = reader.stream_position()?;
        let size = u8::read_options(reader, endian, ())?;
        if !(SizedXid::MIN_SIZE..=SizedXid::MAX_SIZE).contains(&size) {
            return Err(binrw::Error::AssertFail {
                pos,
                message: format!("invalid SizedXid size {size}"),
            });
        }
        let guid = Guid::read_options(reader, Endian::Little, ())?;
        let mut bytes = [0u8; 8];
        let local_id_len = (size - Guid::SIZE as u8) as usize;
        reader.read_exact(&mut bytes[..local_id_len])?;
        let local_id = u64::from_le_bytes(bytes);
        Ok(SizedXid { size, guid, local_id })
    }
}

impl BinWrite for SizedXid {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        self.size.write_options(writer, endian, ())?;
        self.guid.write_options(writer, Endian::Little, ())?;
        let bytes = self.local_id.to_le_bytes();
        writer.write_all(&bytes[..self.local_id_len()])?;
        Ok(())
    }
}

/// Converts a plain change-number value (`x < 2^48`) to its "gc"
/// representation: the 48 low bits of `x`, placed in the most
/// significant 6 bytes of a big-endian `u64`.
pub fn value_to_gc(value: u64) -> u64 {
    (value << 16).swap_bytes()
}

/// Inverse of [`value_to_gc`].
pub fn gc_to_value(gc: u64) -> u64 {
    gc.swap_bytes() >> 16
}

/// Builds a 64-bit entity id from a 16-bit replica id and a 48-bit gc
/// value: `replid | (gc << 16)`. Always uses this little-endian-logical
/// layout (spec.md §9: do not branch on host endianness).
pub fn make_eid(replid: u16, gc: u64) -> u64 {
    replid as u64 | (gc << 16)
}

/// The local id of the private message store root folder, used as the
/// default parent folder when the caller passes `parent == 0`
/// (spec.md §4.6, `findFolder`).
pub const PRIVATE_ROOT: u64 = 0x1;

/// The local id of the public store root folder (`publicRoot` /
/// `publicIpmSubtree` in spec.md §4.6's `createFolder` and
/// `getSyncData`).
pub const PUBLIC_ROOT: u64 = 0x9;

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn gc_value_round_trip() {
        // P3: gcToValue(valueToGc(x)) == x for all x < 2^48.
        for x in [0u64, 1, 42, 0xdead_beef, (1u64 << 48) - 1] {
            assert_eq!(gc_to_value(value_to_gc(x)), x, "failed for {x:#x}");
        }
    }

    #[test]
    fn gc_wire_bytes_are_big_endian_encoding_of_value() {
        // The 6 bytes written on the wire (the low-order LE bytes of the
        // gc u64) read back, MSB-first, as the plain change-number value.
        let gc = value_to_gc(1);
        assert_eq!(gc.to_le_bytes()[..6], [0, 0, 0, 0, 0, 1]);

        let gc = value_to_gc(0x0102_0304_0506);
        assert_eq!(gc.to_le_bytes()[..6], [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn sized_xid_wire_round_trip() {
        let guid = Guid::from_domain_id(42);
        let xid = SizedXid::new(22, guid, value_to_gc(1)).unwrap();
        let mut buf = Vec::new();
        xid.write_le(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), 23); // 1 (size) + 16 (guid) + 6 (local_id prefix)
        assert_eq!(buf[0], 22);
        // GUID bytes follow immediately.
        assert_eq!(&buf[1..5], &42u32.to_le_bytes());
        // gc bytes: big-endian 6-byte form of 1.
        assert_eq!(&buf[17..23], &[0, 0, 0, 0, 0, 1]);

        let read_back = SizedXid::read_le(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(read_back.size, 22);
        assert_eq!(read_back.guid, guid);
        // Only the low 48 bits survive the truncated write/read.
        assert_eq!(read_back.local_id, value_to_gc(1));
    }

    #[test]
    fn rejects_out_of_range_size() {
        let guid = Guid::from_domain_id(1);
        assert!(SizedXid::new(16, guid, 0).is_err());
        assert!(SizedXid::new(25, guid, 0).is_err());
    }

    #[test]
    fn make_eid_packs_replid_low_and_gc_high() {
        let eid = make_eid(7, value_to_gc(1));
        assert_eq!(eid & 0xffff, 7);
        assert_eq!(eid >> 16, value_to_gc(1));
    }
}
