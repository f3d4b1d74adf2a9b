//! [`PropertyProblem`]: reported per-propval failure in a batch property
//! set (`SetFolderProperties`, `SetStoreProperties`; spec.md's
//! "Structures" list names this type without saying where it's produced —
//! see `SPEC_FULL.md`'s "Structures" module note).

use binrw::prelude::*;

/// One failed propval in a batch property-set call: its index into the
/// request's propval array, the tag that failed, and the server's error
/// code for that single propval.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyProblem {
    pub index: u16,
    pub proptag: u32,
    pub error_code: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn wire_round_trip() {
        let problem = PropertyProblem {
            index: 3,
            proptag: 0x3001_001f,
            error_code: 0x8004_0111,
        };
        let mut buf = Vec::new();
        problem.write_le(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), 10);
        let read_back = PropertyProblem::read_le(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(problem, read_back);
    }
}
