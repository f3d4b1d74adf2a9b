//! Property tag constants [`crate::tagged_propval`]/`exmdb::queries`
//! need by name. Property ids (the tag's high 16 bits) follow the
//! MS-OXPROPS catalog; the type code (low 16 bits) is this crate's own
//! [`PropvalType`] numbering, since spec.md leaves the wire type codes
//! unspecified.

use crate::propval_type::PropvalType;

const fn tag(id: u32, ty: PropvalType) -> u32 {
    (id << 16) | ty as u32
}

pub const DISPLAY_NAME: u32 = tag(0x3001, PropvalType::WString);
pub const FOLDER_TYPE: u32 = tag(0x3601, PropvalType::Uint32);
pub const PARENT_FOLDER_ID: u32 = tag(0x6749, PropvalType::Uint64);
pub const COMMENT: u32 = tag(0x3004, PropvalType::WString);
pub const CREATION_TIME: u32 = tag(0x3007, PropvalType::FileTime);
pub const LAST_MODIFICATION_TIME: u32 = tag(0x3008, PropvalType::FileTime);
pub const CHANGE_NUMBER: u32 = tag(0x67a4, PropvalType::Uint64);
pub const CHANGE_KEY: u32 = tag(0x65e2, PropvalType::Binary);
pub const PREDECESSOR_CHANGE_LIST: u32 = tag(0x65e3, PropvalType::Binary);
pub const CONTAINER_CLASS: u32 = tag(0x3613, PropvalType::WString);
pub const MESSAGE_CLASS: u32 = tag(0x001a, PropvalType::WString);
pub const FOLDER_ID: u32 = tag(0x6748, PropvalType::Uint64);
pub const MID: u32 = tag(0x674a, PropvalType::Uint64);
pub const BODY: u32 = tag(0x1000, PropvalType::WString);
pub const MEMBER_ID: u32 = tag(0x6671, PropvalType::Uint64);
pub const MEMBER_RIGHTS: u32 = tag(0x6673, PropvalType::Uint32);

/// `FOLDERTYPE` value for a plain (non-search) folder.
pub const FOLDER_TYPE_GENERIC: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_embed_the_expected_type_code_in_the_low_bits() {
        assert_eq!(DISPLAY_NAME & 0xffff, PropvalType::WString as u32);
        assert_eq!(CHANGE_NUMBER & 0xffff, PropvalType::Uint64 as u32);
        assert_eq!(CHANGE_KEY & 0xffff, PropvalType::Binary as u32);
    }
}
