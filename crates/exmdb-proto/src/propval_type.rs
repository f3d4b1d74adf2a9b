//! [`PropvalType`]: the closed catalog of wire type codes a
//! [`crate::TaggedPropval`] can carry (spec.md §3/§4.2).

use binrw::prelude::*;

/// Wire type code for a propval: one per scalar/string/binary shape,
/// plus one array form per shape, plus the special [`PropvalType::Unspecified`]
/// marker that defers the real type to an out-of-band field.
#[binrw::binrw]
#[brw(repr(u16))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropvalType {
    /// Real type is carried out-of-band: an extra `u16` follows the tag
    /// on the wire.
    Unspecified = 0x0000,
    Uint8 = 0x0001,
    Uint16 = 0x0002,
    Uint32 = 0x0003,
    Uint64 = 0x0004,
    Float = 0x0005,
    Double = 0x0006,
    Currency = 0x0007,
    FloatingTime = 0x0008,
    FileTime = 0x0009,
    /// 8-bit (UTF-8) string, NUL-terminated on the wire.
    String = 0x001e,
    /// 16-bit-tagged (UTF-16) string, NUL-terminated on the wire (the
    /// transport framing is identical to [`PropvalType::String`]; only
    /// the logical charset differs, per spec.md §6).
    WString = 0x001f,
    /// `u32` length prefix followed by the raw bytes.
    Binary = 0x0102,

    Uint8Array = 0x1001,
    Uint16Array = 0x1002,
    Uint32Array = 0x1003,
    Uint64Array = 0x1004,
    FloatArray = 0x1005,
    DoubleArray = 0x1006,
    CurrencyArray = 0x1007,
    FloatingTimeArray = 0x1008,
    FileTimeArray = 0x1009,
    StringArray = 0x101e,
    WStringArray = 0x101f,
    BinaryArray = 0x1102,
}

impl PropvalType {
    /// Bit that distinguishes an array form from its scalar counterpart.
    const ARRAY_BIT: u16 = 0x1000;

    /// Recovers the type code embedded in a tag's low 16 bits, without
    /// validating it against the known catalog (used before
    /// [`TryFrom`] has a chance to reject an unsupported code).
    pub fn code_of_tag(tag: u32) -> u16 {
        (tag & 0xffff) as u16
    }

    pub fn is_array(self) -> bool {
        (self as u16) & Self::ARRAY_BIT != 0 && self != PropvalType::Unspecified
    }

    /// For an array variant, the scalar element type it's an array of.
    /// `None` for scalar variants and for [`PropvalType::Unspecified`].
    pub fn element_type(self) -> Option<PropvalType> {
        if !self.is_array() {
            return None;
        }
        PropvalType::try_from((self as u16) & !Self::ARRAY_BIT).ok()
    }

    /// For a scalar variant, the array variant carrying a list of it.
    pub fn array_of(self) -> Option<PropvalType> {
        if self.is_array() || self == PropvalType::Unspecified {
            return None;
        }
        PropvalType::try_from((self as u16) | Self::ARRAY_BIT).ok()
    }
}

impl TryFrom<u16> for PropvalType {
    type Error = crate::error::ProtoError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        use binrw::io::Cursor;
        PropvalType::read_le(&mut Cursor::new(value.to_le_bytes()))
            .map_err(|_| crate::error::ProtoError::UnsupportedType(value))
    }
}

impl std::fmt::Display for PropvalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({:#06x})", *self as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_round_trips_to_element_type() {
        assert_eq!(PropvalType::Uint32Array.element_type(), Some(PropvalType::Uint32));
        assert_eq!(PropvalType::Uint32.array_of(), Some(PropvalType::Uint32Array));
        assert_eq!(PropvalType::Unspecified.array_of(), None);
        assert_eq!(PropvalType::Unspecified.element_type(), None);
    }

    #[test]
    fn classification_matches_array_bit() {
        assert!(PropvalType::BinaryArray.is_array());
        assert!(!PropvalType::Binary.is_array());
        assert!(!PropvalType::Unspecified.is_array());
    }

    #[test]
    fn try_from_rejects_unknown_code() {
        assert!(PropvalType::try_from(0xbeef).is_err());
    }

    #[test]
    fn try_from_accepts_known_code() {
        assert_eq!(PropvalType::try_from(0x0003).unwrap(), PropvalType::Uint32);
    }
}
