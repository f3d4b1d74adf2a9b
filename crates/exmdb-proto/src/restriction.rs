//! [`Restriction`]: the recursive table-filter AST (spec.md §3/§4.3).

use modular_bitfield::prelude::*;

use crate::error::{ProtoError, Result};
use crate::io_buffer::IoBuffer;
use crate::tagged_propval::TaggedPropval;

/// Wire type codes for each [`Restriction`] variant.
mod type_code {
    pub const AND: u8 = 0x00;
    pub const OR: u8 = 0x01;
    pub const NOT: u8 = 0x02;
    pub const CONTENT: u8 = 0x03;
    pub const PROPERTY: u8 = 0x04;
    pub const PROPCOMPARE: u8 = 0x05;
    pub const BITMASK: u8 = 0x06;
    pub const SIZE: u8 = 0x07;
    pub const EXIST: u8 = 0x08;
    pub const SUBRESTRICTION: u8 = 0x09;
    pub const COMMENT: u8 = 0x0a;
    pub const COUNT: u8 = 0x0b;
}

/// Maximum number of propvals a `COMMENT` restriction may carry.
pub const COMMENT_MAX_PROPVALS: usize = 255;

/// Comparison operator shared by `PROPERTY`, `PROPCOMP`, and `SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompareOp {
    Lt = 0x00,
    Le = 0x01,
    Gt = 0x02,
    Ge = 0x03,
    Eq = 0x04,
    Ne = 0x05,
}

impl TryFrom<u8> for CompareOp {
    type Error = ProtoError;

    fn try_from(v: u8) -> Result<Self> {
        use CompareOp::*;
        Ok(match v {
            0x00 => Lt,
            0x01 => Le,
            0x02 => Gt,
            0x03 => Ge,
            0x04 => Eq,
            0x05 => Ne,
            other => return Err(ProtoError::Serialization(format!("unknown compare op {other:#04x}"))),
        })
    }
}

/// Fuzzy match level for `CONTENT` restrictions: a 3-way match method in
/// the low 16 bits, plus three independent flag bits above it.
#[bitfield(bits = 32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyLevel {
    pub method: B16,
    pub ignore_case: bool,
    pub ignore_nonspace: bool,
    pub loose: bool,
    #[skip]
    __: B13,
}

impl FuzzyLevel {
    pub const FULLSTRING: u16 = 0;
    pub const SUBSTRING: u16 = 1;
    pub const PREFIX: u16 = 2;

    pub fn fullstring() -> Self {
        Self::new().with_method(Self::FULLSTRING)
    }

    pub fn substring() -> Self {
        Self::new().with_method(Self::SUBSTRING)
    }

    pub fn prefix() -> Self {
        Self::new().with_method(Self::PREFIX)
    }

    #[must_use]
    pub fn with_ignore_case_flag(mut self) -> Self {
        self.set_ignore_case(true);
        self
    }

    #[must_use]
    pub fn with_ignore_nonspace_flag(mut self) -> Self {
        self.set_ignore_nonspace(true);
        self
    }

    #[must_use]
    pub fn with_loose_flag(mut self) -> Self {
        self.set_loose(true);
        self
    }

    pub fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.into_bytes())
    }

    pub fn from_u32(v: u32) -> Self {
        Self::from_bytes(v.to_le_bytes())
    }
}

/// A filter tree, matched against a table's rows by `QueryTable`.
///
/// [`Restriction::Null`] is a virtual "no filter" marker: it produces
/// no bytes and is only valid at a top-level filter position.
#[derive(Debug, Clone)]
pub enum Restriction<'a> {
    And(Vec<Restriction<'a>>),
    Or(Vec<Restriction<'a>>),
    Not(Box<Restriction<'a>>),
    Content {
        fuzzy_level: FuzzyLevel,
        proptag: u32,
        propval: TaggedPropval<'a>,
    },
    Property {
        op: CompareOp,
        proptag: u32,
        propval: TaggedPropval<'a>,
    },
    PropComp {
        op: CompareOp,
        proptag1: u32,
        proptag2: u32,
    },
    Bitmask {
        all: bool,
        proptag: u32,
        mask: u32,
    },
    Size {
        op: CompareOp,
        proptag: u32,
        size: u32,
    },
    Exist {
        proptag: u32,
    },
    SubRes {
        subobject_tag: u32,
        restriction: Box<Restriction<'a>>,
    },
    Comment {
        propvals: Vec<TaggedPropval<'a>>,
        child: Option<Box<Restriction<'a>>>,
    },
    Count {
        count: u32,
        restriction: Box<Restriction<'a>>,
    },
    Null,
}

impl<'a> Restriction<'a> {
    /// `proptag == 0` is substituted with `propval`'s own tag, as the
    /// source contract requires this at construction time rather than
    /// at serialization time.
    pub fn content(fuzzy_level: FuzzyLevel, proptag: u32, propval: TaggedPropval<'a>) -> Self {
        let proptag = if proptag == 0 { propval.tag } else { proptag };
        Restriction::Content {
            fuzzy_level,
            proptag,
            propval,
        }
    }

    pub fn property(op: CompareOp, proptag: u32, propval: TaggedPropval<'a>) -> Self {
        let proptag = if proptag == 0 { propval.tag } else { proptag };
        Restriction::Property { op, proptag, propval }
    }

    pub fn comment(
        propvals: Vec<TaggedPropval<'a>>,
        child: Option<Restriction<'a>>,
    ) -> Result<Self> {
        if propvals.is_empty() || propvals.len() > COMMENT_MAX_PROPVALS {
            return Err(ProtoError::Serialization(format!(
                "COMMENT propval count {} out of range 1..=255",
                propvals.len()
            )));
        }
        Ok(Restriction::Comment {
            propvals,
            child: child.map(Box::new),
        })
    }

    pub fn serialize(&self, buf: &mut IoBuffer) -> Result<()> {
        match self {
            Restriction::Null => Ok(()),
            Restriction::And(children) => Self::write_chain(buf, type_code::AND, children),
            Restriction::Or(children) => Self::write_chain(buf, type_code::OR, children),
            Restriction::Not(child) => {
                buf.push_u8(type_code::NOT);
                child.serialize(buf)
            }
            Restriction::Content {
                fuzzy_level,
                proptag,
                propval,
            } => {
                buf.push_u8(type_code::CONTENT);
                buf.push_u32(fuzzy_level.to_u32());
                buf.push_u32(*proptag);
                propval.write_to(buf)
            }
            Restriction::Property { op, proptag, propval } => {
                buf.push_u8(type_code::PROPERTY);
                buf.push_u8(*op as u8);
                buf.push_u32(*proptag);
                propval.write_to(buf)
            }
            Restriction::PropComp {
                op,
                proptag1,
                proptag2,
            } => {
                buf.push_u8(type_code::PROPCOMPARE);
                buf.push_u8(*op as u8);
                buf.push_u32(*proptag1);
                buf.push_u32(*proptag2);
                Ok(())
            }
            Restriction::Bitmask { all, proptag, mask } => {
                buf.push_u8(type_code::BITMASK);
                buf.push_u8(u8::from(!*all));
                buf.push_u32(*proptag);
                buf.push_u32(*mask);
                Ok(())
            }
            Restriction::Size { op, proptag, size } => {
                buf.push_u8(type_code::SIZE);
                buf.push_u8(*op as u8);
                buf.push_u32(*proptag);
                buf.push_u32(*size);
                Ok(())
            }
            Restriction::Exist { proptag } => {
                buf.push_u8(type_code::EXIST);
                buf.push_u32(*proptag);
                Ok(())
            }
            Restriction::SubRes {
                subobject_tag,
                restriction,
            } => {
                buf.push_u8(type_code::SUBRESTRICTION);
                buf.push_u32(*subobject_tag);
                restriction.serialize(buf)
            }
            Restriction::Comment { propvals, child } => {
                if propvals.is_empty() || propvals.len() > COMMENT_MAX_PROPVALS {
                    return Err(ProtoError::Serialization(format!(
                        "COMMENT propval count {} out of range 1..=255",
                        propvals.len()
                    )));
                }
                buf.push_u8(type_code::COMMENT);
                buf.push_u8(propvals.len() as u8);
                for propval in propvals {
                    propval.write_to(buf)?;
                }
                match child {
                    Some(child) => {
                        buf.push_u8(1);
                        child.serialize(buf)?;
                    }
                    None => buf.push_u8(0),
                }
                Ok(())
            }
            Restriction::Count { count, restriction } => {
                buf.push_u8(type_code::COUNT);
                buf.push_u32(*count);
                restriction.serialize(buf)
            }
        }
    }

    fn write_chain(buf: &mut IoBuffer, code: u8, children: &[Restriction<'a>]) -> Result<()> {
        let n = u32::try_from(children.len()).map_err(|_| {
            ProtoError::Serialization(format!("restriction chain of {} exceeds u32", children.len()))
        })?;
        buf.push_u8(code);
        buf.push_u32(n);
        for child in children {
            child.serialize(buf)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propval_type::PropvalType;

    fn string_tag() -> u32 {
        0x3001_0000 | PropvalType::String as u32
    }

    #[test]
    fn fuzzy_level_packs_method_and_flags() {
        let level = FuzzyLevel::substring()
            .with_ignore_case_flag()
            .with_loose_flag();
        let packed = level.to_u32();
        assert_eq!(packed & 0xffff, FuzzyLevel::SUBSTRING as u32);
        assert_eq!(packed & (1 << 16), 1 << 16);
        assert_eq!(packed & (1 << 17), 0);
        assert_eq!(packed & (1 << 18), 1 << 18);
        assert_eq!(FuzzyLevel::from_u32(packed), level);
    }

    #[test]
    fn content_substitutes_zero_proptag_with_propval_tag() {
        let propval = TaggedPropval::string_owned(string_tag(), "inbox").unwrap();
        let expected_tag = propval.tag;
        let restriction = Restriction::content(FuzzyLevel::fullstring(), 0, propval);
        match restriction {
            Restriction::Content { proptag, .. } => assert_eq!(proptag, expected_tag),
            _ => panic!("expected Content"),
        }
    }

    #[test]
    fn null_serializes_to_no_bytes() {
        let mut buf = IoBuffer::new();
        Restriction::Null.serialize(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn bitmask_negates_all_flag_on_wire() {
        let mut buf = IoBuffer::new();
        Restriction::Bitmask {
            all: true,
            proptag: 0x1234,
            mask: 0xff,
        }
        .serialize(&mut buf)
        .unwrap();
        assert_eq!(buf.as_slice()[1], 0);

        let mut buf = IoBuffer::new();
        Restriction::Bitmask {
            all: false,
            proptag: 0x1234,
            mask: 0xff,
        }
        .serialize(&mut buf)
        .unwrap();
        assert_eq!(buf.as_slice()[1], 1);
    }

    #[test]
    fn comment_rejects_zero_propvals() {
        let err = Restriction::comment(Vec::new(), None).unwrap_err();
        assert!(matches!(err, ProtoError::Serialization(_)));
    }

    #[test]
    fn comment_round_trips_header_bytes() {
        let propval = TaggedPropval::string_owned(string_tag(), "a").unwrap();
        let restriction = Restriction::comment(vec![propval], None).unwrap();
        let mut buf = IoBuffer::new();
        restriction.serialize(&mut buf).unwrap();
        assert_eq!(buf.as_slice()[0], type_code::COMMENT);
        assert_eq!(buf.as_slice()[1], 1);
        assert_eq!(*buf.as_slice().last().unwrap(), 0);
    }

    #[test]
    fn and_chain_emits_count_then_children() {
        let restriction = Restriction::And(vec![
            Restriction::Exist { proptag: 1 },
            Restriction::Exist { proptag: 2 },
        ]);
        let mut buf = IoBuffer::new();
        restriction.serialize(&mut buf).unwrap();
        assert_eq!(buf.as_slice()[0], type_code::AND);
        let n = u32::from_le_bytes(buf.as_slice()[1..5].try_into().unwrap());
        assert_eq!(n, 2);
    }
}
