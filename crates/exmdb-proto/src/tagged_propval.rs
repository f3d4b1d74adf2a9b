//! [`TaggedPropval`]: the tagged-union property value at the heart of
//! the exmdb wire protocol (spec.md §3/§4.2).
//!
//! Ownership is explicit, per spec.md §9: a propval either owns its
//! backing bytes (deep copy, `'static` lifetime) or borrows the
//! caller's buffer (`Cow::Borrowed`, tied to `'a`). This replaces the
//! source's "copy vs. view" flag with a type-level distinction, the way
//! the teacher's `MultiWSz`/`ChainedItemList` own their parsed data
//! while request builders elsewhere in the stack borrow caller buffers.

use std::borrow::Cow;

use crate::error::{ProtoError, Result};
use crate::io_buffer::IoBuffer;
use crate::propval_type::PropvalType;

/// The value carried by a [`TaggedPropval`], shaped by its
/// [`PropvalType`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropvalValue<'a> {
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Currency(i64),
    FileTime(u64),
    Float(f32),
    Double(f64),
    FloatingTime(f64),
    /// UTF-8 string bytes, NUL-terminated on the wire.
    String(Cow<'a, [u8]>),
    /// UTF-16-tagged string bytes; transport is identical to `String`.
    WString(Cow<'a, [u8]>),
    Binary(Cow<'a, [u8]>),
    Uint8Array(Cow<'a, [u8]>),
    Uint16Array(Cow<'a, [u16]>),
    Uint32Array(Cow<'a, [u32]>),
    Uint64Array(Cow<'a, [u64]>),
    FloatArray(Cow<'a, [f32]>),
    DoubleArray(Cow<'a, [f64]>),
    CurrencyArray(Cow<'a, [i64]>),
    FloatingTimeArray(Cow<'a, [f64]>),
    FileTimeArray(Cow<'a, [u64]>),
    StringArray(Vec<Cow<'a, [u8]>>),
    WStringArray(Vec<Cow<'a, [u8]>>),
    BinaryArray(Vec<Cow<'a, [u8]>>),
}

impl<'a> PropvalValue<'a> {
    pub fn propval_type(&self) -> PropvalType {
        use PropvalValue::*;
        match self {
            Uint8(_) => PropvalType::Uint8,
            Uint16(_) => PropvalType::Uint16,
            Uint32(_) => PropvalType::Uint32,
            Uint64(_) => PropvalType::Uint64,
            Currency(_) => PropvalType::Currency,
            FileTime(_) => PropvalType::FileTime,
            Float(_) => PropvalType::Float,
            Double(_) => PropvalType::Double,
            FloatingTime(_) => PropvalType::FloatingTime,
            String(_) => PropvalType::String,
            WString(_) => PropvalType::WString,
            Binary(_) => PropvalType::Binary,
            Uint8Array(_) => PropvalType::Uint8Array,
            Uint16Array(_) => PropvalType::Uint16Array,
            Uint32Array(_) => PropvalType::Uint32Array,
            Uint64Array(_) => PropvalType::Uint64Array,
            FloatArray(_) => PropvalType::FloatArray,
            DoubleArray(_) => PropvalType::DoubleArray,
            CurrencyArray(_) => PropvalType::CurrencyArray,
            FloatingTimeArray(_) => PropvalType::FloatingTimeArray,
            FileTimeArray(_) => PropvalType::FileTimeArray,
            StringArray(_) => PropvalType::StringArray,
            WStringArray(_) => PropvalType::WStringArray,
            BinaryArray(_) => PropvalType::BinaryArray,
        }
    }

    /// Deep-copies any borrowed bytes, producing a value that owns its
    /// storage and outlives the original borrow.
    pub fn into_owned(self) -> PropvalValue<'static> {
        use PropvalValue::*;
        match self {
            Uint8(v) => Uint8(v),
            Uint16(v) => Uint16(v),
            Uint32(v) => Uint32(v),
            Uint64(v) => Uint64(v),
            Currency(v) => Currency(v),
            FileTime(v) => FileTime(v),
            Float(v) => Float(v),
            Double(v) => Double(v),
            FloatingTime(v) => FloatingTime(v),
            String(v) => String(Cow::Owned(v.into_owned())),
            WString(v) => WString(Cow::Owned(v.into_owned())),
            Binary(v) => Binary(Cow::Owned(v.into_owned())),
            Uint8Array(v) => Uint8Array(Cow::Owned(v.into_owned())),
            Uint16Array(v) => Uint16Array(Cow::Owned(v.into_owned())),
            Uint32Array(v) => Uint32Array(Cow::Owned(v.into_owned())),
            Uint64Array(v) => Uint64Array(Cow::Owned(v.into_owned())),
            FloatArray(v) => FloatArray(Cow::Owned(v.into_owned())),
            DoubleArray(v) => DoubleArray(Cow::Owned(v.into_owned())),
            CurrencyArray(v) => CurrencyArray(Cow::Owned(v.into_owned())),
            FloatingTimeArray(v) => FloatingTimeArray(Cow::Owned(v.into_owned())),
            FileTimeArray(v) => FileTimeArray(Cow::Owned(v.into_owned())),
            StringArray(v) => StringArray(
                v.into_iter().map(|s| Cow::Owned(s.into_owned())).collect(),
            ),
            WStringArray(v) => WStringArray(
                v.into_iter().map(|s| Cow::Owned(s.into_owned())).collect(),
            ),
            BinaryArray(v) => BinaryArray(
                v.into_iter().map(|s| Cow::Owned(s.into_owned())).collect(),
            ),
        }
    }
}

/// A `(tag, type, value)` triple. `tag`'s low 16 bits encode `type`
/// unless that code is [`PropvalType::Unspecified`], in which case
/// `type` is carried as an explicit out-of-band field on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPropval<'a> {
    pub tag: u32,
    pub ty: PropvalType,
    pub value: PropvalValue<'a>,
}

impl<'a> TaggedPropval<'a> {
    /// Builds a propval from a tag and an already-typed value,
    /// validating that the tag's declared type (when not
    /// [`PropvalType::Unspecified`]) agrees with the value.
    pub fn new(tag: u32, value: PropvalValue<'a>) -> Result<Self> {
        let declared = PropvalType::try_from(PropvalType::code_of_tag(tag))?;
        let actual = value.propval_type();
        if declared != PropvalType::Unspecified && declared != actual {
            return Err(ProtoError::InvalidType {
                expected: declared,
                actual,
            });
        }
        Ok(TaggedPropval { tag, ty: actual, value })
    }

    /// The `id` half of the tag (its high 16 bits).
    pub fn property_id(&self) -> u16 {
        (self.tag >> 16) as u16
    }

    pub fn uint8(tag: u32, v: u8) -> Result<Self> {
        Self::new(tag, PropvalValue::Uint8(v))
    }

    pub fn uint16(tag: u32, v: u16) -> Result<Self> {
        Self::new(tag, PropvalValue::Uint16(v))
    }

    pub fn uint32(tag: u32, v: u32) -> Result<Self> {
        Self::new(tag, PropvalValue::Uint32(v))
    }

    pub fn uint64(tag: u32, v: u64) -> Result<Self> {
        Self::new(tag, PropvalValue::Uint64(v))
    }

    pub fn filetime(tag: u32, v: u64) -> Result<Self> {
        Self::new(tag, PropvalValue::FileTime(v))
    }

    /// Takes ownership of `s` (deep copy), tying the result to
    /// `'static`.
    pub fn string_owned(tag: u32, s: impl Into<Vec<u8>>) -> Result<TaggedPropval<'static>> {
        TaggedPropval::new(tag, PropvalValue::String(Cow::Owned(s.into())))
    }

    /// Borrows `s`; the returned propval cannot outlive it.
    pub fn string_borrowed(tag: u32, s: &'a [u8]) -> Result<Self> {
        Self::new(tag, PropvalValue::String(Cow::Borrowed(s)))
    }

    /// Takes ownership of `s` (deep copy) as a [`PropvalType::WString`]
    /// value, tying the result to `'static`. Most textual MAPI
    /// properties (display names, comments, message classes) are
    /// declared `WString` rather than `String`; use this instead of
    /// [`Self::string_owned`] for those tags.
    pub fn wstring_owned(tag: u32, s: impl Into<Vec<u8>>) -> Result<TaggedPropval<'static>> {
        TaggedPropval::new(tag, PropvalValue::WString(Cow::Owned(s.into())))
    }

    /// Borrows `s` as a [`PropvalType::WString`] value; the returned
    /// propval cannot outlive it.
    pub fn wstring_borrowed(tag: u32, s: &'a [u8]) -> Result<Self> {
        Self::new(tag, PropvalValue::WString(Cow::Borrowed(s)))
    }

    pub fn binary_owned(tag: u32, bytes: impl Into<Vec<u8>>) -> Result<TaggedPropval<'static>> {
        TaggedPropval::new(tag, PropvalValue::Binary(Cow::Owned(bytes.into())))
    }

    pub fn binary_borrowed(tag: u32, bytes: &'a [u8]) -> Result<Self> {
        Self::new(tag, PropvalValue::Binary(Cow::Borrowed(bytes)))
    }

    pub fn into_owned(self) -> TaggedPropval<'static> {
        TaggedPropval {
            tag: self.tag,
            ty: self.ty,
            value: self.value.into_owned(),
        }
    }

    /// Serializes `tag` (and `type` iff the tag's declared type is
    /// [`PropvalType::Unspecified`]), then the value per `type`.
    pub fn write_to(&self, buf: &mut IoBuffer) -> Result<()> {
        buf.push_u32(self.tag);
        let declared = PropvalType::try_from(PropvalType::code_of_tag(self.tag))?;
        if declared == PropvalType::Unspecified {
            buf.push_u16(self.ty as u16);
        }
        self.write_value(buf)
    }

    fn write_value(&self, buf: &mut IoBuffer) -> Result<()> {
        use PropvalValue::*;
        match &self.value {
            Uint8(v) => buf.push_u8(*v),
            Uint16(v) => buf.push_u16(*v),
            Uint32(v) => buf.push_u32(*v),
            Uint64(v) => buf.push_u64(*v),
            Currency(v) => buf.push_i64(*v),
            FileTime(v) => buf.push_u64(*v),
            Float(v) => buf.push_f32(*v),
            Double(v) => buf.push_f64(*v),
            FloatingTime(v) => buf.push_f64(*v),
            String(v) | WString(v) => buf.push_cstr(v),
            Binary(v) => buf.push_binary(v),
            Uint8Array(v) => buf.push_binary(v),
            Uint16Array(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_u16(*e);
                }
            }
            Uint32Array(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_u32(*e);
                }
            }
            Uint64Array(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_u64(*e);
                }
            }
            FloatArray(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_f32(*e);
                }
            }
            DoubleArray(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_f64(*e);
                }
            }
            CurrencyArray(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_i64(*e);
                }
            }
            FloatingTimeArray(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_f64(*e);
                }
            }
            FileTimeArray(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_u64(*e);
                }
            }
            StringArray(v) | WStringArray(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_cstr(e);
                }
            }
            BinaryArray(v) => {
                buf.push_u32(v.len() as u32);
                for e in v.iter() {
                    buf.push_binary(e);
                }
            }
        }
        Ok(())
    }

    /// Deserializes a propval, always producing an owned (`'static`)
    /// value: reading from a received buffer has no caller-supplied
    /// storage to borrow from.
    pub fn read_from(buf: &mut IoBuffer) -> Result<TaggedPropval<'static>> {
        let tag = buf.pop_u32()?;
        let declared = PropvalType::try_from(PropvalType::code_of_tag(tag))?;
        let ty = if declared == PropvalType::Unspecified {
            PropvalType::try_from(buf.pop_u16()?)?
        } else {
            declared
        };
        let value = Self::read_value(buf, ty)?;
        Ok(TaggedPropval { tag, ty, value })
    }

    fn read_value(buf: &mut IoBuffer, ty: PropvalType) -> Result<PropvalValue<'static>> {
        use PropvalType as T;
        Ok(match ty {
            T::Unspecified => return Err(ProtoError::UnsupportedType(ty as u16)),
            T::Uint8 => PropvalValue::Uint8(buf.pop_u8()?),
            T::Uint16 => PropvalValue::Uint16(buf.pop_u16()?),
            T::Uint32 => PropvalValue::Uint32(buf.pop_u32()?),
            T::Uint64 => PropvalValue::Uint64(buf.pop_u64()?),
            T::Currency => PropvalValue::Currency(buf.pop_i64()?),
            T::FileTime => PropvalValue::FileTime(buf.pop_u64()?),
            T::Float => PropvalValue::Float(buf.pop_f32()?),
            T::Double => PropvalValue::Double(buf.pop_f64()?),
            T::FloatingTime => PropvalValue::FloatingTime(buf.pop_f64()?),
            T::String => PropvalValue::String(Cow::Owned(buf.pop_cstr()?.to_vec())),
            T::WString => PropvalValue::WString(Cow::Owned(buf.pop_cstr()?.to_vec())),
            T::Binary => PropvalValue::Binary(Cow::Owned(buf.pop_binary()?.to_vec())),
            T::Uint8Array => PropvalValue::Uint8Array(Cow::Owned(buf.pop_binary()?.to_vec())),
            T::Uint16Array => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_u16()?);
                }
                PropvalValue::Uint16Array(Cow::Owned(v))
            }
            T::Uint32Array => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_u32()?);
                }
                PropvalValue::Uint32Array(Cow::Owned(v))
            }
            T::Uint64Array => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_u64()?);
                }
                PropvalValue::Uint64Array(Cow::Owned(v))
            }
            T::FloatArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_f32()?);
                }
                PropvalValue::FloatArray(Cow::Owned(v))
            }
            T::DoubleArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_f64()?);
                }
                PropvalValue::DoubleArray(Cow::Owned(v))
            }
            T::CurrencyArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_i64()?);
                }
                PropvalValue::CurrencyArray(Cow::Owned(v))
            }
            T::FloatingTimeArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_f64()?);
                }
                PropvalValue::FloatingTimeArray(Cow::Owned(v))
            }
            T::FileTimeArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(buf.pop_u64()?);
                }
                PropvalValue::FileTimeArray(Cow::Owned(v))
            }
            T::StringArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(Cow::Owned(buf.pop_cstr()?.to_vec()));
                }
                PropvalValue::StringArray(v)
            }
            T::WStringArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(Cow::Owned(buf.pop_cstr()?.to_vec()));
                }
                PropvalValue::WStringArray(v)
            }
            T::BinaryArray => {
                let n = buf.pop_u32()? as usize;
                let mut v = Vec::with_capacity(n);
                for _ in 0..n {
                    v.push(Cow::Owned(buf.pop_binary()?.to_vec()));
                }
                PropvalValue::BinaryArray(v)
            }
        })
    }
}
