//! [`PropertyName`]: the argument/result shape for named-property
//! resolution (`ResolveNamedProperties` and friends).

use crate::guid::Guid;

/// Which of `lid`/`name` is the live field on a [`PropertyName`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PropertyNameKind {
    Id = 0,
    Name = 1,
}

/// A named property's identity: either a numeric id or a string name,
/// scoped to a property set `guid`. Exactly one of `lid`/`name` is live,
/// selected by `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyName {
    pub kind: PropertyNameKind,
    pub guid: Guid,
    pub lid: u32,
    pub name: String,
}

impl PropertyName {
    /// A numeric (`MNID_ID`) named property.
    pub fn by_id(guid: Guid, lid: u32) -> Self {
        PropertyName {
            kind: PropertyNameKind::Id,
            guid,
            lid,
            name: String::new(),
        }
    }

    /// A string (`MNID_STRING`) named property.
    pub fn by_name(guid: Guid, name: impl Into<String>) -> Self {
        PropertyName {
            kind: PropertyNameKind::Name,
            guid,
            lid: 0,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_id_and_by_name_pick_distinct_kinds() {
        let guid = Guid::from_domain_id(1);
        let by_id = PropertyName::by_id(guid, 0x8001);
        assert_eq!(by_id.kind, PropertyNameKind::Id);
        assert_eq!(by_id.lid, 0x8001);

        let by_name = PropertyName::by_name(guid, "urn:schemas:calendar:location");
        assert_eq!(by_name.kind, PropertyNameKind::Name);
        assert_eq!(by_name.name, "urn:schemas:calendar:location");
    }
}
