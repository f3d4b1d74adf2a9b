//! Small fixed-shape wire structures shared across the exmdb protocol
//! stack: GUIDs, sized XIDs (and the change-number/EID algebra built on
//! them), NT/floating time conversions, named-property identities, and
//! batch property-set problem reports.
#![forbid(unsafe_code)]

pub mod error;
pub mod guid;
pub mod property_name;
pub mod property_problem;
pub mod time;
pub mod xid;

pub use error::{DtypError, Result};
pub use guid::Guid;
pub use property_name::{PropertyName, PropertyNameKind};
pub use property_problem::PropertyProblem;
pub use xid::{PRIVATE_ROOT, PUBLIC_ROOT, SizedXid, gc_to_value, make_eid, value_to_gc};
