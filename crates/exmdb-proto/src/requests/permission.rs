//! `UpdateFolderPermission` (spec.md §4.4, driven by `ExmdbQueries`'s
//! permission-diff logic in §4.6).

use super::opcode;
use crate::error::Result;
use crate::io_buffer::IoBuffer;
use crate::permission::PermissionData;

pub fn write(
    buf: &mut IoBuffer,
    homedir: &str,
    folder_id: u64,
    include_freebusy: bool,
    permissions: &[PermissionData],
) -> Result<()> {
    buf.push_u8(opcode::UPDATE_FOLDER_PERMISSION);
    buf.push_cstr(homedir.as_bytes());
    buf.push_u64(folder_id);
    buf.push_u8(u8::from(include_freebusy));
    buf.push_u32(permissions.len() as u32);
    for row in permissions {
        buf.push_u32(row.flags as u32);
        buf.push_u32(row.propvals.len() as u32);
        for propval in &row.propvals {
            propval.write_to(buf)?;
        }
    }
    Ok(())
}
