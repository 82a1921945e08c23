//! Rest mesh serialization
//!
//! Writes the skinned mesh's rest-pose geometry as Wavefront OBJ text. The
//! host delivers already-triangulated geometry, so this stays a plain
//! serializer: positions, then texture coordinates and normals when the mesh
//! carries them, then 1-based face triples.

use anyhow::{bail, Result};
use std::io::Write;

use crate::rig::SkinnedMesh;

/// Write `mesh` as Wavefront OBJ.
///
/// Face vertex references use whichever of the `v/vt/vn` forms the mesh's
/// optional attributes permit. Out-of-range triangle indices abort the write.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &SkinnedMesh) -> Result<()> {
    let has_uvs = !mesh.uvs.is_empty();
    let has_normals = !mesh.normals.is_empty();

    writeln!(writer, "o {}", mesh.name)?;
    for position in &mesh.positions {
        writeln!(
            writer,
            "v {:.6} {:.6} {:.6}",
            position.x, position.y, position.z
        )?;
    }
    for uv in &mesh.uvs {
        writeln!(writer, "vt {:.6} {:.6}", uv.x, uv.y)?;
    }
    for normal in &mesh.normals {
        writeln!(writer, "vn {:.6} {:.6} {:.6}", normal.x, normal.y, normal.z)?;
    }

    let vertex_count = mesh.positions.len() as u32;
    for triangle in &mesh.triangles {
        write!(writer, "f")?;
        for &index in triangle {
            if index >= vertex_count {
                bail!(
                    "triangle references vertex {} but mesh has {}",
                    index,
                    vertex_count
                );
            }
            // OBJ indices are 1-based
            let i = index + 1;
            match (has_uvs, has_normals) {
                (true, true) => write!(writer, " {}/{}/{}", i, i, i)?,
                (true, false) => write!(writer, " {}/{}", i, i)?,
                (false, true) => write!(writer, " {}//{}", i, i)?,
                (false, false) => write!(writer, " {}", i)?,
            }
        }
        writeln!(writer)?;
    }

    Ok(())
}
