use std::io::Write;

use crate::Result;

use super::TubeMesh;

/// Streams one or more tube meshes into a Wavefront OBJ document.
///
/// OBJ indices are global and 1-based, so the writer keeps a running vertex
/// offset across meshes.
pub struct ObjWriter<W: Write> {
    writer: W,
    vertex_offset: usize,
}

impl<W: Write> ObjWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            vertex_offset: 0,
        }
    }

    pub fn write_mesh(&mut self, name: &str, mesh: &TubeMesh) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w, "o {name}")?;
        for vertex in mesh.vertices() {
            let [x, y, z] = vertex.position;
            writeln!(w, "v {x:.6} {y:.6} {z:.6}")?;
        }
        for vertex in mesh.vertices() {
            let [u, v] = vertex.uv;
            writeln!(w, "vt {u:.6} {v:.6}")?;
        }
        for vertex in mesh.vertices() {
            let [x, y, z] = vertex.normal;
            writeln!(w, "vn {x:.6} {y:.6} {z:.6}")?;
        }
        for [a, b, c] in mesh.triangles() {
            let [a, b, c] = [a, b, c].map(|index| index as usize + self.vertex_offset + 1);
            writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
        }
        self.vertex_offset += mesh.vertex_count();
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::curve::generate_strand_curve;
    use crate::mesh::extrude_tube;

    #[test]
    fn offsets_indices_across_meshes() {
        let curve = generate_strand_curve(0.2, Vec3::ZERO, 0.0, 8);
        let mesh = extrude_tube(&curve, 1, 0.1, 3, false);

        let mut buffer = Vec::new();
        let mut obj = ObjWriter::new(&mut buffer);
        obj.write_mesh("a", &mesh).unwrap();
        obj.write_mesh("b", &mesh).unwrap();
        obj.finish().unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 16);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 12);
        let last_face = text.lines().filter(|l| l.starts_with("f ")).last().unwrap();
        assert!(last_face
            .split_whitespace()
            .skip(1)
            .all(|corner| corner.split('/').next().unwrap().parse::<usize>().unwrap() > 8));
    }
}
