//! CPU-side mesh description.
//!
//! [`MeshData`] holds interleaved vertex bytes plus the [`VertexLayout`]
//! describing them, and optionally an index buffer. It is pure data; the
//! upload into device buffers happens in the
//! [`VertexCommand`](crate::command::VertexCommand) factory.

use bytemuck::cast_slice;

use crate::error::RenderError;
use crate::types::{IndexFormat, PrimitiveTopology};

/// Semantic meaning of a vertex attribute.
///
/// Semantics are used to match mesh attributes with shader inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeSemantic {
    /// Vertex position (typically float3).
    Position,
    /// Vertex normal (typically float3).
    Normal,
    /// Vertex tangent (typically float4, w = handedness).
    Tangent,
    /// Texture coordinates (typically float2).
    TexCoord0,
    /// Vertex color (typically float4).
    Color,
}

/// Format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Single 32-bit float.
    Float,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
}

impl VertexAttributeFormat {
    /// Get the size in bytes of this format.
    pub fn size(&self) -> usize {
        match self {
            Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }
}

/// One attribute inside an interleaved vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// What this attribute represents.
    pub semantic: VertexAttributeSemantic,
    /// Data format.
    pub format: VertexAttributeFormat,
    /// Byte offset from the start of a vertex.
    pub offset: usize,
}

/// Layout of one interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices.
    pub stride: usize,
    /// Attributes in declaration order.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Creates an empty layout with an explicit stride.
    pub fn new(stride: usize) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
        }
    }

    /// Builds a tightly packed layout, computing offsets and stride from
    /// the attribute order.
    pub fn packed(attributes: &[(VertexAttributeSemantic, VertexAttributeFormat)]) -> Self {
        let mut layout = Self::new(0);
        let mut offset = 0;
        for (semantic, format) in attributes {
            layout.attributes.push(VertexAttribute {
                semantic: *semantic,
                format: *format,
                offset,
            });
            offset += format.size();
        }
        layout.stride = offset;
        layout
    }

    /// Appends an attribute at an explicit offset.
    #[must_use]
    pub fn with_attribute(
        mut self,
        semantic: VertexAttributeSemantic,
        format: VertexAttributeFormat,
        offset: usize,
    ) -> Self {
        self.attributes.push(VertexAttribute {
            semantic,
            format,
            offset,
        });
        self
    }

    /// Finds an attribute by semantic.
    pub fn attribute(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }
}

/// Index buffer contents of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexData {
    /// Raw index bytes.
    pub data: Vec<u8>,
    /// Format of one index.
    pub format: IndexFormat,
    /// Number of indices.
    pub count: u32,
}

/// CPU-side geometry, ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Optional debug label.
    pub label: Option<String>,
    /// Interleaved vertex bytes.
    pub data: Vec<u8>,
    /// Layout of `data`.
    pub layout: VertexLayout,
    /// Number of vertices in `data`.
    pub vertex_count: u32,
    /// Optional index buffer.
    pub indices: Option<IndexData>,
    /// Primitive assembly topology.
    pub topology: PrimitiveTopology,
}

impl MeshData {
    /// Creates mesh data from raw interleaved bytes.
    pub fn new(data: Vec<u8>, layout: VertexLayout, vertex_count: u32) -> Self {
        Self {
            label: None,
            data,
            layout,
            vertex_count,
            indices: None,
            topology: PrimitiveTopology::TriangleList,
        }
    }

    /// Creates position-only mesh data from a float3 slice.
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        let layout = VertexLayout::packed(&[(
            VertexAttributeSemantic::Position,
            VertexAttributeFormat::Float3,
        )]);
        Self::new(
            cast_slice(positions).to_vec(),
            layout,
            positions.len() as u32,
        )
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attach 16-bit indices.
    #[must_use]
    pub fn with_indices_u16(mut self, indices: &[u16]) -> Self {
        self.indices = Some(IndexData {
            data: cast_slice(indices).to_vec(),
            format: IndexFormat::Uint16,
            count: indices.len() as u32,
        });
        self
    }

    /// Attach 32-bit indices.
    #[must_use]
    pub fn with_indices_u32(mut self, indices: &[u32]) -> Self {
        self.indices = Some(IndexData {
            data: cast_slice(indices).to_vec(),
            format: IndexFormat::Uint32,
            count: indices.len() as u32,
        });
        self
    }

    /// Set the primitive topology.
    #[must_use]
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Checks internal consistency.
    ///
    /// The vertex byte length must match `stride * vertex_count` and the
    /// index byte length must match its declared format and count.
    pub fn validate(&self) -> Result<(), RenderError> {
        let expected = self.layout.stride * self.vertex_count as usize;
        if self.data.len() != expected {
            return Err(RenderError::InvalidMesh(format!(
                "vertex data is {} bytes, layout expects {} ({} vertices, stride {})",
                self.data.len(),
                expected,
                self.vertex_count,
                self.layout.stride
            )));
        }
        if let Some(indices) = &self.indices {
            let expected = indices.format.size() * indices.count as usize;
            if indices.data.len() != expected {
                return Err(RenderError::InvalidMesh(format!(
                    "index data is {} bytes, format expects {}",
                    indices.data.len(),
                    expected
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_computes_offsets() {
        let layout = VertexLayout::packed(&[
            (
                VertexAttributeSemantic::Position,
                VertexAttributeFormat::Float3,
            ),
            (
                VertexAttributeSemantic::Normal,
                VertexAttributeFormat::Float3,
            ),
            (
                VertexAttributeSemantic::TexCoord0,
                VertexAttributeFormat::Float2,
            ),
        ]);

        assert_eq!(layout.stride, 32);
        assert_eq!(
            layout.attribute(VertexAttributeSemantic::Normal).unwrap().offset,
            12
        );
        assert_eq!(
            layout
                .attribute(VertexAttributeSemantic::TexCoord0)
                .unwrap()
                .offset,
            24
        );
    }

    #[test]
    fn from_positions_builds_consistent_data() {
        let mesh = MeshData::from_positions(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);

        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.data.len(), 36);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn validate_rejects_truncated_vertex_data() {
        let mut mesh = MeshData::from_positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        mesh.data.pop();

        assert!(matches!(
            mesh.validate(),
            Err(RenderError::InvalidMesh(_))
        ));
    }

    #[test]
    fn validate_rejects_mismatched_index_data() {
        let mut mesh = MeshData::from_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .with_indices_u16(&[0, 1, 2]);
        if let Some(indices) = &mut mesh.indices {
            indices.count = 4;
        }

        assert!(mesh.validate().is_err());
    }

    #[test]
    fn indices_cast_to_bytes() {
        let mesh = MeshData::from_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .with_indices_u32(&[0, 1, 2]);
        let indices = mesh.indices.as_ref().unwrap();

        assert_eq!(indices.format, IndexFormat::Uint32);
        assert_eq!(indices.data.len(), 12);
        assert_eq!(indices.count, 3);
    }
}
