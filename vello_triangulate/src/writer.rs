// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writing triangles into caller-provided vertex memory.

use bytemuck::{Pod, Zeroable};
use log::warn;
use static_assertions::const_assert_eq;

use crate::mesh::Vertex;

/// Memory for output vertices, typically a mapped GPU buffer.
pub trait VertexAllocator {
    /// Reserve room for `max_count` vertices of `stride` bytes each.
    ///
    /// Returns `None` if the memory can't be provided. The returned slice is at least
    /// `stride * max_count` bytes long and aligned to 4 bytes.
    fn lock(&mut self, stride: usize, max_count: usize) -> Option<&mut [u8]>;

    /// Release the memory returned by the last `lock`, of which the first `actual_count` vertices
    /// were written.
    fn unlock(&mut self, actual_count: usize);
}

/// A vertex with position only.
#[derive(Clone, Copy, Debug, Default, Zeroable, Pod, PartialEq)]
#[repr(C)]
pub struct FillVertex {
    /// The x coordinate.
    pub x: f32,
    /// The y coordinate.
    pub y: f32,
}

/// A vertex with the winding number of its triangle.
#[derive(Clone, Copy, Debug, Default, Zeroable, Pod, PartialEq)]
#[repr(C)]
pub struct WindingVertex {
    /// The x coordinate.
    pub x: f32,
    /// The y coordinate.
    pub y: f32,
    /// The winding number of the triangle.
    pub winding: i32,
}

/// A vertex with antialiasing coverage in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, Zeroable, Pod, PartialEq)]
#[repr(C)]
pub struct CoverageVertex {
    /// The x coordinate.
    pub x: f32,
    /// The y coordinate.
    pub y: f32,
    /// The vertex alpha divided by 255.
    pub coverage: f32,
}

const_assert_eq!(size_of::<FillVertex>(), 8);
const_assert_eq!(size_of::<WindingVertex>(), 12);
const_assert_eq!(size_of::<CoverageVertex>(), 12);

/// The layout of output vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    /// [`FillVertex`].
    Fill,
    /// [`WindingVertex`].
    Winding,
    /// [`CoverageVertex`].
    Coverage,
}

impl VertexFormat {
    /// Size of one vertex in bytes.
    pub fn stride(self) -> usize {
        match self {
            Self::Fill => size_of::<FillVertex>(),
            Self::Winding => size_of::<WindingVertex>(),
            Self::Coverage => size_of::<CoverageVertex>(),
        }
    }
}

/// Receives emitted triangles.
pub(crate) trait TriangleSink {
    fn triangle(&mut self, vertices: [&Vertex; 3], winding: i32);
}

/// Writes vertices into a locked region.
pub(crate) struct VertexWriter<'a> {
    data: &'a mut [u8],
    format: VertexFormat,
    count: usize,
}

impl<'a> VertexWriter<'a> {
    fn new(data: &'a mut [u8], format: VertexFormat) -> Self {
        Self {
            data,
            format,
            count: 0,
        }
    }

    fn push<T: Pod>(&mut self, vertex: T) {
        let stride = size_of::<T>();
        let start = self.count * stride;
        if let Some(dst) = self.data.get_mut(start..start + stride) {
            dst.copy_from_slice(bytemuck::bytes_of(&vertex));
            self.count += 1;
        }
    }

    fn push_vertex(&mut self, vertex: &Vertex, winding: i32) {
        let (x, y) = (vertex.point.x, vertex.point.y);
        match self.format {
            VertexFormat::Fill => self.push(FillVertex { x, y }),
            VertexFormat::Winding => self.push(WindingVertex { x, y, winding }),
            VertexFormat::Coverage => self.push(CoverageVertex {
                x,
                y,
                coverage: vertex.alpha as f32 / 255.0,
            }),
        }
    }
}

impl TriangleSink for VertexWriter<'_> {
    fn triangle(&mut self, vertices: [&Vertex; 3], winding: i32) {
        for v in vertices {
            self.push_vertex(v, winding);
        }
    }
}

/// Lock room for `max_count` vertices, let `write` fill it, and unlock with the count written.
///
/// Returns the number of vertices written, which is zero if the allocator failed.
pub(crate) fn write_vertices<A: VertexAllocator + ?Sized>(
    allocator: &mut A,
    format: VertexFormat,
    max_count: usize,
    write: impl FnOnce(&mut VertexWriter<'_>),
) -> usize {
    if max_count == 0 {
        return 0;
    }
    let Some(data) = allocator.lock(format.stride(), max_count) else {
        warn!("Could not allocate vertices");
        return 0;
    };
    let mut writer = VertexWriter::new(data, format);
    write(&mut writer);
    let count = writer.count;
    allocator.unlock(count);
    count
}

/// A [`VertexAllocator`] backed by a `Vec`.
#[derive(Clone, Debug, Default)]
pub struct VecVertexAllocator {
    // Words rather than bytes, for alignment.
    data: Vec<u32>,
    stride: usize,
    count: usize,
    limit: Option<usize>,
}

impl VecVertexAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator that fails to lock more than `max_bytes`.
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            limit: Some(max_bytes),
            ..Self::default()
        }
    }

    /// The number of vertices written by the last triangulation.
    pub fn vertex_count(&self) -> usize {
        self.count
    }

    /// The stride of the last lock.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The written vertices as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        let bytes: &[u8] = bytemuck::cast_slice(&self.data);
        &bytes[..self.count * self.stride]
    }

    /// The written vertices.
    ///
    /// # Panics
    ///
    /// If `T` does not match the stride of the last lock.
    pub fn vertices<T: Pod>(&self) -> &[T] {
        assert_eq!(size_of::<T>(), self.stride, "vertex type doesn't match stride");
        bytemuck::cast_slice(self.as_bytes())
    }
}

impl VertexAllocator for VecVertexAllocator {
    fn lock(&mut self, stride: usize, max_count: usize) -> Option<&mut [u8]> {
        let bytes = stride.checked_mul(max_count)?;
        if self.limit.is_some_and(|limit| bytes > limit) {
            return None;
        }
        self.stride = stride;
        self.count = 0;
        self.data.clear();
        self.data.resize(bytes.div_ceil(4), 0);
        let data: &mut [u8] = bytemuck::cast_slice_mut(&mut self.data);
        Some(&mut data[..bytes])
    }

    fn unlock(&mut self, actual_count: usize) {
        self.count = actual_count;
    }
}
