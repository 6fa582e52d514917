//! GPU-side bookkeeping
//!
//! This layer never talks to a graphics API directly. Every call goes
//! through a [`GpuDevice`], which the host implements (or replays from the
//! [`command_queue::CommandQueue`] word stream). Calls are fire-and-forget:
//! the device hands back integer handles and nothing here waits on the GPU.

pub mod command_queue;
pub mod ledger;
pub mod state_cache;

use serde::{Deserialize, Serialize};

/// Texture or buffer object id issued by the device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuHandle(pub u32);

/// Linked shader program id (programs are compiled by the renderer)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    Alpha,
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
    Depth,
}

impl TextureFormat {
    pub fn channels(self) -> u64 {
        match self {
            Self::Alpha | Self::Luminance | Self::Depth => 1,
            Self::LuminanceAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub(crate) fn code(self) -> u32 {
        match self {
            Self::Alpha => 0,
            Self::Luminance => 1,
            Self::LuminanceAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
            Self::Depth => 5,
        }
    }

    pub(crate) fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Alpha,
            1 => Self::Luminance,
            2 => Self::LuminanceAlpha,
            3 => Self::Rgb,
            4 => Self::Rgba,
            5 => Self::Depth,
            _ => return None,
        })
    }
}

/// Per-channel storage type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TexelType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
    HalfFloat,
    Float,
}

impl TexelType {
    pub fn bytes_per_channel(self) -> u64 {
        match self {
            Self::UnsignedByte => 1,
            Self::UnsignedShort | Self::HalfFloat => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }

    pub(crate) fn code(self) -> u32 {
        match self {
            Self::UnsignedByte => 0,
            Self::UnsignedShort => 1,
            Self::UnsignedInt => 2,
            Self::HalfFloat => 3,
            Self::Float => 4,
        }
    }

    pub(crate) fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::UnsignedByte,
            1 => Self::UnsignedShort,
            2 => Self::UnsignedInt,
            3 => Self::HalfFloat,
            4 => Self::Float,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
}

/// Buffer binding points; the state cache keeps one slot per target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

impl BufferTarget {
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Array => 0,
            Self::ElementArray => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    Points,
    Lines,
    Triangles,
    TriangleStrip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub texel_type: TexelType,
}

/// Driver-facing calls made by the ledger and the render state cache
pub trait GpuDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> GpuHandle;
    fn delete_texture(&mut self, texture: GpuHandle);
    fn create_buffer(&mut self, target: BufferTarget, byte_size: u64) -> GpuHandle;
    fn delete_buffer(&mut self, buffer: GpuHandle);
    fn use_program(&mut self, program: Option<ProgramId>);
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<GpuHandle>);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GpuHandle>);
    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);
}

pub use command_queue::{CommandQueue, GpuCommand};
pub use ledger::{ResourceKind, ResourceLedger, ResourceRecord, ResourceSpec};
pub use state_cache::{RenderStateCache, RenderStats};
