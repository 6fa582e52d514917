//! Flat `u32` command stream device
//!
//! The browser host owns the WebGL context, so inside wasm the core records
//! calls into a word buffer and hands out handle ids itself. JS reads the
//! buffer through `ptr()`/`len()` once per frame, replays it, and calls
//! `clear()`. Layout: opcode word followed by a fixed number of argument
//! words per opcode. `NONE` (u32::MAX) encodes an unbound slot.

use super::{
    BufferTarget, DrawMode, GpuDevice, GpuHandle, ProgramId, TexelType, TextureDesc,
    TextureFormat, TextureTarget,
};

pub const OP_CREATE_TEXTURE: u32 = 1; // handle, width, height, format, type
pub const OP_DELETE_TEXTURE: u32 = 2; // handle
pub const OP_CREATE_BUFFER: u32 = 3; // handle, target, size_lo, size_hi
pub const OP_DELETE_BUFFER: u32 = 4; // handle
pub const OP_USE_PROGRAM: u32 = 5; // program
pub const OP_BIND_TEXTURE: u32 = 6; // unit, target, handle
pub const OP_BIND_BUFFER: u32 = 7; // target, handle
pub const OP_DRAW_ARRAYS: u32 = 8; // mode, first, count

pub const NONE: u32 = u32::MAX;

/// Decoded form of one recorded call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuCommand {
    CreateTexture { texture: GpuHandle, desc: TextureDesc },
    DeleteTexture { texture: GpuHandle },
    CreateBuffer { buffer: GpuHandle, target: BufferTarget, byte_size: u64 },
    DeleteBuffer { buffer: GpuHandle },
    UseProgram { program: Option<ProgramId> },
    BindTexture { unit: u32, target: TextureTarget, texture: Option<GpuHandle> },
    BindBuffer { target: BufferTarget, buffer: Option<GpuHandle> },
    DrawArrays { mode: DrawMode, first: u32, count: u32 },
}

fn opt(v: Option<u32>) -> u32 {
    v.unwrap_or(NONE)
}

fn from_opt(w: u32) -> Option<u32> {
    if w == NONE { None } else { Some(w) }
}

fn texture_target_code(t: TextureTarget) -> u32 {
    match t {
        TextureTarget::Texture2D => 0,
        TextureTarget::CubeMap => 1,
    }
}

fn buffer_target_code(t: BufferTarget) -> u32 {
    t.slot() as u32
}

fn draw_mode_code(m: DrawMode) -> u32 {
    match m {
        DrawMode::Points => 0,
        DrawMode::Lines => 1,
        DrawMode::Triangles => 2,
        DrawMode::TriangleStrip => 3,
    }
}

pub struct CommandQueue {
    words: Vec<u32>,
    next_handle: u32,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self { words: Vec::with_capacity(256), next_handle: 1 }
    }

    fn alloc_handle(&mut self) -> GpuHandle {
        let handle = GpuHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        if self.next_handle == NONE {
            self.next_handle = 1;
        }
        handle
    }

    /// Pointer to the word buffer (for JS replay)
    pub fn ptr(&self) -> *const u32 {
        self.words.as_ptr()
    }

    /// Number of recorded words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Drop recorded words after the host has replayed them
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Decode the recorded stream; stops at the first malformed command
    pub fn commands(&self) -> Vec<GpuCommand> {
        let mut out = Vec::new();
        let w = &self.words;
        let mut i = 0;
        while i < w.len() {
            let args = &w[i + 1..];
            let (cmd, used) = match w[i] {
                OP_CREATE_TEXTURE if args.len() >= 5 => {
                    let (Some(format), Some(texel_type)) =
                        (TextureFormat::from_code(args[3]), TexelType::from_code(args[4]))
                    else {
                        break;
                    };
                    let desc = TextureDesc { width: args[1], height: args[2], format, texel_type };
                    (GpuCommand::CreateTexture { texture: GpuHandle(args[0]), desc }, 5)
                }
                OP_DELETE_TEXTURE if !args.is_empty() => {
                    (GpuCommand::DeleteTexture { texture: GpuHandle(args[0]) }, 1)
                }
                OP_CREATE_BUFFER if args.len() >= 4 => {
                    let target = if args[1] == 0 { BufferTarget::Array } else { BufferTarget::ElementArray };
                    let byte_size = args[2] as u64 | ((args[3] as u64) << 32);
                    (GpuCommand::CreateBuffer { buffer: GpuHandle(args[0]), target, byte_size }, 4)
                }
                OP_DELETE_BUFFER if !args.is_empty() => {
                    (GpuCommand::DeleteBuffer { buffer: GpuHandle(args[0]) }, 1)
                }
                OP_USE_PROGRAM if !args.is_empty() => {
                    (GpuCommand::UseProgram { program: from_opt(args[0]).map(ProgramId) }, 1)
                }
                OP_BIND_TEXTURE if args.len() >= 3 => {
                    let target = if args[1] == 0 { TextureTarget::Texture2D } else { TextureTarget::CubeMap };
                    let texture = from_opt(args[2]).map(GpuHandle);
                    (GpuCommand::BindTexture { unit: args[0], target, texture }, 3)
                }
                OP_BIND_BUFFER if args.len() >= 2 => {
                    let target = if args[0] == 0 { BufferTarget::Array } else { BufferTarget::ElementArray };
                    (GpuCommand::BindBuffer { target, buffer: from_opt(args[1]).map(GpuHandle) }, 2)
                }
                OP_DRAW_ARRAYS if args.len() >= 3 => {
                    let mode = match args[0] {
                        0 => DrawMode::Points,
                        1 => DrawMode::Lines,
                        2 => DrawMode::Triangles,
                        _ => DrawMode::TriangleStrip,
                    };
                    (GpuCommand::DrawArrays { mode, first: args[1], count: args[2] }, 3)
                }
                _ => break,
            };
            out.push(cmd);
            i += 1 + used;
        }
        out
    }
}

impl GpuDevice for CommandQueue {
    fn create_texture(&mut self, desc: &TextureDesc) -> GpuHandle {
        let handle = self.alloc_handle();
        self.words.extend_from_slice(&[
            OP_CREATE_TEXTURE,
            handle.0,
            desc.width,
            desc.height,
            desc.format.code(),
            desc.texel_type.code(),
        ]);
        handle
    }

    fn delete_texture(&mut self, texture: GpuHandle) {
        self.words.extend_from_slice(&[OP_DELETE_TEXTURE, texture.0]);
    }

    fn create_buffer(&mut self, target: BufferTarget, byte_size: u64) -> GpuHandle {
        let handle = self.alloc_handle();
        self.words.extend_from_slice(&[
            OP_CREATE_BUFFER,
            handle.0,
            buffer_target_code(target),
            byte_size as u32,
            (byte_size >> 32) as u32,
        ]);
        handle
    }

    fn delete_buffer(&mut self, buffer: GpuHandle) {
        self.words.extend_from_slice(&[OP_DELETE_BUFFER, buffer.0]);
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.words.extend_from_slice(&[OP_USE_PROGRAM, opt(program.map(|p| p.0))]);
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<GpuHandle>) {
        self.words.extend_from_slice(&[
            OP_BIND_TEXTURE,
            unit,
            texture_target_code(target),
            opt(texture.map(|t| t.0)),
        ]);
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GpuHandle>) {
        self.words.extend_from_slice(&[OP_BIND_BUFFER, buffer_target_code(target), opt(buffer.map(|b| b.0))]);
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.words.extend_from_slice(&[OP_DRAW_ARRAYS, draw_mode_code(mode), first, count]);
    }
}
