//! GPU capability probe
//!
//! Built from the extension names the host reports. A missing feature is a
//! `false` flag, never an error; callers degrade around it.

use serde::{Deserialize, Serialize};

pub const EXT_INSTANCED_ARRAYS: &str = "ANGLE_instanced_arrays";
pub const EXT_DEPTH_TEXTURE: &str = "WEBGL_depth_texture";
pub const EXT_TEXTURE_FLOAT: &str = "OES_texture_float";
pub const EXT_TEXTURE_FLOAT_LINEAR: &str = "OES_texture_float_linear";
pub const EXT_TEXTURE_HALF_FLOAT: &str = "OES_texture_half_float";
pub const EXT_TEXTURE_HALF_FLOAT_LINEAR: &str = "OES_texture_half_float_linear";
pub const EXT_VERTEX_ARRAY_OBJECT: &str = "OES_vertex_array_object";
pub const EXT_COLOR_BUFFER_FLOAT: &str = "EXT_color_buffer_float";
pub const EXT_WEBGL_COLOR_BUFFER_FLOAT: &str = "WEBGL_color_buffer_float";
pub const EXT_ANISOTROPIC: &str = "EXT_texture_filter_anisotropic";
pub const EXT_S3TC_WEBKIT: &str = "WEBKIT_WEBGL_compressed_texture_s3tc";
pub const EXT_S3TC_MOZ: &str = "MOZ_WEBGL_compressed_texture_s3tc";
pub const EXT_S3TC: &str = "WEBGL_compressed_texture_s3tc";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub instancing: bool,
    pub float_textures: bool,
    pub float_linear: bool,
    pub half_float_textures: bool,
    pub half_float_linear: bool,
    pub depth_textures: bool,
    pub vertex_array_objects: bool,
    pub color_buffer_float: bool,
    pub anisotropic_filtering: bool,
    pub texture_compression: bool,
}

impl Capabilities {
    pub fn from_extensions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut caps = Self::default();
        for name in names {
            match name.as_ref().trim() {
                EXT_INSTANCED_ARRAYS => caps.instancing = true,
                EXT_TEXTURE_FLOAT => caps.float_textures = true,
                EXT_TEXTURE_FLOAT_LINEAR => caps.float_linear = true,
                EXT_TEXTURE_HALF_FLOAT => caps.half_float_textures = true,
                EXT_TEXTURE_HALF_FLOAT_LINEAR => caps.half_float_linear = true,
                EXT_DEPTH_TEXTURE => caps.depth_textures = true,
                EXT_VERTEX_ARRAY_OBJECT => caps.vertex_array_objects = true,
                EXT_COLOR_BUFFER_FLOAT | EXT_WEBGL_COLOR_BUFFER_FLOAT => caps.color_buffer_float = true,
                EXT_ANISOTROPIC => caps.anisotropic_filtering = true,
                EXT_S3TC | EXT_S3TC_WEBKIT | EXT_S3TC_MOZ => caps.texture_compression = true,
                _ => {}
            }
        }
        caps
    }

    /// Everything on (native tests, headless hosts)
    pub fn all() -> Self {
        Self {
            instancing: true,
            float_textures: true,
            float_linear: true,
            half_float_textures: true,
            half_float_linear: true,
            depth_textures: true,
            vertex_array_objects: true,
            color_buffer_float: true,
            anisotropic_filtering: true,
            texture_compression: true,
        }
    }

    /// Required features the device lacks
    pub fn missing_required(&self) -> Vec<&'static str> {
        let required = [
            (self.instancing, EXT_INSTANCED_ARRAYS),
            (self.depth_textures, EXT_DEPTH_TEXTURE),
            (self.float_textures, EXT_TEXTURE_FLOAT),
            (self.float_linear, EXT_TEXTURE_FLOAT_LINEAR),
            (self.half_float_textures, EXT_TEXTURE_HALF_FLOAT),
            (self.half_float_linear, EXT_TEXTURE_HALF_FLOAT_LINEAR),
            (self.vertex_array_objects, EXT_VERTEX_ARRAY_OBJECT),
        ];
        required.iter().filter(|(present, _)| !present).map(|(_, name)| *name).collect()
    }
}
