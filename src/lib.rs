// lib.rs — 深度视差全景：投影核心、场景与热点
//
// 与 GPU / 窗口无关的部分都在这里，renderer 与 ui 只存在于二进制中。

pub mod assets;
pub mod camera;
pub mod config;
pub mod controls;
pub mod depth_map;
pub mod displacement;
pub mod error;
pub mod export;
pub mod hotspot;
pub mod manifest;
pub mod mesh;
pub mod picking;
pub mod projection;
pub mod scene;

pub use error::{Result, ViewerError};
pub use projection::{forward, inverse, DepthParams, SurfaceUv};
