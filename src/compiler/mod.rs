//! Graph Compiler: lowers a scene manifest into a validated render graph,
//! inserting the IDT/ODT/adapter scaffolding the color pipeline requires.

mod error;
mod lower;
mod manifest;

pub use error::CompileError;
pub use lower::{LutAvailability, NoLuts, compile, is_display_encoded_shader};
pub use manifest::{Clip, EffectFamily, EffectSpec, Manifest, MaskSpec, SourceEncoding, SourceSpec, Track};
