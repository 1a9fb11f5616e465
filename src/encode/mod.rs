//! Encode handoff: linear→display-gamma conversion, pixel packing, frame
//! pacing, and the codec backend seam. Container muxing and actual codec
//! bitstreams stay out of scope; this module hands a host backend packed,
//! paced frames and nothing more.

mod backend;
mod error;
mod gamma;
mod pacer;
mod packing;

pub use backend::{CodecBackend, PackedFrame, PassthroughMuxer, ReEncodingWriter};
pub use error::EncodeError;
pub use gamma::GammaStage;
pub use pacer::FramePacer;
pub use packing::{Yuv10Sample, pack_bgra8, pack_yuv10_biplanar};
