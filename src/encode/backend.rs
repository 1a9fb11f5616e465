//! Codec backend boundary: container muxing and actual codec bitstream
//! encoding are out of scope for this crate. This trait is the seam a host
//! application implements against; the two variants below are thin
//! dispatchers with no codec logic of their own.

use crate::encode::error::EncodeError;

/// One packed frame ready to hand to a backend: either BGRA8 or YUV10
/// biplanar bytes, tagged so a backend can pick its encode path without
/// this crate knowing anything about codecs.
pub struct PackedFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub bytes: &'a [u8],
    pub is_yuv10: bool,
}

/// What a host application must implement to receive packed frames from
/// the handoff. Kept minimal and out-of-scope-respecting: no codec
/// parameters, no container format knowledge, just start/append/finish.
pub trait CodecBackend {
    fn start(&mut self, width: u32, height: u32) -> Result<(), EncodeError>;
    fn append_frame(&mut self, frame: PackedFrame<'_>) -> Result<(), EncodeError>;
    fn finish(&mut self) -> Result<(), EncodeError>;
}

/// A backend that writes packed frames straight through with no
/// re-encoding — used when the upstream pipeline is already producing
/// codec-ready bytes (a "pass-through" path) and a real muxer lives
/// entirely outside this crate's scope.
#[derive(Debug, Default)]
pub struct PassthroughMuxer {
    started: bool,
    frame_count: u64,
    finished: bool,
}

impl CodecBackend for PassthroughMuxer {
    fn start(&mut self, _width: u32, _height: u32) -> Result<(), EncodeError> {
        self.started = true;
        Ok(())
    }

    fn append_frame(&mut self, _frame: PackedFrame<'_>) -> Result<(), EncodeError> {
        if !self.started {
            return Err(EncodeError::CannotAppend("muxer not started".to_string()));
        }
        self.frame_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EncodeError> {
        self.finished = true;
        Ok(())
    }
}

/// A backend standing in for a real codec (software or hardware encoder)
/// that must re-encode every frame; this crate never implements the codec
/// itself, so every call here is a deliberate stub that a host crate
/// replaces with a genuine encoder binding.
#[derive(Debug, Default)]
pub struct ReEncodingWriter {
    codec_name: Option<String>,
    started: bool,
}

impl ReEncodingWriter {
    #[must_use]
    pub fn new(codec_name: impl Into<String>) -> Self {
        Self {
            codec_name: Some(codec_name.into()),
            started: false,
        }
    }
}

impl CodecBackend for ReEncodingWriter {
    fn start(&mut self, _width: u32, _height: u32) -> Result<(), EncodeError> {
        let Some(codec) = &self.codec_name else {
            return Err(EncodeError::CannotStart("no codec configured".to_string()));
        };
        log::info!("starting re-encoding writer for codec {codec}");
        self.started = true;
        Ok(())
    }

    fn append_frame(&mut self, _frame: PackedFrame<'_>) -> Result<(), EncodeError> {
        if !self.started {
            return Err(EncodeError::CannotAppend("writer not started".to_string()));
        }
        Err(EncodeError::CodecUnsupported(
            self.codec_name.clone().unwrap_or_default(),
        ))
    }

    fn finish(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_muxer_rejects_frames_before_start() {
        let mut muxer = PassthroughMuxer::default();
        let frame = PackedFrame {
            width: 4,
            height: 4,
            bytes: &[0; 64],
            is_yuv10: false,
        };
        assert!(muxer.append_frame(frame).is_err());
    }

    #[test]
    fn passthrough_muxer_accepts_frames_after_start() {
        let mut muxer = PassthroughMuxer::default();
        muxer.start(4, 4).unwrap();
        let frame = PackedFrame {
            width: 4,
            height: 4,
            bytes: &[0; 64],
            is_yuv10: false,
        };
        assert!(muxer.append_frame(frame).is_ok());
        assert_eq!(muxer.frame_count, 1);
        muxer.finish().unwrap();
    }

    #[test]
    fn re_encoding_writer_without_a_codec_fails_to_start() {
        let mut writer = ReEncodingWriter {
            codec_name: None,
            started: false,
        };
        assert!(matches!(writer.start(4, 4), Err(EncodeError::CannotStart(_))));
    }
}
