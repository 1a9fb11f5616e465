//! Tagged pass classification.
//!
//! Replaces dynamic dispatch across effect passes with a tagged variant plus
//! a vtable-free executor matching on the tag. Classification here is by
//! shader-name convention rather than a field on [`crate::graph::RenderNode`]
//! (the data model doesn't carry one).

/// How a node's shader is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// A compute kernel, dispatched over a 2D threadgroup grid sized to the
    /// node's output texture.
    Compute { workgroup_size: (u32, u32) },
    /// A render-pipeline pass (full-screen triangle style), for kernels that
    /// need rasterizer fixed-function state a compute kernel can't express.
    Render,
    /// A texture-to-texture copy or resample with no user shader — covers
    /// compiler-inserted adapters.
    Blit,
}

/// Classifies a shader name into its dispatch kind.
#[must_use]
pub fn classify(shader: &str) -> PassKind {
    if shader.starts_with("resize_") || shader.starts_with("blit_") {
        PassKind::Blit
    } else if shader.starts_with("render_") {
        PassKind::Render
    } else {
        PassKind::Compute {
            workgroup_size: (8, 8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_and_blit_prefixes_classify_as_blit() {
        assert_eq!(classify("resize_bilinear"), PassKind::Blit);
        assert_eq!(classify("blit_copy"), PassKind::Blit);
    }

    #[test]
    fn everything_else_defaults_to_compute() {
        assert!(matches!(classify("odt_acescg_to_rec709"), PassKind::Compute { .. }));
        assert!(matches!(classify("fx_grain"), PassKind::Compute { .. }));
    }
}
