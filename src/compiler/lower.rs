//! Manifest → render graph lowering: the color-correctness expansion.

use crate::config::EdgePolicy;
use crate::graph::{GraphBuilder, NodeId, NodeValue, OutputSpec, PixelFormat, RenderGraph, RenderNode, Resolution};

use super::error::CompileError;
use super::manifest::{Clip, EffectSpec, Manifest, SourceEncoding, SourceSpec, Track};

/// Resolves whether a pre-baked 3D LUT is available for a display target.
/// Returns the shader-library-resolvable LUT resource name. The compiler
/// only needs to know *whether* one exists to pick LUT-first vs. analytic;
/// the `.cube` payload itself is loaded by [`crate::color`].
pub trait LutAvailability {
    fn lut_for(&self, target: crate::config::DisplayTarget) -> Option<&'static str>;
}

/// Default resolver: no LUT resources are registered, so the compiler
/// always falls back to the analytic ODT. Callers wire a real resolver
/// (backed by whatever LUTs shipped with the engine) through
/// [`compile`]'s `luts` parameter.
pub struct NoLuts;
impl LutAvailability for NoLuts {
    fn lut_for(&self, _target: crate::config::DisplayTarget) -> Option<&'static str> {
        None
    }
}

const WORKING_SPACE: PixelFormat = PixelFormat::Linear16;

fn idt_shader_for(encoding: SourceEncoding) -> Option<&'static str> {
    match encoding {
        SourceEncoding::Rec709Gamma | SourceEncoding::Srgb => Some("idt_rec709_to_acescg"),
        SourceEncoding::LinearRec709 => Some("idt_linear_rec709_to_acescg"),
        SourceEncoding::Acescg => None,
    }
}

/// Whether `shader` is one of the terminal ODT/LUT-apply shaders that
/// already bakes the display OETF into its output. The encode handoff must
/// not run a second gamma/PQ conversion on a graph whose root is one of
/// these.
#[must_use]
pub fn is_display_encoded_shader(shader: &str) -> bool {
    matches!(
        shader,
        "odt_acescg_to_rec709" | "odt_acescg_to_rec709_studio" | "odt_acescg_to_pq1000" | "lut_apply_3d"
    )
}

/// The shader library's declared per-port contract for a consumer input.
/// Effect kernels are out of scope, so this is a conservative stand-in:
/// everything between IDT and ODT operates at the frame's full resolution
/// in the ACEScg working format, which is in fact the invariant the color
/// pipeline guarantees end-to-end. A real shader library would reflect this
/// per-shader instead of assuming it uniformly.
fn declared_input_expectation(_shader: &str, _port: &str) -> OutputSpec {
    OutputSpec::full(WORKING_SPACE)
}

struct Lowering<'a> {
    builder: GraphBuilder,
    luts: &'a dyn LutAvailability,
    edge_policy: EdgePolicy,
    warnings: Vec<&'static str>,
}

impl<'a> Lowering<'a> {
    fn add_source(&mut self, source: &SourceSpec) -> Result<NodeId, CompileError> {
        let encoding = source
            .encoding
            .ok_or(CompileError::UnknownSourceEncoding)?;

        let raw = RenderNode::new(
            format!("source:{}", source.shader),
            source.shader.clone(),
            OutputSpec::full(WORKING_SPACE),
        );
        let raw = source
            .parameters
            .iter()
            .fold(raw, |n, (k, v)| n.with_parameter(k.clone(), v.clone()));
        let raw_id = self.builder.add_node(raw);

        match idt_shader_for(encoding) {
            None => Ok(raw_id),
            Some(idt_shader) => {
                let idt = RenderNode::new(
                    format!("idt:{idt_shader}"),
                    idt_shader,
                    OutputSpec::full(WORKING_SPACE),
                )
                .with_input("in", raw_id);
                Ok(self.builder.add_node(idt))
            }
        }
    }

    fn add_effect(&mut self, upstream: NodeId, effect: &EffectSpec) -> Result<NodeId, CompileError> {
        if effect.shader.is_empty() {
            return Err(CompileError::UnsupportedEffect(effect.name.clone()));
        }

        let mut node = RenderNode::new(
            format!("fx:{}", effect.name),
            effect.shader.clone(),
            OutputSpec::full(WORKING_SPACE),
        )
        .with_input("input", upstream);

        for (k, v) in &effect.parameters {
            node = node.with_parameter(k.clone(), v.clone());
        }

        if let Some(mask) = &effect.mask {
            let mask_id = self.add_source(&mask.source)?;
            node = node
                .with_input("mask", mask_id)
                .with_parameter("threshold", NodeValue::Scalar(mask.threshold));
        }

        Ok(self.builder.add_node(node))
    }

    fn add_clip(&mut self, clip: &Clip) -> Result<NodeId, CompileError> {
        let mut current = self.add_source(&clip.source)?;

        let mut effects = clip.effects.clone();
        effects.sort_by_key(|e| e.family);

        for effect in &effects {
            current = self.add_effect(current, effect)?;
        }
        Ok(current)
    }

    fn add_track(&mut self, track: &Track) -> Result<Option<NodeId>, CompileError> {
        let mut composited: Option<NodeId> = None;
        for clip in &track.clips {
            let clip_out = self.add_clip(clip)?;
            composited = Some(match composited {
                None => clip_out,
                Some(base) => {
                    let over = RenderNode::new("composite_over", "composite_over", OutputSpec::full(WORKING_SPACE))
                        .with_input("base", base)
                        .with_input("over", clip_out);
                    self.builder.add_node(over)
                }
            });
        }
        Ok(composited)
    }

    /// Inserts a `resize_bilinear` adapter (or, under `ReadWithClamp` /
    /// `RequireExplicitAdapters`, leaves the edge untouched and records a
    /// warning) when `producer`'s declared output shape doesn't match what
    /// `consumer_shader`'s `port` expects.
    fn adapt_edge(&mut self, producer: NodeId, consumer_shader: &str, port: &str) -> NodeId {
        let Some(producer_node) = self.builder.node(producer) else {
            return producer;
        };
        let expected = declared_input_expectation(consumer_shader, port);
        if producer_node.output == expected {
            return producer;
        }

        match self.edge_policy {
            EdgePolicy::AutoResizeBilinear => {
                let resize = RenderNode::new("resize_bilinear", "resize_bilinear", expected)
                    .with_input("in", producer);
                self.warnings.push("auto_resize");
                self.builder.add_node(resize)
            }
            EdgePolicy::RequireExplicitAdapters => {
                self.warnings.push("size_mismatch");
                producer
            }
            EdgePolicy::ReadWithClamp => producer,
        }
    }

    fn finish_with_odt(
        mut self,
        scene_output: NodeId,
        target: crate::config::DisplayTarget,
        studio: bool,
    ) -> Result<(RenderGraph, Vec<&'static str>), CompileError> {
        use crate::config::DisplayTarget::{HdrPq1000, SdrRec709};

        let scene_output = self.adapt_edge(scene_output, "terminal_odt", "in");

        let (shader, lut_param) = match (target, self.luts.lut_for(target)) {
            (SdrRec709, Some(lut)) => ("lut_apply_3d", Some(lut)),
            (SdrRec709, None) => (
                if studio {
                    "odt_acescg_to_rec709_studio"
                } else {
                    "odt_acescg_to_rec709"
                },
                None,
            ),
            (HdrPq1000, Some(lut)) => ("lut_apply_3d", Some(lut)),
            (HdrPq1000, None) => ("odt_acescg_to_pq1000", None),
        };

        // The terminal ODT/LUT-apply shaders all write `rgba16float` storage
        // textures (they apply the display OETF but keep full-precision
        // float storage for the encode handoff to read); true `Bgra8`/YUV10
        // byte packing is a separate stage the handoff performs afterward,
        // not a format this graph node ever targets.
        let mut odt = RenderNode::new("terminal_odt", shader, OutputSpec::full(PixelFormat::Linear16))
            .with_input("in", scene_output);
        if let Some(lut) = lut_param {
            odt = odt.with_parameter("lut", NodeValue::Text(lut.to_string()));
        }
        let root = self.builder.add_node(odt);

        let graph = self.builder.finish(root)?;
        Ok((graph, self.warnings))
    }
}

/// Lowers a manifest into a validated render graph, returning the graph plus
/// the compile-time warning tags accumulated during adapter insertion (e.g.
/// `auto_resize`, `size_mismatch`) for the caller to fold into frame
/// metadata.
pub fn compile(
    manifest: &Manifest,
    edge_policy: EdgePolicy,
    luts: &dyn LutAvailability,
    odt_studio_range: bool,
) -> Result<(RenderGraph, Vec<&'static str>), CompileError> {
    let mut lowering = Lowering {
        builder: GraphBuilder::new(),
        luts,
        edge_policy,
        warnings: Vec::new(),
    };

    let mut layer: Option<NodeId> = match &manifest.background {
        Some(bg) => Some(lowering.add_clip(bg)?),
        None => None,
    };

    for track in &manifest.tracks {
        if let Some(track_out) = lowering.add_track(track)? {
            layer = Some(match layer {
                None => track_out,
                Some(base) => {
                    let over = RenderNode::new("composite_over", "composite_over", OutputSpec::full(WORKING_SPACE))
                        .with_input("base", base)
                        .with_input("over", track_out);
                    lowering.builder.add_node(over)
                }
            });
        }
    }

    let scene_output = layer.ok_or_else(|| {
        CompileError::CompilerInternal("manifest produced no scene content".to_string())
    })?;

    lowering.finish_with_odt(scene_output, manifest.display_target, odt_studio_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::manifest::{Clip, EffectFamily, Manifest, SourceEncoding, SourceSpec, Track};
    use crate::config::DisplayTarget;
    use rustc_hash::FxHashMap;

    fn source(encoding: Option<SourceEncoding>) -> SourceSpec {
        SourceSpec {
            shader: "source_test_color".to_string(),
            encoding,
            parameters: FxHashMap::default(),
        }
    }

    fn manifest_with(clip: Clip, target: DisplayTarget) -> Manifest {
        Manifest {
            tracks: vec![Track { clips: vec![clip] }],
            background: None,
            quality: crate::quality::QualityProfile::default(),
            display_target: target,
        }
    }

    #[test]
    fn unknown_encoding_fails_fast_without_guessing() {
        let manifest = manifest_with(
            Clip {
                source: source(None),
                effects: vec![],
            },
            DisplayTarget::SdrRec709,
        );
        let err = compile(&manifest, EdgePolicy::AutoResizeBilinear, &NoLuts, false).unwrap_err();
        assert!(matches!(err, CompileError::UnknownSourceEncoding));
    }

    #[test]
    fn acescg_source_gets_no_idt_node() {
        let manifest = manifest_with(
            Clip {
                source: source(Some(SourceEncoding::Acescg)),
                effects: vec![],
            },
            DisplayTarget::SdrRec709,
        );
        let (graph, _) = compile(&manifest, EdgePolicy::AutoResizeBilinear, &NoLuts, false).unwrap();
        assert!(!graph.iter().any(|n| n.shader.starts_with("idt_")));
    }

    #[test]
    fn rec709_source_gets_exactly_one_idt_node() {
        let manifest = manifest_with(
            Clip {
                source: source(Some(SourceEncoding::Rec709Gamma)),
                effects: vec![],
            },
            DisplayTarget::SdrRec709,
        );
        let (graph, _) = compile(&manifest, EdgePolicy::AutoResizeBilinear, &NoLuts, false).unwrap();
        assert_eq!(graph.iter().filter(|n| n.shader == "idt_rec709_to_acescg").count(), 1);
    }

    #[test]
    fn graph_has_exactly_one_terminal_odt_equal_to_root() {
        let manifest = manifest_with(
            Clip {
                source: source(Some(SourceEncoding::Acescg)),
                effects: vec![],
            },
            DisplayTarget::SdrRec709,
        );
        let (graph, _) = compile(&manifest, EdgePolicy::AutoResizeBilinear, &NoLuts, false).unwrap();
        let root = graph.node(graph.root()).unwrap();
        assert_eq!(root.shader, "odt_acescg_to_rec709");
        assert_eq!(
            graph
                .iter()
                .filter(|n| n.shader.starts_with("odt_") || n.shader == "lut_apply_3d")
                .count(),
            1
        );
    }

    #[test]
    fn hdr_target_with_no_lut_uses_analytic_pq_odt() {
        let manifest = manifest_with(
            Clip {
                source: source(Some(SourceEncoding::Acescg)),
                effects: vec![],
            },
            DisplayTarget::HdrPq1000,
        );
        let (graph, _) = compile(&manifest, EdgePolicy::AutoResizeBilinear, &NoLuts, false).unwrap();
        assert_eq!(graph.node(graph.root()).unwrap().shader, "odt_acescg_to_pq1000");
    }

    struct AlwaysLut;
    impl LutAvailability for AlwaysLut {
        fn lut_for(&self, _target: DisplayTarget) -> Option<&'static str> {
            Some("ACES13_SDR_sRGB_33")
        }
    }

    #[test]
    fn lut_is_preferred_over_analytic_when_available() {
        let manifest = manifest_with(
            Clip {
                source: source(Some(SourceEncoding::Acescg)),
                effects: vec![],
            },
            DisplayTarget::SdrRec709,
        );
        let (graph, _) = compile(&manifest, EdgePolicy::AutoResizeBilinear, &AlwaysLut, false).unwrap();
        let root = graph.node(graph.root()).unwrap();
        assert_eq!(root.shader, "lut_apply_3d");
    }

    #[test]
    fn effects_are_ordered_by_family_preserving_manifest_order_within_family() {
        let fx1 = EffectSpec {
            name: "grain_a".to_string(),
            family: EffectFamily::Grain,
            shader: "fx_grain".to_string(),
            parameters: FxHashMap::default(),
            mask: None,
        };
        let mut fx2 = fx1.clone();
        fx2.name = "geo_a".to_string();
        fx2.family = EffectFamily::Geometric;
        fx2.shader = "fx_transform".to_string();

        let manifest = manifest_with(
            Clip {
                source: source(Some(SourceEncoding::Acescg)),
                effects: vec![fx1, fx2],
            },
            DisplayTarget::SdrRec709,
        );
        let (graph, _) = compile(&manifest, EdgePolicy::AutoResizeBilinear, &NoLuts, false).unwrap();

        let order = graph.topological_order();
        let pos = |shader: &str| {
            order
                .iter()
                .position(|id| graph.node(*id).unwrap().shader == shader)
                .unwrap()
        };
        assert!(pos("fx_transform") < pos("fx_grain"));
    }
}
