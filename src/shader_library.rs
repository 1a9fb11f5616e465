//! Shader name → compiled pipeline resolution.
//!
//! A `minijinja::Environment` with a custom `{$ $}` / `{{ }}` / `$$` syntax, a
//! loader that prefers a live filesystem read in debug builds and falls back
//! to `rust_embed`-baked assets otherwise, and a global `OnceLock` so the
//! environment is built once. On top of whatever template includes minijinja
//! itself walks, this module also performs an explicit `#include "name"`
//! pre-pass with a per-compilation-unit dedup guard, since shader composition
//! here is a flat textual concatenation rather than template inheritance.

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, Error as JinjaError, ErrorKind, syntax::SyntaxConfig};
use rust_embed::RustEmbed;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

#[derive(RustEmbed)]
#[folder = "src/shaders"]
struct ShaderAssets;

static SHADER_ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn env() -> &'static Environment<'static> {
    SHADER_ENV.get_or_init(|| {
        let mut env = Environment::new();
        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("shader template syntax is statically valid");
        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);
        env.set_loader(shader_loader);
        env
    })
}

fn shader_loader(name: &str) -> Result<Option<String>, JinjaError> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    #[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
    {
        let path = std::path::Path::new("src/shaders").join(filename.as_ref());
        if path.exists() {
            return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                JinjaError::new(ErrorKind::TemplateNotFound, format!("failed to read {name}: {e}"))
            });
        }
    }

    if let Some(file) = ShaderAssets::get(&filename)
        && let Ok(source) = std::str::from_utf8(file.data.as_ref())
    {
        return Ok(Some(source.to_string()));
    }

    Ok(None)
}

/// Failure resolving or compiling a named shader. Both variants carry the
/// shader's own name so a caller can surface "which kernel" without
/// threading it through separately.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader source not found: {0}")]
    SourceNotFound(String),
    #[error("shader compilation failed for {name}: {log}")]
    CompilationFailed { name: String, log: String },
}

/// Walks `#include "path"` directives, flattening them into a single source
/// string. Each distinct path is emitted at most once per call, and a path
/// already on the current inclusion stack is an error rather than an
/// infinite loop.
fn resolve_includes(name: &str, seen: &mut FxHashSet<String>) -> Result<String, ShaderError> {
    if !seen.insert(name.to_string()) {
        return Ok(String::new());
    }

    let raw = env()
        .get_template(name)
        .map_err(|_| ShaderError::SourceNotFound(name.to_string()))?
        .source();

    let mut out = String::with_capacity(raw.len());
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("#include") {
            let path = rest.trim().trim_matches('"');
            out.push_str(&resolve_includes(path, seen)?);
            out.push('\n');
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Flattened WGSL source for a named shader, with `#include`s resolved and
/// deduplicated.
fn flatten(name: &str) -> Result<String, ShaderError> {
    let mut seen = FxHashSet::default();
    resolve_includes(name, &mut seen)
}

/// Resolves shader names to compiled `wgpu::ShaderModule`s, caching by name.
///
/// The teacher's `ShaderManager` caches compiled render/compute *pipelines*
/// keyed by a full state descriptor (`PipelineCache` in
/// `renderer/pipeline/cache.rs`); this crate's nodes are single-kernel
/// compute or blit passes with no blend/depth state variance, so caching
/// stops one level up, at the shader module, and callers build their own
/// pipeline from it.
pub struct ShaderLibrary {
    modules: FxHashMap<String, wgpu::ShaderModule>,
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: FxHashMap::default(),
        }
    }

    /// Returns the compiled module for `name`, compiling and caching it on
    /// first use.
    pub fn get_or_compile(
        &mut self,
        device: &wgpu::Device,
        name: &str,
    ) -> Result<&wgpu::ShaderModule, ShaderError> {
        if !self.modules.contains_key(name) {
            let source = flatten(name)?;
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            self.modules.insert(name.to_string(), module);
        }
        Ok(self.modules.get(name).expect("just inserted"))
    }

    /// Drops every cached module, forcing recompilation on next lookup.
    pub fn clear(&mut self) {
        self.modules.clear();
    }

    #[must_use]
    pub fn is_cached(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }
}
