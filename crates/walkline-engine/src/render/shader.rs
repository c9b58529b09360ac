//! WGSL sources and front-end validation.
//!
//! wgpu reports shader errors through its uncaptured-error handler, which panics
//! by default. Running the source through naga first turns compile errors into
//! a readable `anyhow` error with source spans, before any GPU object exists.

use anyhow::{anyhow, Result};
use naga::valid::{Capabilities, ValidationFlags, Validator};

/// A WGSL shader pair in a single source plus the entry points and vertex
/// input locations a pipeline expects from it.
#[derive(Debug, Copy, Clone)]
pub struct WgslShader {
    pub label: &'static str,
    pub source: &'static str,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub vertex_locations: &'static [u32],
}

pub const LINE_STRIP_SHADER: WgslShader = WgslShader {
    label: "walkline line strip shader",
    source: include_str!("shaders/line_strip.wgsl"),
    vertex_entry: "vs_main",
    fragment_entry: "fs_main",
    vertex_locations: &[0, 1],
};

/// Parses and validates `shader`, then checks its interface against the pipeline.
///
/// Errors carry naga's rendered diagnostics.
pub fn validate_wgsl(shader: &WgslShader) -> Result<()> {
    let module = naga::front::wgsl::parse_str(shader.source).map_err(|e| {
        anyhow!(
            "{} failed to compile:\n{}",
            shader.label,
            e.emit_to_string(shader.source)
        )
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| {
            anyhow!(
                "{} failed validation:\n{}",
                shader.label,
                e.emit_to_string(shader.source)
            )
        })?;

    let vertex = find_entry(&module, shader.vertex_entry, naga::ShaderStage::Vertex)
        .ok_or_else(|| anyhow!("{}: missing vertex entry point `{}`", shader.label, shader.vertex_entry))?;

    find_entry(&module, shader.fragment_entry, naga::ShaderStage::Fragment).ok_or_else(|| {
        anyhow!(
            "{}: missing fragment entry point `{}`",
            shader.label,
            shader.fragment_entry
        )
    })?;

    let mut inputs = input_locations(&module, vertex);
    inputs.sort_unstable();
    let mut expected = shader.vertex_locations.to_vec();
    expected.sort_unstable();

    anyhow::ensure!(
        inputs == expected,
        "{}: vertex inputs at locations {:?} do not match buffer layout {:?}",
        shader.label,
        inputs,
        expected
    );

    Ok(())
}

fn find_entry<'m>(
    module: &'m naga::Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
}

/// Collects `@location` bindings of an entry point's arguments, looking through
/// struct-typed arguments.
fn input_locations(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<u32> {
    let mut out = Vec::new();

    for arg in &entry.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => out.push(*location),
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    out.extend(members.iter().filter_map(|m| match &m.binding {
                        Some(naga::Binding::Location { location, .. }) => Some(*location),
                        _ => None,
                    }));
                }
            }
        }
    }

    out
}
