mod common;

use std::sync::Arc;

use ocular_engine::context::{ContextToken, ContextTracker, SurfaceId};
use ocular_engine::render::{
    ProgramDesc, ProgramError, ShaderProgram, ShaderStage, StageSource, VertexArray, VertexError,
};

const BROKEN: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return undefined_fn(); }";

const SOLID: &str = r#"
@vertex
fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

#[test]
fn compile_errors_carry_stage_and_diagnostics() {
    let Some(gpu) = common::gpu() else { return };
    let token = ContextToken::acquire(Arc::clone(&gpu), SurfaceId::next());

    let err = ShaderProgram::new(&token, &ProgramDesc::new("broken", BROKEN)).err().unwrap();
    match err {
        ProgramError::Compile { label, stage, diagnostics, code } => {
            assert_eq!(label, "broken");
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(!diagnostics.is_empty());
            assert_eq!(code, BROKEN);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn geometry_stage_is_rejected() {
    let Some(gpu) = common::gpu() else { return };
    let token = ContextToken::acquire(Arc::clone(&gpu), SurfaceId::next());

    let desc = ProgramDesc {
        geometry: Some(StageSource::new(SOLID, "gs_main")),
        ..ProgramDesc::new("with geometry", SOLID)
    };
    let err = ShaderProgram::new(&token, &desc).err().unwrap();
    assert!(matches!(
        err,
        ProgramError::UnsupportedStage { stage: ShaderStage::Geometry, .. }
    ));
}

#[test]
fn programs_link_against_vertex_arrays() {
    let Some(gpu) = common::gpu() else { return };
    let token = ContextToken::acquire(Arc::clone(&gpu), SurfaceId::next());

    let mut triangle = VertexArray::new("triangle");
    triangle
        .set_attribute(&token, 0, 2, &[0.0f32, 0.5, -0.5, -0.5, 0.5, -0.5])
        .unwrap();
    assert_eq!(triangle.vertex_count(), 3);

    let layouts = triangle.layouts();
    let targets = [Some(wgpu::ColorTargetState {
        format: wgpu::TextureFormat::Rgba8Unorm,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })];
    let desc = ProgramDesc {
        vertex_buffers: &layouts,
        targets: &targets,
        ..ProgramDesc::new("solid", SOLID)
    };
    let program = ShaderProgram::new(&token, &desc).unwrap();
    assert_eq!(program.label(), "solid");
    assert_eq!(program.sample_count(), 1);

    triangle.close();
    triangle.close();
    assert!(triangle.is_closed());
}

#[test]
fn vertex_array_validates_attribute_shapes() {
    let Some(gpu) = common::gpu() else { return };
    let token = ContextToken::acquire(Arc::clone(&gpu), SurfaceId::next());
    let mut array = VertexArray::new("shapes");

    assert_eq!(array.set_attribute(&token, 0, 5, &[0.0f32; 5]), Err(VertexError::Dimension(5)));
    assert_eq!(
        array.set_attribute(&token, 0, 2, &[0.0f32; 3]),
        Err(VertexError::Ragged { len: 3, dims: 2 })
    );

    array.set_attribute(&token, 0, 2, &[0.0f32; 8]).unwrap();
    array.set_attribute(&token, 1, 1, &[7i32; 4]).unwrap();
    assert_eq!(
        array.set_attribute(&token, 2, 3, &[0.0f32; 9]),
        Err(VertexError::CountMismatch { location: 2, got: 3, expected: 4 })
    );
    // Replacing a location keeps its slot.
    array.set_attribute(&token, 0, 2, &[1.0f32; 8]).unwrap();
    assert_eq!(array.layouts().len(), 2);

    let doubles = array.set_attribute(&token, 3, 1, &[0.0f64; 4]);
    if gpu.caps().vertex_f64 {
        assert!(doubles.is_ok());
    } else {
        assert_eq!(doubles, Err(VertexError::DoubleUnsupported));
    }
}

#[test]
fn canvases_share_cached_programs() {
    let Some(gpu) = common::gpu() else { return };
    let mut first = common::canvas(&gpu, 8, 8, false);
    let mut second = common::canvas(&gpu, 8, 8, false);

    first.render_offscreen(|_| {}).unwrap();
    second.render_offscreen(|_| {}).unwrap();
    assert_eq!(gpu.shaders().ref_count("ocular.fill@x1"), 2);

    first.close();
    assert_eq!(gpu.shaders().ref_count("ocular.fill@x1"), 1);
    second.close();
    assert_eq!(gpu.shaders().ref_count("ocular.fill@x1"), 0);
}

#[test]
fn nested_make_current_is_reentrant() {
    let Some(gpu) = common::gpu() else { return };
    let canvas = common::canvas(&gpu, 8, 8, false);
    let thread = std::thread::current().id();

    let outer = canvas.make_current();
    assert!(!outer.is_reentrant());
    {
        let inner = canvas.make_current();
        assert!(inner.is_reentrant());
    }
    assert_eq!(ContextTracker::global().active(thread), Some(canvas.id()));

    drop(outer);
    assert_eq!(ContextTracker::global().active(thread), None);
}
