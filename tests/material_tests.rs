//! Material Binder Tests
//!
//! Tests for:
//! - Shader binding: technique selection, parameter validation, failure atomicity
//! - Data parameters: fan-out to every pass and stage, typed access, arrays, structs
//! - Object parameters: textures and sampler states
//! - Param blocks: sharing, per-stage fallback, external buffers, dirty uploads
//! - Snapshots: capture, serialization, validated replay

use std::sync::Arc;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use tessera::errors::{Error, ErrorKind, Result};
use tessera::material::{
    GpuParamBlockBuffer, GpuParamBlockUsage, GpuParamDataDesc, GpuParamDataType, GpuParamDesc,
    GpuParamObjectType, GpuParams, GpuProgram, GpuProgramType, Material, MaterialSnapshot,
    ParamKind, ParamValues, Pass, Shader, ShaderDataParamDesc, StructData, Technique,
};
use tessera::resources::{SamplerDesc, SamplerState, Texture, TextureDesc};
use tessera::{DeviceInfo, ParamBlockUploader};
use wgpu::TextureFormat;

use GpuParamDataType::{Float1, Float2, Float3, Float4, Matrix3x3, Matrix4x4};

const PER_OBJECT_SIZE: u32 = 160;
const PER_CALL_SIZE: u32 = 96;

/// Shareable block declared by every stage.
fn with_per_object(desc: GpuParamDesc) -> GpuParamDesc {
    desc.with_block("PerObject", 0, PER_OBJECT_SIZE, true)
        .with_param(GpuParamDataDesc::new("gTint", Float4, "PerObject", 0))
        .with_param(GpuParamDataDesc::new("gGloss", Float1, "PerObject", 16))
        .with_param(GpuParamDataDesc::new("gWorld", Matrix4x4, "PerObject", 32))
        .with_param(GpuParamDataDesc::new("gNormalMat", Matrix3x3, "PerObject", 96))
        .with_param(GpuParamDataDesc::new("gUvScale", Float2, "PerObject", 144))
}

/// Non-shareable block plus the fragment stage's objects.
fn with_per_call(desc: GpuParamDesc) -> GpuParamDesc {
    desc.with_block("PerCall", 1, PER_CALL_SIZE, false)
        .with_param(GpuParamDataDesc::new("gExposure", Float1, "PerCall", 0))
        .with_param(GpuParamDataDesc::new("gLightDir", Float3, "PerCall", 16))
        .with_param(GpuParamDataDesc::new("gWeights", Float1, "PerCall", 32).array(2))
        .with_param(GpuParamDataDesc::structure("gLight", 16, "PerCall", 64))
        .with_object("gAlbedoTex", GpuParamObjectType::Texture2d, 0)
        .with_object("gAlbedoSamp", GpuParamObjectType::Sampler2d, 0)
}

fn lit_technique(render_system: &str) -> Technique {
    let vs = GpuProgram::new(
        "lit_vs",
        GpuProgramType::Vertex,
        with_per_object(GpuParamDesc::new()),
    );
    let fs = GpuProgram::new(
        "lit_fs",
        GpuProgramType::Fragment,
        with_per_call(with_per_object(GpuParamDesc::new())),
    );
    let outline_fs = GpuProgram::new(
        "outline_fs",
        GpuProgramType::Fragment,
        with_per_call(with_per_object(GpuParamDesc::new())),
    );

    Technique::new(render_system, DeviceInfo::ANY)
        .with_pass(Pass::new().with_program(vs).with_program(fs))
        .with_pass(Pass::new().with_program(outline_fs))
}

fn lit_shader() -> Arc<Shader> {
    Shader::new("Lit")
        .with_technique(lit_technique("wgpu"))
        .with_data_param("tint", "gTint", Float4)
        .with_data_param("gloss", "gGloss", Float1)
        .with_data_param("world", "gWorld", Matrix4x4)
        .with_data_param("normalMatrix", "gNormalMat", Matrix3x3)
        .with_data_param("uvScale", "gUvScale", Float2)
        .with_data_param("exposure", "gExposure", Float1)
        .with_data_param("lightDir", "gLightDir", Float3)
        .with_data_param_desc(ShaderDataParamDesc {
            name: "weights".to_string(),
            gpu_variable_name: "gWeights".to_string(),
            param_type: Float1,
            array_size: 2,
            element_size: 4,
        })
        .with_data_param_desc(ShaderDataParamDesc {
            name: "light".to_string(),
            gpu_variable_name: "gLight".to_string(),
            param_type: GpuParamDataType::Struct,
            array_size: 1,
            element_size: 16,
        })
        .with_data_param("missing", "gNotThere", Float1)
        .with_data_param("shininess", "gGloss", Float4)
        .with_object_param("albedo", "gAlbedoTex", GpuParamObjectType::Texture2d)
        .with_object_param("albedoSampler", "gAlbedoSamp", GpuParamObjectType::Sampler2d)
        .with_param_block("PerCall", GpuParamBlockUsage::Dynamic)
        .build()
}

fn bound_material() -> Material {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut material = Material::new();
    material
        .set_shader(lit_shader(), &DeviceInfo::default())
        .unwrap();
    material
}

/// One pass of `vs` and `fs`, bound on any device.
fn single_pass_material(
    name: &str,
    vs: GpuParamDesc,
    fs: GpuParamDesc,
    params: &[(&str, &str, GpuParamDataType)],
) -> Material {
    let mut shader = Shader::new(name).with_technique(
        Technique::new(DeviceInfo::ANY, DeviceInfo::ANY).with_pass(
            Pass::new()
                .with_program(GpuProgram::new("vs", GpuProgramType::Vertex, vs))
                .with_program(GpuProgram::new("fs", GpuProgramType::Fragment, fs)),
        ),
    );
    for &(param, gpu_name, param_type) in params {
        shader = shader.with_data_param(param, gpu_name, param_type);
    }

    let mut material = Material::new();
    material
        .set_shader(shader.build(), &DeviceInfo::default())
        .unwrap();
    material
}

/// Records every upload it receives.
#[derive(Default)]
struct RecordingUploader {
    uploads: Vec<(u64, Vec<u8>)>,
}

impl ParamBlockUploader for RecordingUploader {
    fn upload(&mut self, block: &GpuParamBlockBuffer, data: &[u8]) -> Result<()> {
        self.uploads.push((block.id(), data.to_vec()));
        Ok(())
    }
}

// ============================================================================
// Binding Tests
// ============================================================================

#[test]
#[cfg_attr(
    debug_assertions,
    should_panic(expected = "material accessed before a shader was bound")
)]
fn unbound_material_access_is_a_contract_violation() {
    let mut material = Material::new();
    let err = material.set_float("gloss", 1.0, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractViolation);
}

#[test]
fn unbound_material_has_no_buffers() {
    let material = Material::new();
    assert!(!material.is_initialized());
    assert!(material.shader().is_none());
    assert!(material.param_block_buffers().is_empty());
}

#[test]
fn binding_selects_first_supported_technique() {
    let shader = Shader::new("Multi")
        .with_technique(lit_technique("vulkan"))
        .with_technique(lit_technique("wgpu"))
        .build();

    let mut material = Material::new();
    material
        .set_shader(Arc::clone(&shader), &DeviceInfo::default())
        .unwrap();

    assert!(material.is_initialized());
    assert!(Arc::ptr_eq(
        material.technique().unwrap(),
        &shader.techniques()[1]
    ));
    assert_eq!(material.num_passes().unwrap(), 2);
}

#[test]
fn unsupported_device_keeps_previous_binding() {
    let mut material = bound_material();
    material.set_float("gloss", 0.25, 0).unwrap();

    let err = material
        .set_shader(lit_shader(), &DeviceInfo::new("vulkan", DeviceInfo::ANY))
        .unwrap_err();

    assert!(matches!(err, Error::NoSupportedTechnique { .. }));
    assert!(material.is_initialized());
    assert_eq!(material.get_float("gloss", 0).unwrap(), 0.25);
}

#[test]
fn unsupported_device_leaves_fresh_material_unbound() {
    let mut material = Material::new();
    let err = material
        .set_shader(lit_shader(), &DeviceInfo::new("vulkan", DeviceInfo::ANY))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert!(!material.is_initialized());
}

#[test]
fn invalid_parameters_are_skipped() {
    let material = bound_material();
    let valid = material.valid_params().unwrap();

    assert_eq!(valid["tint"], "gTint");
    assert_eq!(valid["albedo"], "gAlbedoTex");
    assert!(!valid.contains_key("missing"));
    assert!(!valid.contains_key("shininess"));

    assert!(matches!(
        material.get_float("missing", 0),
        Err(Error::ParamNotFound { .. })
    ));
    assert_eq!(
        material.get_vec4("shininess", 0).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn parameters_map_to_their_blocks() {
    let material = bound_material();
    assert_eq!(material.param_block_for("gTint").unwrap(), Some("PerObject"));
    assert_eq!(material.param_block_for("gExposure").unwrap(), Some("PerCall"));
    assert_eq!(material.param_block_for("gNotThere").unwrap(), None);
}

// ============================================================================
// Data Parameter Tests
// ============================================================================

#[test]
fn values_start_zeroed() {
    let material = bound_material();
    assert_eq!(material.get_vec4("tint", 0).unwrap(), Vec4::ZERO);
    assert_eq!(material.get_mat4("world", 0).unwrap(), Mat4::ZERO);
    assert_eq!(
        material.get_struct_data("light", 0).unwrap(),
        StructData::zeroed(16)
    );
}

#[test]
fn writes_reach_every_stage_of_every_pass() {
    let mut material = bound_material();
    let tint = Vec4::new(1.0, 0.5, 0.25, 1.0);
    material.set_vec4("tint", tint, 0).unwrap();

    let mut stages = 0;
    for pass_idx in 0..material.num_passes().unwrap() {
        let pass = material.pass_parameters(pass_idx).unwrap().unwrap();
        for params in pass.iter() {
            assert_eq!(params.get_param::<Vec4>("gTint", 0).unwrap(), tint);
            stages += 1;
        }
    }
    assert_eq!(stages, 3);
}

#[test]
fn every_value_kind_round_trips() {
    let mut material = bound_material();

    let world = Mat4::from_cols_array(&[
        1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
    ]);
    let normal = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    let light = StructData::new((1..=16).collect());

    material.set_float("gloss", 0.75, 0).unwrap();
    material.set_vec2("uvScale", Vec2::new(2.0, 3.0), 0).unwrap();
    material.set_vec3("lightDir", Vec3::new(0.0, -1.0, 0.5), 0).unwrap();
    material.set_vec4("tint", Vec4::ONE, 0).unwrap();
    material.set_mat3("normalMatrix", normal, 0).unwrap();
    material.set_mat4("world", world, 0).unwrap();
    material.set_struct_data("light", light.clone(), 0).unwrap();

    assert_eq!(material.get_float("gloss", 0).unwrap(), 0.75);
    assert_eq!(material.get_vec2("uvScale", 0).unwrap(), Vec2::new(2.0, 3.0));
    assert_eq!(
        material.get_vec3("lightDir", 0).unwrap(),
        Vec3::new(0.0, -1.0, 0.5)
    );
    assert_eq!(material.get_vec4("tint", 0).unwrap(), Vec4::ONE);
    assert_eq!(material.get_mat3("normalMatrix", 0).unwrap(), normal);
    assert_eq!(material.get_mat4("world", 0).unwrap(), world);
    assert_eq!(material.get_struct_data("light", 0).unwrap(), light);

    let fragment = material
        .pass_parameters(0)
        .unwrap()
        .unwrap()
        .stage(GpuProgramType::Fragment)
        .unwrap();
    assert_eq!(fragment.get_param::<Mat3>("gNormalMat", 0).unwrap(), normal);
    assert_eq!(fragment.get_param::<StructData>("gLight", 0).unwrap(), light);
}

#[test]
fn array_elements_are_addressed_by_stride() {
    let mut material = bound_material();
    material.set_float("weights", 0.5, 1).unwrap();

    assert_eq!(material.get_float("weights", 0).unwrap(), 0.0);
    assert_eq!(material.get_float("weights", 1).unwrap(), 0.5);

    let outline = material
        .pass_parameters(1)
        .unwrap()
        .unwrap()
        .stage(GpuProgramType::Fragment)
        .unwrap();
    let block = outline.param_block_buffer("PerCall").unwrap();
    assert_eq!(block.read(48, 4).unwrap(), bytemuck::bytes_of(&0.5_f32));
}

#[test]
fn array_index_past_the_end_is_rejected() {
    let mut material = bound_material();

    let err = material.set_float("weights", 1.0, 2).unwrap_err();
    assert!(matches!(
        err,
        Error::ArrayIndexOutOfRange {
            index: 2,
            size: 2,
            ..
        }
    ));
    assert!(material.get_float("gloss", 1).is_err());
}

#[test]
fn wrong_value_type_is_rejected() {
    let mut material = bound_material();

    let err = material.set_vec4("gloss", Vec4::ONE, 0).unwrap_err();
    assert!(matches!(
        err,
        Error::ParamTypeMismatch {
            expected: ParamKind::Data(GpuParamDataType::Float4),
            found: ParamKind::Data(GpuParamDataType::Float1),
            ..
        }
    ));
    assert_eq!(material.get_float("gloss", 0).unwrap(), 0.0);

    let err = material.set_float("albedo", 1.0, 0).unwrap_err();
    assert!(matches!(
        err,
        Error::ParamTypeMismatch {
            found: ParamKind::Texture,
            ..
        }
    ));
}

#[test]
fn struct_size_must_match_declaration() {
    let mut material = bound_material();

    let err = material
        .set_struct_data("light", StructData::new(vec![0xAB; 12]), 0)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::StructSizeMismatch {
            expected: 16,
            found: 12,
            ..
        }
    ));
    assert_eq!(
        material.get_struct_data("light", 0).unwrap(),
        StructData::zeroed(16)
    );
}

#[test]
fn color_is_written_to_float4_parameter() {
    let mut material = bound_material();

    material.set_color("tint", [0.2, 0.4, 0.6, 1.0], 0).unwrap();
    assert_eq!(
        material.get_vec4("tint", 0).unwrap(),
        Vec4::new(0.2, 0.4, 0.6, 1.0)
    );

    let err = material.set_color("gloss", Vec4::ONE, 0).unwrap_err();
    assert!(matches!(err, Error::ParamTypeMismatch { .. }));
}

#[test]
fn failing_stage_leaves_every_stage_untouched() {
    // The fragment stage references "A" without declaring the block.
    let vs = GpuParamDesc::new()
        .with_block("A", 0, 16, false)
        .with_param(GpuParamDataDesc::new("gScale", Float1, "A", 0));
    let fs = GpuParamDesc::new().with_param(GpuParamDataDesc::new("gScale", Float1, "A", 0));
    let mut material = single_pass_material("Broken", vs, fs, &[("scale", "gScale", Float1)]);

    let err = material.set_float("scale", 3.0, 0).unwrap_err();
    assert!(matches!(err, Error::ParamBlockNotFound { .. }));

    let vertex = material
        .pass_parameters(0)
        .unwrap()
        .unwrap()
        .stage(GpuProgramType::Vertex)
        .unwrap();
    assert_eq!(vertex.param_block_buffer("A").unwrap().contents(), vec![0_u8; 16]);
    assert_eq!(material.get_float("scale", 0).unwrap(), 0.0);
}

#[test]
fn element_size_must_match_parameter_type() {
    let mut tint = GpuParamDataDesc::new("gTint", Float4, "B", 0);
    tint.element_size = 12;
    tint.array_element_stride = 12;
    let desc = GpuParamDesc::new().with_block("B", 0, 32, false).with_param(tint);

    let mut params = GpuParams::new(Arc::new(desc.clone()));
    let buffer = GpuParamBlockBuffer::new("B", 32, GpuParamBlockUsage::Static);
    params.set_param_block_buffer("B", Arc::clone(&buffer)).unwrap();

    let err = params.set_param("gTint", &Vec4::ONE, 0).unwrap_err();
    assert!(matches!(
        err,
        Error::ElementSizeMismatch {
            expected: 16,
            found: 12,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert_eq!(buffer.contents(), vec![0_u8; 32]);
    assert!(params.get_param::<Vec4>("gTint", 0).is_err());

    // A material never exposes such a parameter.
    let mut material =
        single_pass_material("Truncated", desc.clone(), desc, &[("tint", "gTint", Float4)]);
    assert!(!material.valid_params().unwrap().contains_key("tint"));
    let err = material.set_vec4("tint", Vec4::ONE, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// Object Parameter Tests
// ============================================================================

#[test]
fn textures_bind_only_where_declared() {
    let mut material = bound_material();
    let albedo = Texture::new(
        "Albedo",
        TextureDesc::new_2d(TextureFormat::Rgba8UnormSrgb, 256, 256),
    );

    material
        .set_texture("albedo", Some(Arc::clone(&albedo)))
        .unwrap();
    assert!(Arc::ptr_eq(
        &material.get_texture("albedo").unwrap().unwrap(),
        &albedo
    ));

    let pass0 = material.pass_parameters(0).unwrap().unwrap();
    let fragment = pass0.stage(GpuProgramType::Fragment).unwrap();
    let vertex = pass0.stage(GpuProgramType::Vertex).unwrap();
    assert!(Arc::ptr_eq(fragment.texture("gAlbedoTex").unwrap(), &albedo));
    assert!(vertex.texture("gAlbedoTex").is_none());

    material.set_texture("albedo", None).unwrap();
    assert!(material.get_texture("albedo").unwrap().is_none());
    let pass1 = material.pass_parameters(1).unwrap().unwrap();
    assert!(
        pass1
            .stage(GpuProgramType::Fragment)
            .unwrap()
            .texture("gAlbedoTex")
            .is_none()
    );
}

#[test]
fn sampler_states_bind_in_every_pass() {
    let mut material = bound_material();
    let sampler = SamplerState::new(SamplerDesc::default());

    material
        .set_sampler_state("albedoSampler", Some(Arc::clone(&sampler)))
        .unwrap();

    for pass_idx in 0..2 {
        let fragment = material
            .pass_parameters(pass_idx)
            .unwrap()
            .unwrap()
            .stage(GpuProgramType::Fragment)
            .unwrap();
        assert!(Arc::ptr_eq(
            fragment.sampler_state("gAlbedoSamp").unwrap(),
            &sampler
        ));
    }
    assert!(
        material
            .get_sampler_state("albedoSampler")
            .unwrap()
            .is_some()
    );
}

#[test]
fn object_kind_mismatch_is_rejected() {
    let mut material = bound_material();
    let sampler = SamplerState::new(SamplerDesc::default());

    let err = material.set_sampler_state("albedo", Some(sampler)).unwrap_err();
    assert!(matches!(
        err,
        Error::ParamTypeMismatch {
            expected: ParamKind::Sampler,
            found: ParamKind::Texture,
            ..
        }
    ));

    let err = material.set_texture("gloss", None).unwrap_err();
    assert!(matches!(
        err,
        Error::ParamTypeMismatch {
            expected: ParamKind::Texture,
            found: ParamKind::Data(GpuParamDataType::Float1),
            ..
        }
    ));
}

// ============================================================================
// Param Block Tests
// ============================================================================

#[test]
fn shareable_block_has_one_buffer() {
    let material = bound_material();
    let pass0 = material.pass_parameters(0).unwrap().unwrap();
    let pass1 = material.pass_parameters(1).unwrap().unwrap();

    let vertex = pass0
        .stage(GpuProgramType::Vertex)
        .unwrap()
        .param_block_buffer("PerObject")
        .unwrap();
    let fragment = pass0
        .stage(GpuProgramType::Fragment)
        .unwrap()
        .param_block_buffer("PerObject")
        .unwrap();
    let outline = pass1
        .stage(GpuProgramType::Fragment)
        .unwrap()
        .param_block_buffer("PerObject")
        .unwrap();

    assert!(Arc::ptr_eq(vertex, fragment));
    assert!(Arc::ptr_eq(vertex, outline));
    assert!(
        material
            .valid_shareable_param_blocks()
            .unwrap()
            .contains("PerObject")
    );
}

#[test]
fn non_shareable_block_gets_a_buffer_per_stage() {
    let mut material = bound_material();
    material.set_float("exposure", 1.5, 0).unwrap();

    let first = material
        .pass_parameters(0)
        .unwrap()
        .unwrap()
        .stage(GpuProgramType::Fragment)
        .unwrap()
        .param_block_buffer("PerCall")
        .unwrap();
    let second = material
        .pass_parameters(1)
        .unwrap()
        .unwrap()
        .stage(GpuProgramType::Fragment)
        .unwrap()
        .param_block_buffer("PerCall")
        .unwrap();

    assert!(!Arc::ptr_eq(first, second));
    assert_eq!(first.usage(), GpuParamBlockUsage::Dynamic);
    assert_eq!(first.read(0, 4).unwrap(), bytemuck::bytes_of(&1.5_f32));
    assert_eq!(second.read(0, 4).unwrap(), bytemuck::bytes_of(&1.5_f32));
    assert_eq!(material.param_block_buffers().len(), 3);
}

#[test]
fn mismatched_shareable_block_falls_back_to_separate_buffers() {
    let vs_desc = GpuParamDesc::new()
        .with_block("PerObject", 0, 32, true)
        .with_param(GpuParamDataDesc::new("gTint", Float4, "PerObject", 0));
    let fs_desc = GpuParamDesc::new()
        .with_block("PerObject", 0, 32, true)
        .with_param(GpuParamDataDesc::new("gTint", Float4, "PerObject", 16));

    let shader = Shader::new("Padded")
        .with_technique(
            Technique::new(DeviceInfo::ANY, DeviceInfo::ANY).with_pass(
                Pass::new()
                    .with_program(GpuProgram::new("vs", GpuProgramType::Vertex, vs_desc))
                    .with_program(GpuProgram::new("fs", GpuProgramType::Fragment, fs_desc)),
            ),
        )
        .with_data_param("tint", "gTint", Float4)
        .build();

    let mut material = Material::new();
    material.set_shader(shader, &DeviceInfo::default()).unwrap();
    assert!(material.valid_shareable_param_blocks().unwrap().is_empty());

    let tint = Vec4::new(0.1, 0.2, 0.3, 0.4);
    material.set_vec4("tint", tint, 0).unwrap();

    let pass = material.pass_parameters(0).unwrap().unwrap();
    let vertex = pass.stage(GpuProgramType::Vertex).unwrap();
    let fragment = pass.stage(GpuProgramType::Fragment).unwrap();

    assert!(!Arc::ptr_eq(
        vertex.param_block_buffer("PerObject").unwrap(),
        fragment.param_block_buffer("PerObject").unwrap()
    ));
    assert_eq!(vertex.get_param::<Vec4>("gTint", 0).unwrap(), tint);
    assert_eq!(fragment.get_param::<Vec4>("gTint", 0).unwrap(), tint);
}

#[test]
fn non_shareable_declaration_keeps_its_own_buffer() {
    let shared = GpuParamDesc::new()
        .with_block("B", 0, 16, true)
        .with_param(GpuParamDataDesc::new("gTint", Float4, "B", 0));
    let private = GpuParamDesc::new()
        .with_block("B", 0, 64, false)
        .with_param(GpuParamDataDesc::new("gScale", Float1, "B", 0))
        .with_param(GpuParamDataDesc::new("gTint", Float4, "B", 48));
    let params = [("tint", "gTint", Float4), ("scale", "gScale", Float1)];

    for shared_stage in [GpuProgramType::Vertex, GpuProgramType::Fragment] {
        let (vs, fs, private_stage) = if shared_stage == GpuProgramType::Vertex {
            (shared.clone(), private.clone(), GpuProgramType::Fragment)
        } else {
            (private.clone(), shared.clone(), GpuProgramType::Vertex)
        };
        let mut material = single_pass_material("Mixed", vs, fs, &params);
        assert!(material.valid_shareable_param_blocks().unwrap().contains("B"));

        let tint = Vec4::new(1.0, 2.0, 3.0, 4.0);
        material.set_vec4("tint", tint, 0).unwrap();
        material.set_float("scale", 0.5, 0).unwrap();

        let pass = material.pass_parameters(0).unwrap().unwrap();
        let shared_buffer = pass
            .stage(shared_stage)
            .unwrap()
            .param_block_buffer("B")
            .unwrap();
        let private_buffer = pass
            .stage(private_stage)
            .unwrap()
            .param_block_buffer("B")
            .unwrap();

        assert!(!Arc::ptr_eq(shared_buffer, private_buffer));
        assert_eq!(shared_buffer.size(), 16);
        assert_eq!(private_buffer.size(), 64);
        assert_eq!(shared_buffer.read(0, 16).unwrap(), bytemuck::bytes_of(&tint));
        assert_eq!(private_buffer.read(0, 4).unwrap(), bytemuck::bytes_of(&0.5_f32));
        assert_eq!(private_buffer.read(48, 16).unwrap(), bytemuck::bytes_of(&tint));

        // Replacing the shared buffer leaves the private one alone.
        let private_buffer = Arc::clone(private_buffer);
        let external = GpuParamBlockBuffer::new("External", 16, GpuParamBlockUsage::Static);
        material
            .set_param_block_buffer("B", Arc::clone(&external))
            .unwrap();

        let pass = material.pass_parameters(0).unwrap().unwrap();
        assert!(Arc::ptr_eq(
            pass.stage(shared_stage).unwrap().param_block_buffer("B").unwrap(),
            &external
        ));
        assert!(Arc::ptr_eq(
            pass.stage(private_stage).unwrap().param_block_buffer("B").unwrap(),
            &private_buffer
        ));
    }
}

#[test]
fn external_block_buffer_replaces_shared_one() {
    let mut material = bound_material();
    material.set_vec4("tint", Vec4::ONE, 0).unwrap();

    let external = GpuParamBlockBuffer::new("Shared", PER_OBJECT_SIZE, GpuParamBlockUsage::Static);
    material
        .set_param_block_buffer("PerObject", Arc::clone(&external))
        .unwrap();

    // Cached values are not replayed into the new buffer.
    assert_eq!(external.read(0, 16).unwrap(), vec![0_u8; 16]);

    material.set_float("gloss", 2.0, 0).unwrap();
    assert_eq!(external.read(16, 4).unwrap(), bytemuck::bytes_of(&2.0_f32));

    for pass_idx in 0..2 {
        let pass = material.pass_parameters(pass_idx).unwrap().unwrap();
        for params in pass.iter() {
            assert!(Arc::ptr_eq(
                params.param_block_buffer("PerObject").unwrap(),
                &external
            ));
        }
    }
}

#[test]
fn undersized_external_buffer_is_rejected() {
    let mut material = bound_material();
    let before = material.param_block_buffers();

    let small = GpuParamBlockBuffer::new("Small", 64, GpuParamBlockUsage::Static);
    let err = material
        .set_param_block_buffer("PerObject", small)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ParamBlockSizeMismatch {
            expected: PER_OBJECT_SIZE,
            found: 64,
            ..
        }
    ));
    let after = material.param_block_buffers();
    assert!(
        before
            .iter()
            .zip(&after)
            .all(|(a, b)| Arc::ptr_eq(a, b))
    );
}

#[test]
fn non_shareable_block_cannot_be_replaced() {
    let mut material = bound_material();
    let buffer = GpuParamBlockBuffer::new("PerCall", PER_CALL_SIZE, GpuParamBlockUsage::Dynamic);

    let err = material.set_param_block_buffer("PerCall", buffer).unwrap_err();
    assert!(matches!(err, Error::ParamBlockNotFound { .. }));
}

#[test]
fn only_dirty_blocks_are_uploaded() {
    let mut material = bound_material();
    let mut uploader = RecordingUploader::default();

    assert_eq!(material.update_param_blocks(&mut uploader).unwrap(), 3);
    assert_eq!(material.update_param_blocks(&mut uploader).unwrap(), 0);

    material.set_float("gloss", 0.75, 0).unwrap();
    uploader.uploads.clear();
    assert_eq!(material.update_param_blocks(&mut uploader).unwrap(), 1);
    let (_, data) = &uploader.uploads[0];
    assert_eq!(data.len(), PER_OBJECT_SIZE as usize);
    assert_eq!(&data[16..20], bytemuck::bytes_of(&0.75_f32));

    material.set_float("exposure", 1.0, 0).unwrap();
    assert_eq!(material.update_param_blocks(&mut uploader).unwrap(), 2);
}

// ============================================================================
// Snapshot Tests
// ============================================================================

#[test]
fn snapshot_survives_serialization_and_replay() {
    let mut material = bound_material();
    material.set_vec4("tint", Vec4::new(0.9, 0.8, 0.7, 1.0), 0).unwrap();
    material.set_float("weights", 0.25, 1).unwrap();
    material
        .set_struct_data("light", StructData::new(vec![7; 16]), 0)
        .unwrap();

    let snapshot = material.snapshot().unwrap();
    assert_eq!(snapshot.shader, "Lit");

    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: MaterialSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, snapshot);

    let mut copy = bound_material();
    copy.apply_snapshot(&restored).unwrap();

    assert_eq!(
        copy.get_vec4("tint", 0).unwrap(),
        Vec4::new(0.9, 0.8, 0.7, 1.0)
    );
    assert_eq!(copy.get_float("weights", 1).unwrap(), 0.25);
    assert_eq!(
        copy.get_struct_data("light", 0).unwrap(),
        StructData::new(vec![7; 16])
    );

    let vertex = copy
        .pass_parameters(0)
        .unwrap()
        .unwrap()
        .stage(GpuProgramType::Vertex)
        .unwrap();
    assert_eq!(
        vertex.get_param::<Vec4>("gTint", 0).unwrap(),
        Vec4::new(0.9, 0.8, 0.7, 1.0)
    );
}

#[test]
fn invalid_snapshot_writes_nothing() {
    let mut material = bound_material();

    let mut snapshot = MaterialSnapshot {
        shader: "Lit".to_string(),
        ..Default::default()
    };
    snapshot
        .values
        .insert("tint".to_string(), ParamValues::Vec4(vec![Vec4::ONE]));
    snapshot.values.insert(
        "weights".to_string(),
        ParamValues::Float(vec![1.0, 2.0, 3.0]),
    );

    let err = material.apply_snapshot(&snapshot).unwrap_err();
    assert!(matches!(err, Error::ArrayIndexOutOfRange { .. }));
    assert_eq!(material.get_vec4("tint", 0).unwrap(), Vec4::ZERO);
}
