//! Param Block Upload
//!
//! Binds a material to a small two-stage shader, then drives its uploads
//! from the render thread onto a headless wgpu device for a few frames.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example param_block_upload
//! ```

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use parking_lot::Mutex;
use tessera::material::{
    GpuParamDataDesc, GpuParamDataType, GpuParamDesc, GpuProgram, GpuProgramType, Pass, Shader,
    Technique,
};
use tessera::{CoreSettings, CoreThread, DeviceInfo, Material, WgpuParamBlockStore};

fn unlit_shader() -> Arc<Shader> {
    let per_object = |desc: GpuParamDesc| {
        desc.with_block("PerObject", 0, 80, true)
            .with_param(GpuParamDataDesc::new(
                "gColor",
                GpuParamDataType::Float4,
                "PerObject",
                0,
            ))
            .with_param(GpuParamDataDesc::new(
                "gWorld",
                GpuParamDataType::Matrix4x4,
                "PerObject",
                16,
            ))
    };

    let vs = GpuProgram::new("unlit_vs", GpuProgramType::Vertex, per_object(GpuParamDesc::new()));
    let fs = GpuProgram::new(
        "unlit_fs",
        GpuProgramType::Fragment,
        per_object(GpuParamDesc::new())
            .with_block("PerFrame", 1, 16, false)
            .with_param(GpuParamDataDesc::new(
                "gTime",
                GpuParamDataType::Float1,
                "PerFrame",
                0,
            )),
    );

    Shader::new("Unlit")
        .with_technique(
            Technique::new("wgpu", DeviceInfo::ANY)
                .with_pass(Pass::new().with_program(vs).with_program(fs)),
        )
        .with_data_param("color", "gColor", GpuParamDataType::Float4)
        .with_data_param("world", "gWorld", GpuParamDataType::Matrix4x4)
        .with_data_param("time", "gTime", GpuParamDataType::Float1)
        .build()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let instance = wgpu::Instance::default();
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    let (device, queue) =
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))?;
    let device = Arc::new(device);
    let queue = Arc::new(queue);

    let settings = CoreSettings::default();
    let core = CoreThread::spawn(&settings)?;

    let mut material = Material::new();
    material.set_shader(unlit_shader(), &settings.device)?;
    material.set_vec4("color", Vec4::new(1.0, 0.4, 0.2, 1.0), 0)?;
    material.set_mat4("world", Mat4::from_scale(Vec3::splat(2.0)), 0)?;

    let material = Arc::new(Mutex::new(material));
    let store = Arc::new(Mutex::new(WgpuParamBlockStore::default()));

    for frame in 0..3_u8 {
        material.lock().set_float("time", f32::from(frame) / 60.0, 0)?;

        let material = Arc::clone(&material);
        let store = Arc::clone(&store);
        let device = Arc::clone(&device);
        let queue = Arc::clone(&queue);

        let op = core.queue().queue_return_command(move |op| {
            let mut store = store.lock();
            let mut uploader = store.uploader(&device, &queue);
            let uploaded = material
                .lock()
                .update_param_blocks(&mut uploader)
                .unwrap_or_else(|err| {
                    log::error!("Param block upload failed: {err}");
                    0
                });
            if let Err(err) = op.complete_operation(uploaded as u32) {
                log::error!("{err}");
            }
        })?;

        op.wait();
        let uploaded: u32 = op.return_value()?;
        log::info!("Frame {frame}: uploaded {uploaded} param blocks");
    }

    log::info!("{} uniform buffers on the device", store.lock().len());
    core.shutdown()?;
    Ok(())
}
