// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Lamina Sandbox
// Usage: sandbox [device-settings.json] [trace-output.bin]

use anyhow::{Context, Result};
use lamina_core::platform::input::{InputEvent, InputEvents, Key, KeyAction, KeyEvent};
use lamina_core::renderer::api::{
    enums::{CompareFunction, ShaderStage},
    handles::ShaderId,
    resource::{BindFlags, ConstantBuffer, Owned, Texture2D, TextureDescriptor},
    shader::ShaderDescriptor,
    state::{DepthStencilStateDescriptor, Viewport},
};
use lamina_core::renderer::traits::{DeviceContext, GraphicsDevice};
use lamina_core::renderer::{
    Bindable, OutputStageBinding, PipelineStateBinder, ScopedBinding, ShaderStageBinding,
};
use lamina_infra::graphics::software::{create_device, DeviceDescriptor};
use lamina_infra::graphics::trace::RecordingContext;
use std::sync::Arc;

const FRAME_COUNT: u32 = 4;
const GRADIENT_SIZE: u32 = 256;

// Placeholder program; the software device only checks that bytecode is present.
const GRADIENT_BLIT_CS: &[u8] = b"DXBC gradient blit";

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameConstants {
    frame: u32,
    width: u32,
    height: u32,
    _pad: u32,
}

fn gradient(device: &Arc<dyn GraphicsDevice>) -> Result<Texture2D> {
    let texels: Vec<u8> = (0..GRADIENT_SIZE * GRADIENT_SIZE)
        .flat_map(|i| {
            let x = (i % GRADIENT_SIZE) as u8;
            let y = (i / GRADIENT_SIZE) as u8;
            [x, y, 0, 255]
        })
        .collect();
    let texture = Texture2D::new(
        device,
        TextureDescriptor {
            label: Some("gradient".to_owned()),
            width: GRADIENT_SIZE,
            height: GRADIENT_SIZE,
            bind: BindFlags::SHADER_RESOURCE,
            ..Default::default()
        },
        Some(&texels),
    )?;
    Ok(texture)
}

fn compute_shader(device: &Arc<dyn GraphicsDevice>) -> Result<Owned<ShaderId>> {
    let id = device.create_shader(&ShaderDescriptor {
        label: Some("gradient blit".into()),
        stage: ShaderStage::Compute,
        bytecode: GRADIENT_BLIT_CS.into(),
        group_size: [8, 8, 1],
    })?;
    Ok(Owned::new(device.clone(), id))
}

fn load_settings(path: Option<String>) -> Result<DeviceDescriptor> {
    let Some(path) = path else {
        return Ok(DeviceDescriptor {
            backbuffer_unordered_access: true,
            ..Default::default()
        });
    };
    let settings = DeviceDescriptor::load(&path)
        .with_context(|| format!("could not load device settings from {path}"))?;
    if !settings.backbuffer_unordered_access {
        anyhow::bail!("the sandbox writes the backbuffer from a compute shader, enable backbuffer_unordered_access");
    }
    Ok(settings)
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let settings = load_settings(args.next())?;
    let trace_path = args.next();

    let (device, ctx, swap_chain) = create_device(settings)?;
    let mut swap_chain = swap_chain.context("the sandbox needs a swap chain")?;
    let gpu: Arc<dyn GraphicsDevice> = device.clone();
    let (width, height) = (device.descriptor().width, device.descriptor().height);

    let mut input = InputEvents::new();
    input.subscribe_keys(|event| {
        if event.key == Key::Char('W') && event.action == KeyAction::Up {
            log::error!("W released");
        }
    });
    // No window to read from, so a key press is scripted over the first frames.
    let scripted_input = input.sender();

    let gradient = gradient(&gpu)?;
    let cs = compute_shader(&gpu)?;
    let mut constants = ConstantBuffer::new(
        &gpu,
        FrameConstants {
            frame: 0,
            width,
            height,
            _pad: 0,
        },
    )?;
    let raster = device.create_default_raster_state()?;
    let depth_state = Owned::new(
        gpu.clone(),
        gpu.create_depth_stencil_state(&DepthStencilStateDescriptor {
            depth_compare: CompareFunction::Less,
            ..Default::default()
        })?,
    );

    let mut compute = ShaderStageBinding::new(ShaderStage::Compute, cs.id());
    compute
        .link_resource(0, gradient.srv().context("gradient has no shader view")?)?
        .link_constant_buffer(0, constants.buffer())?
        .link_unordered_access_view(
            0,
            swap_chain.backbuffer.uav().context("backbuffer has no unordered access view")?,
        )?;
    let compute = Bindable::from(compute);

    let mut output = OutputStageBinding::new();
    output
        .link_viewport(0, Viewport::from_size(width, height))?
        .link_render_target(0, swap_chain.backbuffer.rtv().context("backbuffer has no render target view")?)?
        .link_raster_state(raster.id())
        .link_depth_stencil_state(depth_state.id(), 0);
    let depth_view = swap_chain.depth_buffer.as_ref().and_then(Texture2D::dsv);
    if let Some(dsv) = depth_view {
        output.link_depth_stencil_view(dsv);
    }
    let output = Bindable::from(output);

    let groups = gpu
        .shader_info(cs.id())
        .context("compute shader was released")?
        .dispatch_groups([width, height, 1]);

    let mut binder = PipelineStateBinder::new();
    let mut ctx = RecordingContext::new(ctx);

    for frame in 0..FRAME_COUNT {
        match frame {
            1 => scripted_input.send(InputEvent::Key(KeyEvent {
                key: Key::Char('W'),
                action: KeyAction::Down,
            }))?,
            2 => scripted_input.send(InputEvent::Key(KeyEvent {
                key: Key::Char('W'),
                action: KeyAction::Up,
            }))?,
            _ => {}
        }
        input.pump();

        constants.data.frame = frame;
        constants.update()?;

        {
            let mut scope = ScopedBinding::new(&mut binder, &mut ctx, [&compute]);
            scope.context().dispatch(groups);
        }
        {
            let mut scope = ScopedBinding::new(&mut binder, &mut ctx, [&output]);
            if let Some(dsv) = depth_view {
                scope.context().clear_depth_stencil(dsv, 1.0, 0);
            }
        }
        swap_chain.present();
    }

    let (ctx, commands) = ctx.into_parts();
    log::info!(
        "Presented {} frames, call stats: {}",
        swap_chain.presented_frames(),
        serde_json::to_string(&ctx.stats())?
    );
    for violation in ctx.violations() {
        log::warn!("{violation}");
    }

    if let Some(path) = trace_path {
        commands.save(&path)?;
    }
    Ok(())
}
