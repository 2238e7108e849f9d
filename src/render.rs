//! Frame planning and GPU rendering of a [`Scene`].
//!
//! Rendering a scene happens in two steps. [`plan_frame`] walks the scene and
//! decides, without touching the GPU, which meshes are drawn with which
//! pipeline and which offscreen passes the water materials need. The
//! [`GpuRenderer`] then executes that plan: every water material first gets a
//! reflection pass (camera mirrored on the water plane, everything below the
//! plane clipped) and a refraction pass (main camera, everything above the
//! plane clipped), each drawing the material's render list. The main pass
//! draws all meshes into the surface.
//!
//! The headless engine runs the same planning step, so what the tests observe
//! is what the GPU engine draws.

use std::collections::BTreeSet;

use cgmath::Vector4;
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    camera::{CameraController, FreeCamera, Projection, ViewUniform},
    context::{Context, FrameBindings},
    data_structures::{
        light::LightUniform,
        scene::{MaterialId, MeshId, Scene, SceneId},
    },
    engine::Renderer,
    error::{RenderError, SceneError},
    pipelines::{PipelineKey, water::WaterUniform},
    resources::scene::SceneResources,
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshId,
    pub material: Option<MaterialId>,
    pub pipeline: PipelineKey,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PassKind {
    Reflection,
    Refraction,
}

/// Render-to-texture pass feeding a water material.
#[derive(Clone, Debug, PartialEq)]
pub struct OffscreenPass {
    pub material: MaterialId,
    pub kind: PassKind,
    /// Height of the water plane, taken from the first mesh using the material.
    pub plane_height: f32,
    pub draws: Vec<DrawItem>,
}

impl OffscreenPass {
    /// Keeps what is above the plane for reflections and what is below it for refractions.
    pub fn clip_plane(&self) -> Vector4<f32> {
        match self.kind {
            PassKind::Reflection => Vector4::new(0.0, 1.0, 0.0, -self.plane_height),
            PassKind::Refraction => Vector4::new(0.0, -1.0, 0.0, self.plane_height),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    pub offscreen: Vec<OffscreenPass>,
    pub main: Vec<DrawItem>,
}

impl FramePlan {
    /// Every pipeline the plan draws with, each once.
    pub fn pipeline_keys(&self) -> Vec<PipelineKey> {
        let mut keys = Vec::new();
        let items = self
            .offscreen
            .iter()
            .flat_map(|pass| pass.draws.iter())
            .chain(self.main.iter());
        for item in items {
            if !keys.contains(&item.pipeline) {
                keys.push(item.pipeline);
            }
        }
        keys
    }
}

fn draw_item(scene: &Scene, id: MeshId) -> Result<DrawItem, SceneError> {
    let mesh = scene.mesh(id).ok_or(SceneError::UnknownMesh(id))?;
    let pipeline = match mesh.material {
        None => PipelineKey::DEFAULT,
        Some(material_id) => {
            let material = scene
                .material(material_id)
                .ok_or(SceneError::UnknownMaterial(material_id))?;
            PipelineKey {
                kind: Some(material.kind()),
                cull_back: material.back_face_culling(),
            }
        }
    };
    Ok(DrawItem {
        mesh: id,
        material: mesh.material,
        pipeline,
    })
}

/// Decides what a frame of `scene` draws.
///
/// Render list entries that no longer exist, that use the water material
/// itself or that use any other water material are left out of the offscreen
/// passes. Water materials no mesh uses get no passes at all.
pub fn plan_frame(scene: &Scene) -> Result<FramePlan, RenderError> {
    if scene.active_camera().is_none() {
        return Err(RenderError::NoActiveCamera);
    }

    let mut plan = FramePlan::default();
    for (material_id, material) in scene.materials() {
        let Some(water) = material.as_water() else {
            continue;
        };
        let users: BTreeSet<MeshId> = scene.meshes_using(material_id).into_iter().collect();
        let Some(plane_height) = users
            .first()
            .and_then(|id| scene.mesh(*id))
            .map(|mesh| mesh.position.y)
        else {
            continue;
        };

        let mut draws = Vec::new();
        for &id in water.render_list() {
            if users.contains(&id) || scene.mesh(id).is_none() {
                continue;
            }
            if scene.material_of(id).and_then(|m| m.as_water()).is_some() {
                continue;
            }
            draws.push(draw_item(scene, id)?);
        }

        for kind in [PassKind::Reflection, PassKind::Refraction] {
            plan.offscreen.push(OffscreenPass {
                material: material_id,
                kind,
                plane_height,
                draws: draws.clone(),
            });
        }
    }

    for (id, _) in scene.meshes() {
        plan.main.push(draw_item(scene, id)?);
    }
    Ok(plan)
}

/// The engine side camera: a copy of the scene's active camera that user
/// input moves, plus the clock driving animated materials.
#[derive(Debug)]
pub struct ViewState {
    camera: Option<FreeCamera>,
    controller: Option<CameraController>,
    projection: Option<Projection>,
    width: u32,
    height: u32,
    elapsed: Duration,
}

impl ViewState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: None,
            controller: None,
            projection: None,
            width,
            height,
            elapsed: Duration::ZERO,
        }
    }

    /// The camera to render `scene` with. Taken from the scene on first use.
    pub fn resolve(&mut self, scene: &Scene) -> Result<(&FreeCamera, &Projection), RenderError> {
        if self.camera.is_none() {
            let camera = scene.active_camera().ok_or(RenderError::NoActiveCamera)?;
            log::info!("rendering through camera {}", camera.name);
            self.controller = camera
                .control()
                .map(|_| CameraController::for_camera(camera));
            self.projection = Some(Projection::for_camera(camera, self.width, self.height));
            self.camera = Some(camera.clone());
        }
        match (&self.camera, &self.projection) {
            (Some(camera), Some(projection)) => Ok((camera, projection)),
            _ => Err(RenderError::NoActiveCamera),
        }
    }

    pub fn camera(&self) -> Option<&FreeCamera> {
        self.camera.as_ref()
    }

    /// Feeds input to the camera controller, if the camera accepts input.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match &mut self.controller {
            Some(controller) => controller.handle_window_events(event),
            None => false,
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
        if let (Some(controller), Some(camera)) = (&mut self.controller, &mut self.camera) {
            controller.update(camera, dt);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        if let Some(projection) = &mut self.projection {
            projection.resize(width, height);
        }
    }

    pub fn seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Executes frame plans against the surface of a [`Context`].
///
/// The surface texture is acquired by the first scene rendered in a frame and
/// presented by [`GpuRenderer::present`]; later scenes in the same frame draw
/// on top of it.
pub struct GpuRenderer<'a> {
    ctx: &'a mut Context,
    resources: &'a mut SceneResources,
    view: &'a mut ViewState,
    frame: Option<wgpu::SurfaceTexture>,
}

impl<'a> GpuRenderer<'a> {
    pub fn new(
        ctx: &'a mut Context,
        resources: &'a mut SceneResources,
        view: &'a mut ViewState,
    ) -> Self {
        Self {
            ctx,
            resources,
            view,
            frame: None,
        }
    }

    /// Presents the frame if any scene was rendered.
    pub fn present(self) {
        if let Some(frame) = self.frame {
            self.ctx.window.pre_present_notify();
            frame.present();
        }
    }
}

impl Renderer for GpuRenderer<'_> {
    fn render_scene(&mut self, scene: &Scene) -> Result<(), RenderError> {
        let plan = plan_frame(scene)?;
        self.resources.sync(self.ctx, scene, &plan);

        let scene_id = scene.id();
        let time = self.view.seconds();
        let (camera, projection) = self.view.resolve(scene)?;
        let ctx = &*self.ctx;

        let light = scene
            .lights()
            .first()
            .map(|light| light.to_uniform())
            .unwrap_or_else(LightUniform::unlit);
        ctx.queue
            .write_buffer(&ctx.light_buffer, 0, bytemuck::cast_slice(&[light]));
        ctx.main_view.write(
            &ctx.queue,
            &ViewUniform::new(camera, projection, Vector4::new(0.0, 0.0, 0.0, 0.0), time),
        );

        for pass in &plan.offscreen {
            let Some(targets) = self
                .resources
                .material(scene_id, pass.material)
                .and_then(|m| m.water_targets())
            else {
                continue;
            };
            let (pass_camera, bindings) = match pass.kind {
                PassKind::Reflection => (camera.mirrored(pass.plane_height), &targets.reflection_view),
                PassKind::Refraction => (camera.clone(), &targets.refraction_view),
            };
            bindings.write(
                &ctx.queue,
                &ViewUniform::new(&pass_camera, projection, pass.clip_plane(), time),
            );
            if pass.kind == PassKind::Reflection {
                if let Some(water) = scene.material(pass.material).and_then(|m| m.as_water()) {
                    let reflection_view_proj = projection.calc_matrix() * pass_camera.view_matrix();
                    self.resources.write_water(
                        ctx,
                        scene_id,
                        pass.material,
                        &WaterUniform::new(water, reflection_view_proj, pass.plane_height),
                    );
                }
            }
        }

        let first_scene = self.frame.is_none();
        if first_scene {
            self.frame = Some(ctx.surface.get_current_texture()?);
        }
        let Some(frame) = &self.frame else {
            return Ok(());
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        for pass in &plan.offscreen {
            let Some(targets) = self
                .resources
                .material(scene_id, pass.material)
                .and_then(|m| m.water_targets())
            else {
                continue;
            };
            let (color, bindings, label) = match pass.kind {
                PassKind::Reflection => (&targets.reflection, &targets.reflection_view, "Reflection Pass"),
                PassKind::Refraction => (&targets.refraction, &targets.refraction_view, "Refraction Pass"),
            };
            let mut render_pass = begin_pass(
                &mut encoder,
                label,
                &color.view,
                &targets.depth.view,
                wgpu::LoadOp::Clear(scene.clear_color),
            );
            draw_items(
                &mut render_pass,
                ctx,
                self.resources,
                scene_id,
                &bindings.bind_group,
                &pass.draws,
            );
        }

        {
            let load = if first_scene {
                wgpu::LoadOp::Clear(scene.clear_color)
            } else {
                wgpu::LoadOp::Load
            };
            let mut render_pass = begin_pass(
                &mut encoder,
                "Main Pass",
                &surface_view,
                &ctx.depth_texture.view,
                load,
            );
            draw_items(
                &mut render_pass,
                ctx,
                self.resources,
                scene_id,
                &ctx.main_view.bind_group,
                &plan.main,
            );
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    color: &wgpu::TextureView,
    depth: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}

fn draw_items(
    render_pass: &mut wgpu::RenderPass<'_>,
    ctx: &Context,
    resources: &SceneResources,
    scene: SceneId,
    frame_bind_group: &wgpu::BindGroup,
    items: &[DrawItem],
) {
    render_pass.set_bind_group(0, frame_bind_group, &[]);
    for item in items {
        let (Some(pipeline), Some(mesh)) = (
            ctx.pipelines.get(&item.pipeline),
            resources.mesh(scene, item.mesh),
        )
        else {
            continue;
        };
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(1, &mesh.bind_group, &[]);
        if let Some(material) = item.material {
            match resources.material(scene, material) {
                Some(gpu) => render_pass.set_bind_group(2, gpu.bind_group(), &[]),
                None => continue,
            }
        }
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{
        material::{GridMaterial, MaterialKind, WaterMaterial},
        mesh::Mesh,
    };
    use cgmath::{Point3, Vector3};

    fn scene_with_camera() -> Scene {
        let mut scene = Scene::new();
        scene.add_camera(FreeCamera::new("camera", Point3::new(0.0, 5.0, -10.0)));
        scene
    }

    #[test]
    fn no_camera_no_frame() {
        assert!(matches!(plan_frame(&Scene::new()), Err(RenderError::NoActiveCamera)));
    }

    #[test]
    fn meshes_without_material_use_default_pipeline() {
        let mut scene = scene_with_camera();
        scene.add_mesh(Mesh::create_box("box", 1.0));
        let plan = plan_frame(&scene).unwrap();
        assert!(plan.offscreen.is_empty());
        assert_eq!(plan.main[0].pipeline, PipelineKey::DEFAULT);
        assert_eq!(plan.pipeline_keys(), vec![PipelineKey::DEFAULT]);
    }

    #[test]
    fn water_gets_reflection_and_refraction_passes() {
        let mut scene = scene_with_camera();
        let grid = scene.add_material(GridMaterial::new("grid"));
        let ball = scene.add_mesh(Mesh::create_sphere("ball", 8, 1.0).with_position(Vector3::unit_y()));
        scene.set_material(ball, grid).unwrap();
        let surface = scene.add_mesh(
            Mesh::create_ground("water", 10.0, 10.0, 1).with_position(Vector3::new(0.0, -0.5, 0.0)),
        );
        let water = scene.add_material(WaterMaterial::new("water"));
        scene.set_material(surface, water).unwrap();
        scene.add_to_render_list(water, ball).unwrap();

        let plan = plan_frame(&scene).unwrap();
        assert_eq!(plan.offscreen.len(), 2);
        let reflection = &plan.offscreen[0];
        assert_eq!(reflection.kind, PassKind::Reflection);
        assert_eq!(reflection.plane_height, -0.5);
        assert_eq!(reflection.clip_plane(), Vector4::new(0.0, 1.0, 0.0, 0.5));
        assert_eq!(plan.offscreen[1].clip_plane(), Vector4::new(0.0, -1.0, 0.0, -0.5));
        assert_eq!(reflection.draws.len(), 1);
        assert_eq!(reflection.draws[0].pipeline.kind, Some(MaterialKind::Grid));
        assert_eq!(plan.main.len(), 2);
    }

    #[test]
    fn unused_water_material_renders_nothing_offscreen() {
        let mut scene = scene_with_camera();
        let ball = scene.add_mesh(Mesh::create_sphere("ball", 8, 1.0));
        let water = scene.add_material(WaterMaterial::new("water"));
        scene.add_to_render_list(water, ball).unwrap();
        assert!(plan_frame(&scene).unwrap().offscreen.is_empty());
    }

    #[test]
    fn other_water_surfaces_are_not_reflected() {
        let mut scene = scene_with_camera();
        let a = scene.add_mesh(Mesh::create_ground("a", 10.0, 10.0, 1));
        let b = scene.add_mesh(Mesh::create_ground("b", 10.0, 10.0, 1));
        let water_a = scene.add_material(WaterMaterial::new("water a"));
        let water_b = scene.add_material(WaterMaterial::new("water b"));
        scene.set_material(a, water_a).unwrap();
        scene.set_material(b, water_b).unwrap();
        scene.add_to_render_list(water_a, b).unwrap();
        let plan = plan_frame(&scene).unwrap();
        assert_eq!(plan.offscreen.len(), 4);
        assert!(plan.offscreen.iter().all(|pass| pass.draws.is_empty()));
    }

    #[test]
    fn view_state_copies_the_scene_camera() {
        let scene = scene_with_camera();
        let mut view = ViewState::new(800, 600);
        let (camera, projection) = view.resolve(&scene).unwrap();
        assert_eq!(camera.position, Point3::new(0.0, 5.0, -10.0));
        assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
        view.advance(Duration::from_millis(500));
        assert!((view.seconds() - 0.5).abs() < 1e-6);
    }
}
