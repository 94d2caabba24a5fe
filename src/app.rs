//! The frame driver and windowed application runner.
//!
//! [`Stage`] bundles everything one scene needs at runtime: the graph,
//! its root, the camera, the lights, and the animation nodes. Its
//! [`simulate`](Stage::simulate) method is phase one of the two-phase
//! frame loop; [`run`] wires a stage to a winit window and drives
//! simulate-then-render every frame, so the render traversal never
//! observes a half-updated transform.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::animation::AnimationNode;
use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::light::Light;
use crate::node::{NodeId, SceneGraph};
use crate::shading::ShadingConfig;
use crate::visitor::{RenderError, RenderVisitor, Renderables, SetupVisitor};

/// A scene tree together with its runtime state.
pub struct Stage {
    pub scene: SceneGraph,
    pub root: NodeId,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub animations: Vec<AnimationNode>,
}

impl Stage {
    pub fn new(scene: SceneGraph, root: NodeId) -> Self {
        Self {
            scene,
            root,
            camera: Camera::new(),
            lights: Vec::new(),
            animations: Vec::new(),
        }
    }

    /// Phase one of the frame: every animation node advances and writes
    /// its target transform before any rendering happens.
    pub fn simulate(&mut self, delta_ms: f32) {
        for animation in &mut self.animations {
            animation.simulate(&mut self.scene, delta_ms);
        }
    }

    /// Flips the active flag of every animation node.
    pub fn toggle_animations(&mut self) {
        for animation in &mut self.animations {
            animation.toggle_active();
        }
    }
}

/// GPU-side state, created once the window exists.
struct Gfx {
    window: Arc<Window>,
    gpu: GpuContext,
    visitor: RenderVisitor,
    renderables: Renderables,
}

/// Winit application driving a [`Stage`].
struct App {
    stage: Stage,
    gfx: Option<Gfx>,
    last_frame: Instant,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("arbor"))
                .unwrap(),
        );

        let mut gpu = GpuContext::new(window.clone());
        let phong = ShadingConfig::phong(&gpu);
        let textured = ShadingConfig::textured(&gpu);

        let renderables =
            match SetupVisitor::new(&textured).setup(&mut gpu, &self.stage.scene, self.stage.root)
            {
                Ok(renderables) => renderables,
                Err(e) => {
                    log::error!("scene setup failed: {e}");
                    event_loop.exit();
                    return;
                }
            };

        self.stage.camera.aspect = gpu.aspect();
        window.request_redraw();
        self.gfx = Some(Gfx {
            window,
            gpu,
            visitor: RenderVisitor::new(phong, textured),
            renderables,
        });
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(gfx) = &mut self.gfx else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gfx.gpu.resize(size.width, size.height);
                self.stage.camera.aspect = gfx.gpu.aspect();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Space)
                    && event.state.is_pressed()
                    && !event.repeat
                {
                    self.stage.toggle_animations();
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let delta_ms = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
                self.last_frame = now;

                // Two-phase frame: simulate sweep, then render sweep.
                self.stage.simulate(delta_ms);

                let result = gfx.visitor.render(
                    &gfx.gpu,
                    &self.stage.scene,
                    self.stage.root,
                    &gfx.renderables,
                    Some(&self.stage.camera),
                    &self.stage.lights,
                );

                match result {
                    Ok(()) => {}
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let (width, height) = (gfx.gpu.width(), gfx.gpu.height());
                        gfx.gpu.resize(width, height);
                    }
                    Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                        log::warn!("surface timeout, frame skipped");
                    }
                    Err(e) => {
                        log::error!("rendering failed: {e}");
                        event_loop.exit();
                        return;
                    }
                }

                gfx.window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Opens a window and runs the stage until the window closes.
pub fn run(stage: Stage) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        stage,
        gfx: None,
        last_frame: Instant::now(),
    };
    event_loop.run_app(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{RotationNode, SlerpNode};
    use crate::color::Color;
    use crate::transform::Transform;
    use glam::{Quat, Vec3};

    fn stage_with_two_animated_groups() -> (Stage, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let root = scene.add_group(Transform::identity());
        let spinner = scene.add_group(Transform::translation(Vec3::X));
        let swinger = scene.add_group(Transform::sqt(Vec3::ONE, Quat::IDENTITY, Vec3::Y));
        let a = scene.add_sphere(Color::RED);
        let b = scene.add_sphere(Color::BLUE);
        scene.attach(root, spinner).unwrap();
        scene.attach(root, swinger).unwrap();
        scene.attach(spinner, a).unwrap();
        scene.attach(swinger, b).unwrap();

        let mut stage = Stage::new(scene, root);
        stage
            .animations
            .push(RotationNode::new(spinner, Vec3::Y).into());
        stage
            .animations
            .push(SlerpNode::new(swinger, Quat::IDENTITY, Quat::from_rotation_x(1.0)).into());
        (stage, spinner, swinger)
    }

    #[test]
    fn simulate_advances_every_active_animation() {
        let (mut stage, spinner, swinger) = stage_with_two_animated_groups();
        let spinner_before = stage.scene.group(spinner).unwrap().transform.matrix();
        let swinger_before = stage.scene.group(swinger).unwrap().transform.matrix();

        stage.toggle_animations();
        stage.simulate(500.0);

        let spinner_after = stage.scene.group(spinner).unwrap().transform.matrix();
        let swinger_after = stage.scene.group(swinger).unwrap().transform.matrix();
        assert_ne!(spinner_before, spinner_after);
        assert_ne!(swinger_before, swinger_after);
    }

    #[test]
    fn simulate_is_inert_while_animations_are_paused() {
        let (mut stage, spinner, swinger) = stage_with_two_animated_groups();
        let spinner_before = stage.scene.group(spinner).unwrap().transform.matrix();
        let swinger_before = stage.scene.group(swinger).unwrap().transform.matrix();

        stage.simulate(500.0);

        assert_eq!(
            stage.scene.group(spinner).unwrap().transform.matrix(),
            spinner_before
        );
        assert_eq!(
            stage.scene.group(swinger).unwrap().transform.matrix(),
            swinger_before
        );
    }

    #[test]
    fn toggle_animations_flips_every_node() {
        let (mut stage, _, _) = stage_with_two_animated_groups();
        assert!(stage.animations.iter().all(|a| !a.is_active()));
        stage.toggle_animations();
        assert!(stage.animations.iter().all(|a| a.is_active()));
        stage.toggle_animations();
        assert!(stage.animations.iter().all(|a| !a.is_active()));
    }
}
