//! The jump-over-the-enemy game: world setup, per-tick rules and input.

use crate::error::{AssetError, GameError};
use crate::gpu::device::{SharedDevice, TextureId};
use crate::gpu::resource::GpuResource;
use crate::io::config::{Config, GameConfig};
use crate::io::texture_loader::{checkerboard, load_texture};
use crate::physics::{
    BodyDesc, BodyHandle, BodyKind, BodyTransform, PhysicsError, PhysicsWorld, RapierWorld, Shape,
    TransformSource,
};
use crate::scene::{
    Camera, GlyphRasterizer, LightRenderer, LitMeshRenderer, MeshKind, Programs, Scene,
    TextRenderer,
};
use crate::ui::input::GameInput;
use log::{debug, info, warn};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::Path;

const HERO_RADIUS: f32 = 1.0;
const HERO_MASS: f32 = 13.0;
const HERO_START: [f32; 3] = [0.0, 0.5, 0.0];
const GROUND_HALF_EXTENTS: [f32; 3] = [4.0, 0.5, 4.0];
const GROUND_CENTER: [f32; 3] = [0.0, -1.0, 0.0];
const ENEMY_HALF_EXTENT: f32 = 1.0;
/// Upward speed above which ground contact does not count as standing.
const GROUNDED_MAX_RISE: f32 = 0.5;

const SPECULAR_STRENGTH: f32 = 0.1;
const AMBIENT_STRENGTH: f32 = 0.5;

const FALLBACK_TEXTURE_SIZE: u32 = 64;
const FALLBACK_TEXTURE_CELLS: u32 = 8;

/// What a rigid body means to the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRole {
    Hero,
    Ground,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameState {
    pub score: u32,
    /// Set by hero-ground contact, cleared by a jump.
    pub grounded: bool,
    pub game_over: bool,
}

/// The scene, the physics world and the rules binding them.
pub struct Game {
    scene: Scene,
    world: RapierWorld,
    roles: HashMap<BodyHandle, ObjectRole>,
    hero: BodyHandle,
    enemy: BodyHandle,
    score_text: usize,
    state: GameState,
    rules: GameConfig,
}

impl Game {
    /// Builds the hero, ground, enemy, light and score text on `device`.
    ///
    /// Missing or unreadable textures fall back to a checkerboard.
    pub fn new(
        device: &SharedDevice,
        config: &Config,
        glyphs: &dyn GlyphRasterizer,
    ) -> Result<Self, GameError> {
        let rules = config.game.clone();
        let (width, height) = (config.render.width as f32, config.render.height as f32);

        // --- Physics ---
        let mut world = RapierWorld::new(Vector3::new(0.0, rules.gravity, 0.0));
        let hero = world.add_body(
            BodyDesc::new(
                Shape::Sphere(HERO_RADIUS),
                BodyKind::Dynamic,
                BodyTransform::from_translation(Vector3::from(HERO_START)),
            )
            .with_mass(HERO_MASS),
        )?;
        let ground = world.add_body(BodyDesc::new(
            Shape::Box(Vector3::from(GROUND_HALF_EXTENTS)),
            BodyKind::Static,
            BodyTransform::from_translation(Vector3::from(GROUND_CENTER)),
        ))?;
        let enemy = world.add_body(
            BodyDesc::new(
                Shape::Box(Vector3::repeat(ENEMY_HALF_EXTENT)),
                BodyKind::Kinematic,
                BodyTransform::from_translation(rules.enemy_start()),
            )
            .as_sensor(),
        )?;
        let roles = HashMap::from([
            (hero, ObjectRole::Hero),
            (ground, ObjectRole::Ground),
            (enemy, ObjectRole::Enemy),
        ]);

        // --- Scene ---
        let programs = Programs::new(device)?;
        let camera = Camera::new(
            config.camera.fov,
            width,
            height,
            config.camera.near,
            config.camera.far,
            config.camera.position(),
        );
        let mut light = LightRenderer::new(device, MeshKind::Cube)?;
        light.set_program(programs.flat.handle());
        light.set_position(Vector3::from(config.light.position));
        light.set_color(Vector3::from(config.light.color));

        let lit_program = programs.lit_textured.handle();
        let text_program = programs.text.handle();
        let mut scene = Scene::new(device, camera, light, programs);
        scene.clear_color = config.render.clear_color();
        scene.draw_light = config.render.draw_light;

        let mut hero_mesh = LitMeshRenderer::new(
            device,
            MeshKind::Sphere,
            hero,
            "hero",
            SPECULAR_STRENGTH,
            AMBIENT_STRENGTH,
        )?;
        hero_mesh.set_program(lit_program);
        hero_mesh.set_texture(object_texture(
            device,
            rules.hero_texture.as_deref(),
            ([220, 230, 60], [250, 250, 250]),
        )?);
        scene.add_object(hero_mesh);

        let mut ground_mesh = LitMeshRenderer::new(
            device,
            MeshKind::Cube,
            ground,
            "ground",
            SPECULAR_STRENGTH,
            AMBIENT_STRENGTH,
        )?;
        ground_mesh.set_program(lit_program);
        ground_mesh.set_scale(Vector3::from(GROUND_HALF_EXTENTS));
        ground_mesh.set_texture(object_texture(
            device,
            rules.ground_texture.as_deref(),
            ([90, 140, 70], [70, 110, 50]),
        )?);
        scene.add_object(ground_mesh);

        let mut enemy_mesh = LitMeshRenderer::new(
            device,
            MeshKind::Cube,
            enemy,
            "enemy",
            SPECULAR_STRENGTH,
            AMBIENT_STRENGTH,
        )?;
        enemy_mesh.set_program(lit_program);
        enemy_mesh.set_texture(object_texture(
            device,
            rules
                .enemy_texture
                .as_deref()
                .or(rules.ground_texture.as_deref()),
            ([180, 60, 60], [120, 30, 30]),
        )?);
        scene.add_object(enemy_mesh);

        let mut text = TextRenderer::new(
            device,
            score_label(0),
            glyphs,
            rules.text_size,
            Vector3::from(rules.text_color),
            text_program,
            (width, height),
        )?;
        text.set_position(rules.text_position());
        let score_text = scene.add_overlay(text);

        info!(
            "game ready: hero {:?}, ground {:?}, enemy {:?}",
            hero, ground, enemy
        );
        Ok(Self {
            scene,
            world,
            roles,
            hero,
            enemy,
            score_text,
            state: GameState::default(),
            rules,
        })
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn physics(&self) -> &RapierWorld {
        &self.world
    }

    pub fn role_of(&self, body: BodyHandle) -> Option<ObjectRole> {
        self.roles.get(&body).copied()
    }

    pub fn hero_position(&self) -> Result<Vector3<f32>, PhysicsError> {
        self.position_of(self.hero)
    }

    pub fn enemy_position(&self) -> Result<Vector3<f32>, PhysicsError> {
        self.position_of(self.enemy)
    }

    /// Steps physics, then (unless the game is over) moves the enemy and
    /// applies the contact rules.
    pub fn update(&mut self, dt: f32) -> Result<(), GameError> {
        self.world.step(dt);
        if self.state.game_over {
            return Ok(());
        }
        self.advance_enemy(dt)?;
        self.apply_contacts()?;
        Ok(())
    }

    /// Applies one player action. `Break` means the player asked to quit.
    pub fn handle_input(&mut self, input: GameInput) -> Result<ControlFlow<()>, GameError> {
        match input {
            GameInput::Quit => return Ok(ControlFlow::Break(())),
            GameInput::Restart if self.state.game_over => {
                info!("restart");
                self.state.game_over = false;
            }
            GameInput::Jump if !self.state.game_over && self.state.grounded => {
                debug!("jump");
                self.state.grounded = false;
                self.world
                    .apply_impulse(self.hero, Vector3::new(0.0, self.rules.jump_impulse, 0.0))?;
            }
            _ => {}
        }
        Ok(ControlFlow::Continue(()))
    }

    pub fn render(&self) -> Result<(), GameError> {
        self.scene.render(&self.world)?;
        Ok(())
    }

    fn position_of(&self, body: BodyHandle) -> Result<Vector3<f32>, PhysicsError> {
        self.world
            .world_transform(body)
            .map(|t| t.translation)
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn advance_enemy(&mut self, dt: f32) -> Result<(), GameError> {
        let mut position = self.enemy_position()?;
        position.x += self.rules.enemy_speed * dt;
        if position.x <= self.rules.enemy_reset_x {
            position = self.rules.enemy_start();
            self.state.score += 1;
            info!("score {}", self.state.score);
            self.refresh_score_text();
        }
        self.world
            .set_world_transform(self.enemy, BodyTransform::from_translation(position))?;
        Ok(())
    }

    fn apply_contacts(&mut self) -> Result<(), GameError> {
        let mut hit_enemy = false;
        let mut on_ground = false;
        for contact in self.world.contacts() {
            match (self.role_of(contact.a), self.role_of(contact.b)) {
                (Some(ObjectRole::Hero), Some(ObjectRole::Enemy))
                | (Some(ObjectRole::Enemy), Some(ObjectRole::Hero)) => hit_enemy = true,
                (Some(ObjectRole::Hero), Some(ObjectRole::Ground))
                | (Some(ObjectRole::Ground), Some(ObjectRole::Hero)) => on_ground = true,
                _ => {}
            }
        }

        // Contacts predate the step, so a hero that just jumped still touches.
        let rising = self
            .world
            .linear_velocity(self.hero)
            .is_some_and(|v| v.y > GROUNDED_MAX_RISE);
        if on_ground && !rising {
            self.state.grounded = true;
        }

        if hit_enemy {
            info!("hero hit at score {}, game over", self.state.score);
            self.world.set_world_transform(
                self.enemy,
                BodyTransform::from_translation(self.rules.enemy_start()),
            )?;
            self.state.score = 0;
            self.state.game_over = true;
            self.refresh_score_text();
        }
        Ok(())
    }

    fn refresh_score_text(&mut self) {
        let label = score_label(self.state.score);
        if let Some(text) = self.scene.overlay_mut(self.score_text) {
            text.set_text(label);
        }
    }
}

fn score_label(score: u32) -> String {
    format!("Score: {}", score)
}

fn object_texture(
    device: &SharedDevice,
    path: Option<&Path>,
    fallback: ([u8; 3], [u8; 3]),
) -> Result<GpuResource<TextureId>, AssetError> {
    if let Some(path) = path {
        match load_texture(device, path) {
            Ok(texture) => return Ok(texture),
            Err(e) => warn!("{}, using a checkerboard instead", e),
        }
    }
    let (a, b) = fallback;
    checkerboard(device, FALLBACK_TEXTURE_SIZE, FALLBACK_TEXTURE_CELLS, a, b)
}
