//! Octree Demo
//!
//! Drives a moving scene through the octree without a window:
//! - Ships (triangle meshes) and drones (boxes) fly around and bounce off
//!   the walls, marking themselves dirty every frame
//! - Static lights and occluder walls share the same tree
//! - An orbiting camera runs frustum, occluded frustum and pick-ray
//!   queries each frame and logs what it sees
//!
//! Usage: `octree_demo [config.ron|config.toml] [frames]`

mod occluders;

use std::f32::consts::{FRAC_PI_3, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_octree::prelude::*;

use occluders::OccluderSet;

// Octree bounds: -50 to +50 on each axis
const OCTREE_SIZE: f32 = 100.0;

// Entity counts
const NUM_SHIPS: usize = 40;
const NUM_DRONES: usize = 120;
const NUM_LIGHTS: usize = 8;

// Movement
const SHIP_SPEED: f32 = 6.0;
const DRONE_SPEED: f32 = 9.0;
const SHIP_SIZE: f32 = 0.8;
const DRONE_SIZE: f32 = 0.4;

const DEFAULT_FRAMES: u32 = 300;
const FRAME_TIME: f32 = 1.0 / 60.0;
const STATS_INTERVAL: u32 = 60;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("failed to load octree config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid frame count '{0}'")]
    FrameCount(String),
}

/// What kind of drawable a mover is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoverKind {
    /// Triangle mesh, moved through its transform
    Ship,
    /// Plain box, moved through its bounds
    Drone,
}

struct Mover {
    id: ObjectId,
    kind: MoverKind,
    position: Vec3,
    velocity: Vec3,
}

struct OctreeDemoApp {
    scene: SceneManager,
    movers: Vec<Mover>,
    camera_angle: f32,
    rng: StdRng,
}

impl OctreeDemoApp {
    fn new(config: OctreeConfig) -> Self {
        let mut app = Self {
            scene: SceneManager::new(config),
            movers: Vec::new(),
            camera_angle: 0.0,
            rng: StdRng::seed_from_u64(0x0C77EE),
        };
        app.create_walls();
        app.create_lights();
        for _ in 0..NUM_SHIPS {
            app.create_mover(MoverKind::Ship);
        }
        for _ in 0..NUM_DRONES {
            app.create_mover(MoverKind::Drone);
        }

        log::info!(
            "Scene ready: {} drawables, {} octree nodes",
            app.scene.len(),
            app.scene.stats().node_count
        );
        app
    }

    fn ship_geometry() -> MeshGeometry {
        let nose = Vec3::new(0.0, 0.0, -1.5);
        let left = Vec3::new(-1.0, 0.0, 1.0);
        let right = Vec3::new(1.0, 0.0, 1.0);
        let fin = Vec3::new(0.0, 0.8, 0.8);
        MeshGeometry::single(vec![
            Triangle::new(nose, left, right),
            Triangle::new(nose, left, fin),
            Triangle::new(nose, fin, right),
            Triangle::new(left, right, fin),
        ])
    }

    fn create_walls(&mut self) {
        let half = OCTREE_SIZE / 2.0;
        for x in [-half * 0.4, half * 0.4] {
            let wall = Aabb::new(
                Vec3::new(x - 1.0, -half, -half * 0.5),
                Vec3::new(x + 1.0, half * 0.3, half * 0.5),
            );
            self.scene
                .add(BoundsDrawable::new(wall).with_occluder(true).with_cast_shadows(true));
        }
    }

    fn create_lights(&mut self) {
        let half = OCTREE_SIZE / 2.0;
        for _ in 0..NUM_LIGHTS {
            let center = self.random_position(half * 0.9);
            let light = BoundsDrawable::new(Aabb::cube(center, self.rng.gen_range(4.0..12.0)))
                .with_flags(DrawableFlags::LIGHT);
            self.scene.add(light);
        }
    }

    fn create_mover(&mut self, kind: MoverKind) {
        let half = OCTREE_SIZE / 2.0;
        let position = self.random_position(half * 0.9);
        let (speed, id) = match kind {
            MoverKind::Ship => {
                let mesh = StaticMesh::new(vec![Self::ship_geometry()]).with_transform(
                    Transform::from_position(position).with_scale(Vec3::repeat(SHIP_SIZE)),
                );
                (SHIP_SPEED, self.scene.add(mesh))
            }
            MoverKind::Drone => {
                let drone = BoundsDrawable::new(Aabb::cube(position, DRONE_SIZE))
                    .with_cast_shadows(self.rng.gen_bool(0.5));
                (DRONE_SPEED, self.scene.add(drone))
            }
        };
        let direction = self.random_position(1.0).normalize();
        self.movers.push(Mover {
            id,
            kind,
            position,
            velocity: direction * speed,
        });
    }

    fn random_position(&mut self, extent: f32) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-extent..extent),
            self.rng.gen_range(-extent..extent),
            self.rng.gen_range(-extent..extent),
        )
    }

    fn rotation_from_velocity(velocity: Vec3) -> Quat {
        let yaw = velocity.x.atan2(-velocity.z);
        Quat::from_axis_angle(&Vec3::y_axis(), -yaw)
    }

    fn move_objects(&mut self, delta_time: f32) {
        let half_bounds = OCTREE_SIZE / 2.0;

        for mover in &mut self.movers {
            let mut pos = mover.position + mover.velocity * delta_time;

            // Bounce off walls
            for axis in 0..3 {
                if pos[axis] < -half_bounds || pos[axis] > half_bounds {
                    mover.velocity[axis] = -mover.velocity[axis];
                    pos[axis] = pos[axis].max(-half_bounds).min(half_bounds);
                }
            }
            mover.position = pos;

            match mover.kind {
                MoverKind::Ship => {
                    let transform = Transform::from_position_rotation(
                        pos,
                        Self::rotation_from_velocity(mover.velocity),
                    )
                    .with_scale(Vec3::repeat(SHIP_SIZE));
                    self.scene
                        .modify_as::<StaticMesh, _>(mover.id, |mesh| mesh.set_transform(transform));
                }
                MoverKind::Drone => {
                    self.scene.modify_as::<BoundsDrawable, _>(mover.id, |drone| {
                        drone.set_bounds(Aabb::cube(pos, DRONE_SIZE));
                    });
                }
            }
        }
    }

    fn camera(&self) -> (Vec3, Mat4) {
        let eye = Vec3::new(
            self.camera_angle.cos() * OCTREE_SIZE,
            OCTREE_SIZE * 0.5,
            self.camera_angle.sin() * OCTREE_SIZE,
        );
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());
        let projection = Mat4::perspective(FRAC_PI_3, 16.0 / 9.0, 0.5, OCTREE_SIZE * 3.0);
        (eye, projection * view)
    }

    fn update(&mut self, frame: u32) {
        self.move_objects(FRAME_TIME);
        let moved = self.scene.update();

        self.camera_angle = (self.camera_angle + 0.2 * FRAME_TIME) % TAU;
        let (eye, view_projection) = self.camera();
        let frustum = Frustum::from_matrix(&view_projection);

        let visible = self
            .scene
            .get_objects(&FrustumQuery::new(frustum.clone(), DrawableFlags::GEOMETRY));
        let lights = self
            .scene
            .get_objects(&FrustumQuery::new(frustum.clone(), DrawableFlags::LIGHT));
        let shadow_casters = self.scene.get_objects(&FrustumQuery::new(
            frustum.clone(),
            QueryFilter::new(DrawableFlags::GEOMETRY).shadow_casters_only(),
        ));

        let occluders = OccluderSet::from_scene(&self.scene, eye);
        let unoccluded = self.scene.get_objects(&OccludedFrustumQuery::new(
            frustum,
            &occluders,
            DrawableFlags::GEOMETRY,
        ));

        let pick = RayOctreeQuery::new(Ray::new(eye, -eye), DrawableFlags::GEOMETRY)
            .with_max_distance(OCTREE_SIZE * 3.0);
        let hit = self.scene.raycast_single(&pick);

        log::debug!(
            "Frame {frame}: moved {moved}, visible {}, unoccluded {}, lights {}, shadow casters {}",
            visible.len(),
            unoccluded.len(),
            lights.len(),
            shadow_casters.len()
        );
        if let Some(hit) = hit {
            log::trace!("Frame {frame}: pick ray hit {:?} at {:.2}", hit.object, hit.distance);
        }

        if frame % STATS_INTERVAL == 0 {
            let stats = self.scene.stats();
            log::info!(
                "Frame {frame}: {} nodes ({} leaves, depth {}), {} objects, {} at root; \
                 {} visible, {} after occlusion by {} walls",
                stats.node_count,
                stats.leaf_count,
                stats.max_depth,
                stats.object_count,
                stats.root_objects,
                visible.len(),
                unoccluded.len(),
                occluders.len()
            );
        }
    }

    fn run(mut self, frames: u32) {
        for frame in 1..=frames {
            self.update(frame);
        }

        let octree = self.scene.octree();
        println!("Finished {frames} frames");
        for depth in 0..=octree.config().max_depth {
            let nodes = octree.nodes_at_depth(depth);
            if nodes.is_empty() {
                break;
            }
            let occupied = nodes.iter().filter(|node| !node.objects().is_empty()).count();
            println!("  depth {depth}: {} nodes, {occupied} occupied", nodes.len());
        }
        println!("  {} leaf regions", octree.leaf_bounds().len());
    }
}

fn parse_args() -> Result<(OctreeConfig, u32), DemoError> {
    let mut config = OctreeConfig::with_bounds(Aabb::cube(Vec3::zeros(), OCTREE_SIZE / 2.0));
    let mut frames = DEFAULT_FRAMES;

    for arg in std::env::args().skip(1) {
        if arg.ends_with(".ron") || arg.ends_with(".toml") {
            config = OctreeConfig::load_from_file(&arg)?;
            config.validate()?;
            log::info!("Loaded octree config from {arg}");
        } else {
            frames = arg.parse().map_err(|_| DemoError::FrameCount(arg.clone()))?;
        }
    }
    Ok((config, frames))
}

fn main() -> Result<(), DemoError> {
    scene_octree::foundation::logging::init();

    println!("=== Octree Demo ===");
    println!("{NUM_SHIPS} ships and {NUM_DRONES} drones moving through a {OCTREE_SIZE}-unit cube");
    println!("Set RUST_LOG=debug for per-frame query counts");
    println!();

    let (config, frames) = parse_args()?;
    let app = OctreeDemoApp::new(config);
    app.run(frames);
    Ok(())
}
