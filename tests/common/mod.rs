#![allow(dead_code)]

use hopper::gpu::{SharedDevice, SoftwareDevice};
use hopper::scene::{Camera, LightRenderer, MeshKind, Programs};
use nalgebra::Vector3;
use std::cell::RefCell;
use std::rc::Rc;

/// A software device plus the same device behind the drawable-facing handle.
pub fn software_device(width: usize, height: usize) -> (Rc<RefCell<SoftwareDevice>>, SharedDevice) {
    let software = Rc::new(RefCell::new(SoftwareDevice::new(width, height, 1)));
    let shared: SharedDevice = software.clone();
    (software, shared)
}

/// The game's camera: 45 degrees, 800x600, looking at the origin from (0, 4, 30).
pub fn game_camera() -> Camera {
    Camera::new(45.0, 800.0, 600.0, 0.1, 100.0, Vector3::new(0.0, 4.0, 30.0))
}

pub fn light(device: &SharedDevice, programs: &Programs) -> LightRenderer {
    let mut light = LightRenderer::new(device, MeshKind::Cube).unwrap();
    light.set_program(programs.flat.handle());
    light.set_position(Vector3::new(0.0, 10.0, 0.0));
    light
}
