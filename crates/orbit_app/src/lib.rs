//! Orbit demo application
//!
//! Hosts the orbiter scene (draggable box, launch animation, satellite
//! orbits) on top of the `orbit_animation` engine. The binary in
//! `main.rs` drives the scene headlessly with a fixed timestep.

pub mod scene;

pub use scene::{Frame, Scene};
