//! paddock
//!
//! An interactive grid-placement demo engine for native and WASM targets.
//! A ground grid is shown under an orbiting camera; the hovered cell is
//! highlighted white or red depending on occupancy, and clicking a free cell
//! places an independently animated copy of a glTF model there.
//!
//! High-level modules
//! - `camera`: camera types, orbit controller and view/projection uniforms
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures, scene graph)
//! - `flow`: high level flow control (event loop and per-frame updates)
//! - `grid`: cell coordinates, snapping and the occupancy index
//! - `highlight`: hover state and the pulsing highlight colour/opacity
//! - `pick`: pointer rays and their ground plane intersection
//! - `placement`: the placement planner and session state
//! - `pipelines`: definitions for the render pipelines (models, lines, highlight)
//! - `resources`: helpers to load glTF models, textures and animations
//! - `render`: render composition for efficient pipeline reuse
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod grid;
pub mod highlight;
pub mod pick;
pub mod pipelines;
pub mod placement;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
