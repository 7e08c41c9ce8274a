//! Engine data structures: models, textures, instances and the scene graph.
//!
//! - `model` contains mesh and material definitions with their GPU resources
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `scene_graph` holds the hierarchical glTF scene representation and the
//!   deep clone used for placed instances

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
