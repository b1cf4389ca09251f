//! # OpenSilicon Core
//!
//! The layout object model the DRC engine evaluates rule conditions against:
//! layout items and their geometry, the technology layer stack with wildcard
//! name lookup, and an R-tree spatial index for neighbourhood queries.
//!
//! All coordinates and lengths are in nanometers.

pub mod database;
pub mod geometry;
pub mod item;
pub mod layer;
pub mod spatial;
pub mod wildcard;

pub use database::{DatabaseError, LayoutDatabase};
pub use geometry::{BBox, GeomPrimitive, Path, Point, Polygon, Rect, Via};
pub use item::{ItemId, LayoutItem, ObjectKind};
pub use layer::{Layer, LayerId, LayerKind, LayerStack};
pub use spatial::{SpatialEntry, SpatialIndex};
pub use wildcard::Pattern;
