//! Core library for laying out score systems with blank analysis staves.
//!
//! - Packing: auto-fit by page height, a single tall page, or an explicit grouping plan
//! - Rendering: exact block placement per page with ragged/justified spacing, staff shift and drop flags
//! - Pipeline: `lay_out` takes score blocks + one staff block and returns rendered pages + metadata
//! - Drawing goes through the `Canvas`/`PageSink` traits, so any document backend can consume a layout.
//!
//! Quick example:
//! ```
//! use add_staves_core::prelude::*;
//! # fn main() -> add_staves_core::Result<()> {
//! let score = vec![
//!     Block::score("system-1".to_string(), Rect::from_size(500.0, 120.0)),
//!     Block::score("system-2".to_string(), Rect::from_size(500.0, 110.0)),
//! ];
//! let staff = Block::staff("staves".to_string(), Rect::from_size(538.0, 70.0));
//! let cfg = LayoutConfig::builder().staves(2).build();
//! let layout = lay_out(score, staff, &cfg)?;
//! println!("pages: {}", layout.pages.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod height;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod render;

pub use compositing::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use height::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use render::*;

/// Convenience prelude for common types and functions.
/// Importing `add_staves_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::compositing::{Canvas, PageSink, compose};
    pub use crate::config::{Grouping, LayoutConfig, LayoutConfigBuilder, StaffPosition};
    pub use crate::model::{
        Block, BlockKind, Layout, LayoutStats, Meta, Page, PairedSystem, Placement, Rect,
        RenderedPage,
    };
    pub use crate::packer::{PackState, PagePacker};
    pub use crate::render::PageFlags;
    pub use crate::{lay_out, lay_out_into, required_height, to_json};
}
