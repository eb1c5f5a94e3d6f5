use serde::{Deserialize, Serialize};

use crate::config::{Grouping, StaffPosition};

/// Axis-aligned box in PDF user space (points). The origin is bottom-left,
/// so `top > bottom` for any non-degenerate box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Rect {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }
    /// Box of the given size anchored at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
    pub fn width(&self) -> f64 {
        self.right - self.left
    }
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// What a content block holds. Staff blocks get the horizontal shift and are
/// the only blocks the drop flags may suppress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// One system cropped from the input score.
    Score,
    /// A pre-rendered page of empty staves.
    Staff,
}

/// A page-sized piece of drawable content together with its bounding box.
///
/// `key` is the caller's handle to the drawable (an object id, an index, a
/// file name); the engine only clones and hands it back in placements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block<K = String> {
    pub key: K,
    pub kind: BlockKind,
    pub bbox: Rect,
}

impl<K> Block<K> {
    pub fn score(key: K, bbox: Rect) -> Self {
        Self {
            key,
            kind: BlockKind::Score,
            bbox,
        }
    }
    pub fn staff(key: K, bbox: Rect) -> Self {
        Self {
            key,
            kind: BlockKind::Staff,
            bbox,
        }
    }
    pub fn width(&self) -> f64 {
        self.bbox.width()
    }
    pub fn height(&self) -> f64 {
        self.bbox.height()
    }
    /// Left offset of the block's own origin; subtracted during placement.
    pub fn left(&self) -> f64 {
        self.bbox.left
    }
    /// Top offset of the block's own origin; subtracted during placement.
    pub fn top(&self) -> f64 {
        self.bbox.top
    }
    pub fn is_staff(&self) -> bool {
        self.kind == BlockKind::Staff
    }
}

/// One score system paired with its staff block, stored top-to-bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedSystem<K = String> {
    /// Position of the system in the input score (0-based).
    pub index: usize,
    pub blocks: Vec<Block<K>>,
}

impl<K: Clone> PairedSystem<K> {
    pub fn pair(index: usize, score: Block<K>, staff: &Block<K>, position: StaffPosition) -> Self {
        let blocks = match position {
            StaffPosition::Above => vec![staff.clone(), score],
            StaffPosition::Below => vec![score, staff.clone()],
        };
        Self { index, blocks }
    }
}

impl<K> PairedSystem<K> {
    /// Sum of the block heights, without any spacing.
    pub fn content_height(&self) -> f64 {
        self.blocks.iter().map(Block::height).sum()
    }
}

/// Systems that will be rendered onto one output page, in score order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<K = String> {
    pub id: usize,
    pub systems: Vec<PairedSystem<K>>,
}

impl<K> Page<K> {
    pub fn len(&self) -> usize {
        self.systems.len()
    }
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
    /// Input score indices of the systems on this page.
    pub fn system_indices(&self) -> Vec<usize> {
        self.systems.iter().map(|s| s.index).collect()
    }
}

/// A block drawn onto an output page.
///
/// `tx`/`ty` is the translation applied to the block's own coordinate space;
/// `x`/`y` is where the block's bottom-left corner lands on the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement<K = String> {
    pub block: Block<K>,
    /// Input score index of the system the block belongs to.
    pub system: usize,
    pub tx: f64,
    pub ty: f64,
}

impl<K> Placement<K> {
    pub fn x(&self) -> f64 {
        self.tx + self.block.bbox.left
    }
    pub fn y(&self) -> f64 {
        self.ty + self.block.bbox.bottom
    }
    /// Top edge of the placed block in page coordinates.
    pub fn top(&self) -> f64 {
        self.ty + self.block.bbox.top
    }
}

/// A single output page (logical record) with its drawing operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderedPage<K = String> {
    pub id: usize,
    pub width: f64,
    pub height: f64,
    /// Height the content needs, before clamping to the nominal page height.
    pub required_height: f64,
    /// Gap actually used between consecutive systems.
    pub outer_spacing: f64,
    pub ragged: bool,
    /// Input score indices of the systems on this page.
    pub systems: Vec<usize>,
    /// Drawing operations in the order they were emitted.
    pub placements: Vec<Placement<K>>,
    /// Staff blocks suppressed by the drop flags.
    pub dropped: usize,
}

impl<K> RenderedPage<K> {
    /// True when the content did not fit the nominal page height.
    pub fn is_overfull(&self, page_height: f64) -> bool {
        self.required_height > page_height
    }
}

/// Layout-level metadata (common fields used by exporters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    /// Schema version of the exported layout JSON; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub unit: String,
    pub page_size: (f64, f64),
    pub staff_position: StaffPosition,
    pub staves: u8,
    pub grouping: Grouping,
}

/// Full layout of a document: rendered pages and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layout<K = String> {
    pub pages: Vec<RenderedPage<K>>,
    pub meta: Meta,
}

/// Statistics about a computed layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LayoutStats {
    pub num_pages: usize,
    pub num_systems: usize,
    pub num_placements: usize,
    /// Staff blocks suppressed by drop-first/drop-last.
    pub num_dropped: usize,
    /// Pages taller than the nominal page height.
    pub num_overfull: usize,
    pub max_page_height: f64,
    /// Average number of systems per page.
    pub avg_systems_per_page: f64,
}

impl<K> Layout<K> {
    /// Computes statistics for this layout.
    pub fn stats(&self) -> LayoutStats {
        let nominal = self.meta.page_size.1;
        let num_pages = self.pages.len();
        let mut num_systems = 0;
        let mut num_placements = 0;
        let mut num_dropped = 0;
        let mut num_overfull = 0;
        let mut max_page_height = 0.0f64;

        for page in &self.pages {
            num_systems += page.systems.len();
            num_placements += page.placements.len();
            num_dropped += page.dropped;
            if page.is_overfull(nominal) {
                num_overfull += 1;
            }
            max_page_height = max_page_height.max(page.height);
        }

        let avg_systems_per_page = if num_pages > 0 {
            num_systems as f64 / num_pages as f64
        } else {
            0.0
        };

        LayoutStats {
            num_pages,
            num_systems,
            num_placements,
            num_dropped,
            num_overfull,
            max_page_height,
            avg_systems_per_page,
        }
    }

    /// Input score indices grouped per output page.
    pub fn page_systems(&self) -> Vec<Vec<usize>> {
        self.pages.iter().map(|p| p.systems.clone()).collect()
    }
}

impl LayoutStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Systems: {}, Placements: {}, Dropped staves: {}, Overfull pages: {}, Tallest page: {:.1} pt",
            self.num_pages,
            self.num_systems,
            self.num_placements,
            self.num_dropped,
            self.num_overfull,
            self.max_page_height,
        )
    }
}
