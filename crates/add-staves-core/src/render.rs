use tracing::{trace, warn};

use crate::config::LayoutConfig;
use crate::height::{required_height, slack};
use crate::model::{Page, Placement, RenderedPage};

/// Per-page adjustments decided by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageFlags {
    /// Use the nominal outer spacing and leave leftover space at the bottom.
    pub ragged: bool,
    /// Horizontal offset for staff blocks.
    pub shift: f64,
    /// Skip the staff block of the first system on the page.
    pub drop_first: bool,
    /// Skip the staff block of the last system on the page.
    pub drop_last: bool,
}

/// Computes where every block of `page` is drawn.
///
/// The canvas origin is bottom-left. The cursor starts `top_margin` below the
/// top edge and walks down: each block is placed with its top edge at the
/// cursor, then the cursor moves past it (plus `inner_spacing` between the
/// blocks of one system, plus the outer gap between systems). A suppressed
/// staff block is skipped without moving the cursor.
///
/// When the page is not ragged the slack of the nominal page is spread over
/// the gaps: `outer_spacing + slack / system_count`. Slack is taken from the
/// full content, before any block is suppressed, and may be negative.
pub fn render_page<K: Clone>(page: &Page<K>, cfg: &LayoutConfig, flags: PageFlags) -> RenderedPage<K> {
    let required = required_height(&page.systems, cfg);
    let height = required.max(cfg.page_height);
    if required > cfg.page_height {
        warn!(
            page = page.id,
            required,
            nominal = cfg.page_height,
            "content exceeds page height, growing page"
        );
    }

    let count = page.systems.len();
    let spread_spacing = cfg.outer_spacing + slack(&page.systems, cfg) / count as f64;
    let outer_spacing = if flags.ragged {
        cfg.outer_spacing
    } else {
        spread_spacing
    };

    let mut placements = Vec::with_capacity(count * 2);
    let mut dropped = 0;
    let mut cursor = height - cfg.top_margin;

    for (outer, system) in page.systems.iter().enumerate() {
        let first_system = outer == 0;
        let last_system = outer + 1 == count;
        let blocks = system.blocks.len();

        for (inner, block) in system.blocks.iter().enumerate() {
            let suppressed = block.is_staff()
                && ((flags.drop_first && first_system) || (flags.drop_last && last_system));
            if suppressed {
                trace!(system = system.index, "staff block dropped");
                dropped += 1;
                continue;
            }

            let shift = if block.is_staff() { flags.shift } else { 0.0 };
            let placement = Placement {
                block: block.clone(),
                system: system.index,
                tx: cfg.left_margin - block.left() + shift,
                ty: cursor - block.top(),
            };
            trace!(
                system = system.index,
                kind = ?block.kind,
                tx = placement.tx,
                ty = placement.ty,
                "place block"
            );
            placements.push(placement);

            cursor -= block.height();
            if inner + 1 != blocks {
                cursor -= cfg.inner_spacing;
            }
        }

        if !last_system {
            cursor -= outer_spacing;
        }
    }

    RenderedPage {
        id: page.id,
        width: cfg.page_width,
        height,
        required_height: required,
        outer_spacing,
        ragged: flags.ragged,
        systems: page.system_indices(),
        placements,
        dropped,
    }
}
