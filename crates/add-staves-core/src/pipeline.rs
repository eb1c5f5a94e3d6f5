use crate::compositing::{PageSink, compose};
use crate::config::{LayoutConfig, StaffPosition};
use crate::error::{LayoutError, Result};
use crate::model::{Block, BlockKind, Layout, Meta, Page, PairedSystem};
use crate::packer::pack_systems;
use crate::render::{PageFlags, render_page};
use tracing::{debug, info, instrument};

/// Pairs every score block with the shared staff block, keeping score order.
pub fn pair_systems<K: Clone>(
    score: Vec<Block<K>>,
    staff: &Block<K>,
    position: StaffPosition,
) -> Vec<PairedSystem<K>> {
    score
        .into_iter()
        .enumerate()
        .map(|(index, block)| PairedSystem::pair(index, block, staff, position))
        .collect()
}

/// Splits paired systems into pages according to `cfg.grouping`.
pub fn paginate<K>(systems: Vec<PairedSystem<K>>, cfg: &LayoutConfig) -> Vec<Page<K>> {
    pack_systems(systems, cfg)
}

/// Flags for page `index` of `count`: the last page uses `ragged_last`, drop
/// flags only reach the first/last page.
pub fn page_flags(index: usize, count: usize, cfg: &LayoutConfig) -> PageFlags {
    let first = index == 0;
    let last = index + 1 == count;
    PageFlags {
        ragged: if last { cfg.ragged_last } else { cfg.ragged },
        shift: cfg.shift,
        drop_first: first && cfg.drop_first,
        drop_last: last && cfg.drop_last,
    }
}

#[instrument(skip_all)]
/// Lays out `score` (one block per system) with `staff` next to every system
/// and returns the rendered pages with their placements.
///
/// Notes:
/// - Systems keep score order; each one lands on exactly one page.
/// - A system taller than the page gets a page of its own, grown to fit.
/// - The result is deterministic for the same inputs.
pub fn lay_out<K: Clone>(score: Vec<Block<K>>, staff: Block<K>, cfg: &LayoutConfig) -> Result<Layout<K>> {
    cfg.validate()?;

    if score.is_empty() {
        return Err(LayoutError::Empty);
    }
    if let Some(pos) = score.iter().position(|b| b.kind != BlockKind::Score) {
        return Err(LayoutError::InvalidInput(format!(
            "score block {} is not tagged as score content",
            pos
        )));
    }
    if staff.kind != BlockKind::Staff {
        return Err(LayoutError::InvalidInput(
            "staff block is not tagged as staff content".into(),
        ));
    }

    let systems = pair_systems(score, &staff, cfg.staff_position);
    let num_systems = systems.len();
    let pages = paginate(systems, cfg);
    debug!(systems = num_systems, pages = pages.len(), "paginated");

    let count = pages.len();
    let rendered = pages
        .iter()
        .enumerate()
        .map(|(index, page)| render_page(page, cfg, page_flags(index, count, cfg)))
        .collect();

    let meta = Meta {
        schema_version: "1".into(),
        app: "add-staves".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        unit: "pt".into(),
        page_size: (cfg.page_width, cfg.page_height),
        staff_position: cfg.staff_position,
        staves: cfg.staves,
        grouping: cfg.grouping.clone(),
    };
    let layout = Layout {
        pages: rendered,
        meta,
    };
    info!(systems = num_systems, pages = count, "layout computed");
    Ok(layout)
}

/// Same as [`lay_out`], then draws every page onto `sink`.
pub fn lay_out_into<K: Clone, S: PageSink<K>>(
    score: Vec<Block<K>>,
    staff: Block<K>,
    cfg: &LayoutConfig,
    sink: &mut S,
) -> Result<Layout<K>> {
    let layout = lay_out(score, staff, cfg)?;
    compose(&layout, sink);
    Ok(layout)
}
