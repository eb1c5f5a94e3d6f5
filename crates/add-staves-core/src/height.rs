use crate::config::LayoutConfig;
use crate::model::PairedSystem;

/// Vertical extent needed to stack `systems` on one page: margins, one inner
/// gap per system, one outer gap between each pair of systems, and every
/// block's height.
///
/// Callers never pass an empty sequence; with zero systems the outer-spacing
/// term goes negative.
pub fn required_height<'a, K: 'a>(
    systems: impl IntoIterator<Item = &'a PairedSystem<K>>,
    cfg: &LayoutConfig,
) -> f64 {
    let mut count = 0usize;
    let mut content = 0.0;
    for system in systems {
        count += 1;
        content += system.content_height();
    }
    let count = count as f64;
    cfg.outer_spacing * (count - 1.0)
        + cfg.inner_spacing * count
        + cfg.top_margin
        + cfg.bottom_margin
        + content
}

/// Space left on a nominal page once `systems` are stacked. Negative when the
/// content is taller than the page.
pub fn slack<K>(systems: &[PairedSystem<K>], cfg: &LayoutConfig) -> f64 {
    cfg.page_height - required_height(systems, cfg)
}
