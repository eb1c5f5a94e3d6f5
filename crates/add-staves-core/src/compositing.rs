use crate::model::{Block, Layout};

/// Drawing surface of one output page.
pub trait Canvas<K> {
    /// Draw `block` translated by (`tx`, `ty`) beneath everything already on
    /// the canvas. The source block is left untouched.
    fn draw_under(&mut self, block: &Block<K>, tx: f64, ty: f64);
}

/// Output document that hands out one blank canvas per page.
pub trait PageSink<K> {
    type Canvas: Canvas<K>;

    /// Append a blank page of the given size and return its canvas.
    fn add_blank_page(&mut self, width: f64, height: f64) -> &mut Self::Canvas;
}

/// Replays the placements of `layout` onto `sink`, one page at a time, in
/// document order.
pub fn compose<K, S: PageSink<K>>(layout: &Layout<K>, sink: &mut S) {
    for page in &layout.pages {
        let canvas = sink.add_blank_page(page.width, page.height);
        for p in &page.placements {
            canvas.draw_under(&p.block, p.tx, p.ty);
        }
    }
}
