use crate::model::Layout;
use serde::Serialize;
use serde_json::{Value, json};

/// Serialize the whole `Layout` as a JSON object `{ pages, meta }`.
/// Each placement carries the block key, its kind, the source system, the
/// translation and the resulting box on the output page.
pub fn to_json<K: Serialize>(layout: &Layout<K>) -> Value {
    let pages_val = layout
        .pages
        .iter()
        .map(|p| {
            let placements: Vec<Value> = p
                .placements
                .iter()
                .map(|pl| {
                    let frame = json!({
                        "x": pl.x(),
                        "y": pl.y(),
                        "w": pl.block.width(),
                        "h": pl.block.height(),
                    });
                    json!({
                        "key": &pl.block.key,
                        "kind": pl.block.kind,
                        "system": pl.system,
                        "frame": frame,
                        "translate": {"x": pl.tx, "y": pl.ty},
                    })
                })
                .collect();
            json!({
                "id": p.id,
                "width": p.width,
                "height": p.height,
                "requiredHeight": p.required_height,
                "outerSpacing": p.outer_spacing,
                "ragged": p.ragged,
                "systems": &p.systems,
                "dropped": p.dropped,
                "placements": placements,
            })
        })
        .collect::<Vec<_>>();
    json!({"pages": pages_val, "meta": &layout.meta})
}
