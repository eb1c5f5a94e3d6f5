use add_staves_core::prelude::*;

#[derive(Default)]
struct RecordingCanvas {
    ops: Vec<(String, f64, f64)>,
}

impl Canvas<String> for RecordingCanvas {
    fn draw_under(&mut self, block: &Block<String>, tx: f64, ty: f64) {
        self.ops.push((block.key.clone(), tx, ty));
    }
}

#[derive(Default)]
struct RecordingSink {
    pages: Vec<(f64, f64, RecordingCanvas)>,
}

impl PageSink<String> for RecordingSink {
    type Canvas = RecordingCanvas;

    fn add_blank_page(&mut self, width: f64, height: f64) -> &mut RecordingCanvas {
        self.pages.push((width, height, RecordingCanvas::default()));
        let last = self.pages.len() - 1;
        &mut self.pages[last].2
    }
}

fn inputs(n: usize) -> (Vec<Block>, Block) {
    let score = (0..n)
        .map(|i| Block::score(format!("s{}", i), Rect::new(0.0, 0.0, 500.0, 150.0)))
        .collect();
    let staff = Block::staff("staff".to_string(), Rect::new(10.0, 5.0, 548.5, 65.0));
    (score, staff)
}

#[test]
fn sink_receives_every_placement_in_order() {
    let (score, staff) = inputs(7);
    let cfg = LayoutConfig::builder().drop_last(true).build();
    let mut sink = RecordingSink::default();
    let layout = lay_out_into(score, staff, &cfg, &mut sink).expect("layout");

    assert_eq!(sink.pages.len(), layout.pages.len());
    for ((w, h, canvas), page) in sink.pages.iter().zip(&layout.pages) {
        assert_eq!(*w, page.width);
        assert_eq!(*h, page.height);
        let expected: Vec<(String, f64, f64)> = page
            .placements
            .iter()
            .map(|p| (p.block.key.clone(), p.tx, p.ty))
            .collect();
        assert_eq!(canvas.ops, expected);
    }
    let drawn: usize = sink.pages.iter().map(|(_, _, c)| c.ops.len()).sum();
    assert_eq!(drawn, 7 * 2 - 1);
}

#[test]
fn export_json_smoke() {
    let (score, staff) = inputs(3);
    let cfg = LayoutConfig::default();
    let layout = lay_out(score, staff, &cfg).expect("layout");
    let value = to_json(&layout);
    let obj = value.as_object().expect("object");
    assert!(obj.contains_key("pages"));
    assert!(obj.contains_key("meta"));

    let pages = obj["pages"].as_array().expect("pages");
    assert_eq!(pages.len(), layout.pages.len());
    let first = &pages[0]["placements"][0];
    assert_eq!(first["key"], "s0");
    assert_eq!(first["kind"], "score");
    assert_eq!(first["frame"]["x"], 20.0);
    assert_eq!(obj["meta"]["app"], "add-staves");
    assert_eq!(obj["meta"]["unit"], "pt");
}

#[test]
fn stats_summary_mentions_pages() {
    let (score, staff) = inputs(10);
    let layout = lay_out(score, staff, &LayoutConfig::default()).expect("layout");
    let stats = layout.stats();
    assert_eq!(stats.num_systems, 10);
    assert_eq!(stats.num_placements, 20);
    assert_eq!(stats.num_dropped, 0);
    assert!(stats.avg_systems_per_page > 1.0);
    assert!(stats.summary().contains(&format!("Pages: {}", stats.num_pages)));
}
