use add_staves_core::prelude::*;
use add_staves_core::paginate;
use rand::{Rng, SeedableRng};

fn score(i: usize, h: f64) -> Block {
    Block::score(format!("s{}", i), Rect::new(0.0, 0.0, 500.0, h))
}

fn staff() -> Block {
    Block::staff("staff".into(), Rect::new(10.0, 5.0, 548.5, 65.0))
}

fn paired(heights: &[f64]) -> Vec<PairedSystem> {
    heights
        .iter()
        .enumerate()
        .map(|(i, h)| PairedSystem::pair(i, score(i, *h), &staff(), StaffPosition::Below))
        .collect()
}

fn indices(pages: &[Page]) -> Vec<Vec<usize>> {
    pages.iter().map(|p| p.system_indices()).collect()
}

#[test]
fn fills_pages_up_to_the_page_height() {
    let cfg = LayoutConfig::default();
    // 3 systems need 670pt, 4 would need 880pt > 842pt
    let pages = paginate(paired(&[100.0; 9]), &cfg);
    assert_eq!(
        indices(&pages),
        vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]
    );
    let ids: Vec<usize> = pages.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn page_exactly_at_capacity_is_kept() {
    let cfg = LayoutConfig::default();
    // 30 + 2 * 20 + 70 + 2 * (291 + 60) = 842
    let pages = paginate(paired(&[291.0, 291.0, 291.0]), &cfg);
    assert_eq!(indices(&pages), vec![vec![0, 1], vec![2]]);
    assert_eq!(required_height(&pages[0].systems, &cfg), 842.0);
}

#[test]
fn over_height_system_gets_its_own_page() {
    let cfg = LayoutConfig::default();
    let pages = paginate(paired(&[100.0, 900.0, 100.0, 100.0]), &cfg);
    assert_eq!(indices(&pages), vec![vec![0], vec![1], vec![2, 3]]);
}

#[test]
fn over_height_first_system_does_not_leave_an_empty_page() {
    let cfg = LayoutConfig::default();
    let pages = paginate(paired(&[900.0, 100.0]), &cfg);
    assert_eq!(indices(&pages), vec![vec![0], vec![1]]);
    assert!(pages.iter().all(|p| !p.is_empty()));
}

#[test]
fn random_heights_respect_capacity() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let cfg = LayoutConfig::default();
    for _ in 0..50 {
        let n = rng.gen_range(1..40);
        let heights: Vec<f64> = (0..n).map(|_| rng.gen_range(40.0..500.0)).collect();
        let pages = paginate(paired(&heights), &cfg);

        let flat: Vec<usize> = pages.iter().flat_map(|p| p.system_indices()).collect();
        assert_eq!(flat, (0..n).collect::<Vec<_>>());

        for (i, page) in pages.iter().enumerate() {
            let h = required_height(&page.systems, &cfg);
            assert!(
                page.len() == 1 || h <= cfg.page_height,
                "page {} holds {} systems at {}pt",
                i,
                page.len(),
                h
            );
            if let Some(next) = pages.get(i + 1) {
                let grown = required_height(
                    page.systems.iter().chain(std::iter::once(&next.systems[0])),
                    &cfg,
                );
                assert!(grown > cfg.page_height, "page {} could have taken one more", i);
            }
        }
    }
}
