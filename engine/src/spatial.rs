use atlas_shared::AnnotationId;

use crate::config::COLLISION_CELL_PX;
use crate::viewport::ScreenSize;

/// A candidate point label in screen space. `(screen_x, screen_y)` is its top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub annotation_id: AnnotationId,
    pub screen_x: f64,
    pub screen_y: f64,
    pub width: f64,
    pub height: f64,
    pub priority_score: u32,
}

impl LabelBox {
    pub fn overlaps(&self, other: &LabelBox) -> bool {
        !(self.screen_x >= other.screen_x + other.width
            || self.screen_x + self.width <= other.screen_x
            || self.screen_y >= other.screen_y + other.height
            || self.screen_y + self.height <= other.screen_y)
    }

    fn outside(&self, view: ScreenSize) -> bool {
        self.screen_x > view.width
            || self.screen_y > view.height
            || self.screen_x + self.width < 0.0
            || self.screen_y + self.height < 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Surviving labels, in candidate order.
    pub visible: Vec<AnnotationId>,
    pub hidden: Vec<AnnotationId>,
}

/// Uniform bins over the viewport, each holding indices of kept candidates.
struct CollisionGrid {
    cells: Vec<Vec<usize>>,
    cols: usize,
    rows: usize,
    view: ScreenSize,
}

#[derive(Clone, Copy)]
struct CellRange {
    col_start: usize,
    col_end: usize,
    row_start: usize,
    row_end: usize,
}

impl CollisionGrid {
    fn new(view: ScreenSize) -> Self {
        let cols = (view.width.max(0.0) / COLLISION_CELL_PX).ceil() as usize + 2;
        let rows = (view.height.max(0.0) / COLLISION_CELL_PX).ceil() as usize + 2;
        Self {
            cells: vec![Vec::new(); cols * rows],
            cols,
            rows,
            view,
        }
    }

    fn range(&self, r: &LabelBox) -> CellRange {
        let cell = |v: f64, limit: usize| ((v / COLLISION_CELL_PX).floor().max(0.0) as usize).min(limit - 1);
        CellRange {
            col_start: cell(r.screen_x.max(0.0), self.cols),
            col_end: cell((r.screen_x + r.width).min(self.view.width), self.cols),
            row_start: cell(r.screen_y.max(0.0), self.rows),
            row_end: cell((r.screen_y + r.height).min(self.view.height), self.rows),
        }
    }

    fn cells_in(&self, range: CellRange) -> impl Iterator<Item = usize> + '_ {
        (range.row_start..=range.row_end).flat_map(move |row| {
            (range.col_start..=range.col_end).map(move |col| row * self.cols + col)
        })
    }
}

/// Greedy priority-based mutual exclusion over `candidates`, in order.
///
/// A candidate loses to any kept overlapping box with an equal or higher
/// score. If every overlapping kept box scores lower, those boxes are
/// evicted and the candidate is kept. Boxes entirely off-screen are hidden.
pub fn resolve(view: ScreenSize, candidates: &[LabelBox]) -> Resolution {
    let mut grid = CollisionGrid::new(view);
    let mut kept = vec![false; candidates.len()];
    let mut ranges: Vec<Option<CellRange>> = vec![None; candidates.len()];
    let mut overlapping = Vec::new();

    for (idx, r) in candidates.iter().enumerate() {
        if r.outside(view) {
            continue;
        }
        let range = grid.range(r);

        overlapping.clear();
        let mut beaten = false;
        'scan: for cell in grid.cells_in(range) {
            for &other in &grid.cells[cell] {
                if !r.overlaps(&candidates[other]) || overlapping.contains(&other) {
                    continue;
                }
                if candidates[other].priority_score >= r.priority_score {
                    beaten = true;
                    break 'scan;
                }
                overlapping.push(other);
            }
        }
        if beaten {
            continue;
        }

        for &evicted in &overlapping {
            kept[evicted] = false;
            if let Some(old) = ranges[evicted].take() {
                let cells: Vec<usize> = grid.cells_in(old).collect();
                for cell in cells {
                    grid.cells[cell].retain(|&i| i != evicted);
                }
            }
        }

        let cells: Vec<usize> = grid.cells_in(range).collect();
        for cell in cells {
            grid.cells[cell].push(idx);
        }
        kept[idx] = true;
        ranges[idx] = Some(range);
    }

    let mut out = Resolution::default();
    for (r, keep) in candidates.iter().zip(kept) {
        if keep {
            out.visible.push(r.annotation_id);
        } else {
            out.hidden.push(r.annotation_id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    const VIEW: ScreenSize = ScreenSize::new(800.0, 600.0);

    fn label(id: u32, x: f64, y: f64, w: f64, h: f64, score: u32) -> LabelBox {
        LabelBox {
            annotation_id: AnnotationId(id),
            screen_x: x,
            screen_y: y,
            width: w,
            height: h,
            priority_score: score,
        }
    }

    #[test]
    fn equal_priority_keeps_first() {
        let out = resolve(
            VIEW,
            &[
                label(0, 100.0, 100.0, 40.0, 20.0, 3),
                label(1, 105.0, 102.0, 40.0, 20.0, 3),
            ],
        );
        assert_eq!(out.visible, vec![AnnotationId(0)]);
        assert_eq!(out.hidden, vec![AnnotationId(1)]);
    }

    #[test]
    fn higher_priority_evicts_earlier_box() {
        let out = resolve(
            VIEW,
            &[
                label(0, 100.0, 100.0, 40.0, 20.0, 2),
                label(1, 105.0, 102.0, 40.0, 20.0, 3),
            ],
        );
        assert_eq!(out.visible, vec![AnnotationId(1)]);
        assert_eq!(out.hidden, vec![AnnotationId(0)]);
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let out = resolve(
            VIEW,
            &[
                label(0, 0.0, 0.0, 50.0, 20.0, 1),
                label(1, 50.0, 0.0, 50.0, 20.0, 1),
            ],
        );
        assert_eq!(out.visible.len(), 2);
    }

    #[test]
    fn offscreen_boxes_are_hidden() {
        let out = resolve(
            VIEW,
            &[
                label(0, 900.0, 10.0, 40.0, 20.0, 3),
                label(1, -60.0, 10.0, 40.0, 20.0, 3),
                label(2, -20.0, -10.0, 40.0, 20.0, 3),
            ],
        );
        assert_eq!(out.visible, vec![AnnotationId(2)]);
        assert_eq!(out.hidden, vec![AnnotationId(0), AnnotationId(1)]);
    }

    #[test]
    fn eviction_clears_every_cell_of_the_evicted_box() {
        // A wide low box spans many cells. After a higher box evicts it, a
        // third box touching only its far end must not collide with a ghost.
        let out = resolve(
            VIEW,
            &[
                label(0, 0.0, 0.0, 300.0, 20.0, 1),
                label(1, 0.0, 0.0, 30.0, 20.0, 5),
                label(2, 250.0, 0.0, 30.0, 20.0, 1),
            ],
        );
        assert_eq!(out.visible, vec![AnnotationId(1), AnnotationId(2)]);
    }

    #[test]
    fn candidate_beaten_anywhere_evicts_nothing() {
        let out = resolve(
            VIEW,
            &[
                label(0, 0.0, 0.0, 30.0, 20.0, 1),
                label(1, 200.0, 0.0, 30.0, 20.0, 9),
                label(2, 0.0, 0.0, 230.0, 20.0, 5),
            ],
        );
        assert_eq!(out.visible, vec![AnnotationId(0), AnnotationId(1)]);
    }

    #[test]
    fn match_bonus_beats_any_category() {
        let town = 3;
        let matched_portal = 2 + crate::config::MATCH_BONUS;
        let out = resolve(
            VIEW,
            &[
                label(0, 100.0, 100.0, 60.0, 24.0, town),
                label(1, 110.0, 105.0, 60.0, 14.0, matched_portal),
            ],
        );
        assert_eq!(out.visible, vec![AnnotationId(1)]);
    }

    #[test]
    fn random_sets_never_keep_overlapping_boxes() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let n = rng.gen_range(1..80);
            let candidates: Vec<LabelBox> = (0..n)
                .map(|i| {
                    label(
                        i,
                        rng.gen_range(-100.0..850.0),
                        rng.gen_range(-50.0..650.0),
                        rng.gen_range(1.0..160.0),
                        rng.gen_range(1.0..40.0),
                        rng.gen_range(1..5) + if rng.gen_bool(0.1) { 100 } else { 0 },
                    )
                })
                .collect();
            let out = resolve(VIEW, &candidates);
            assert_eq!(out.visible.len() + out.hidden.len(), candidates.len());

            let kept: Vec<&LabelBox> = candidates
                .iter()
                .filter(|c| out.visible.contains(&c.annotation_id))
                .collect();
            for (i, a) in kept.iter().enumerate() {
                assert!(!a.outside(VIEW));
                for b in &kept[i + 1..] {
                    assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn matched_box_survives_against_any_unmatched_overlap() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let matched = label(0, 300.0, 300.0, 80.0, 20.0, 2 + crate::config::MATCH_BONUS);
            let mut candidates: Vec<LabelBox> = (1..30)
                .map(|i| {
                    label(
                        i,
                        rng.gen_range(250.0..380.0),
                        rng.gen_range(280.0..320.0),
                        rng.gen_range(10.0..120.0),
                        rng.gen_range(5.0..30.0),
                        rng.gen_range(1..4),
                    )
                })
                .collect();
            let at = rng.gen_range(0..candidates.len());
            candidates.insert(at, matched);
            let out = resolve(VIEW, &candidates);
            assert!(out.visible.contains(&AnnotationId(0)));
        }
    }
}
