// THEORY:
// The `region_detector` is the spatial grouping step of the tracker. It takes the binary
// `DifferenceMask` of a single cycle and answers one question: where is the biggest
// outer shape of change?
//
// Algorithm:
// 1.  **Outside flood**: unchanged pixels are flooded 4-connected from the frame border.
//     Whatever the flood cannot reach is enclosed: a hole inside a changed outline, or
//     something sitting in such a hole.
// 2.  **Filling**: every pixel that is not outside belongs to some outer shape. Hollow
//     outlines (the typical difference of a moving object) become solid, and anything
//     nested in a hole merges into the outline around it.
// 3.  **Raster scan for seeds**: the filled grid is visited row by row. The first filled,
//     unvisited pixel seeds a new region. It is always a pixel of the outer boundary.
// 4.  **Region growing**: from the seed, an explicit stack expands through all 8
//     neighbours (diagonal contact joins two areas). A `visited` grid guarantees every
//     pixel is claimed by at most one region.
// 5.  **Aggregation**: the grown region is summarized as its enclosed area and its
//     axis-aligned bounding box, packaged into a `Region`.
// 6.  **Selection**: the largest region by area wins. Ties go to the region that was
//     seeded first in scan order, which is stable but carries no spatial meaning.
//
// Like the mask itself, the detector is stateless: no memory of previous cycles.

use crate::core_modules::difference_mask::DifferenceMask;

/// The axis-aligned bounding box of one contiguous area of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Pixels enclosed by the outer boundary, holes included (not the box).
    pub area: usize,
}

impl Region {
    /// The center of the bounding box, in pixels.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

pub mod region_detector {
    use super::*;

    /// Finds every outer shape of change, in seed (raster scan) order. Shapes nested
    /// inside the hole of another shape are part of that shape, not regions of their own.
    pub fn find_regions(mask: &DifferenceMask) -> Vec<Region> {
        let width = mask.width() as usize;
        let height = mask.height() as usize;
        let filled = fill_enclosed(mask);
        let mut visited = vec![false; width * height];
        let mut regions = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let index = y * width + x;
                if visited[index] || !filled[index] {
                    continue;
                }
                regions.push(grow_region(&filled, width, height, &mut visited, x, y));
            }
        }

        regions
    }

    /// The largest region at least `min_area` pixels large. Non-degenerate regions only.
    pub fn largest_region(mask: &DifferenceMask, min_area: Option<usize>) -> Option<Region> {
        let min_area = min_area.unwrap_or(0);
        find_regions(mask)
            .into_iter()
            .filter(|r| r.area >= min_area && !r.is_degenerate())
            .fold(None, |best: Option<Region>, r| match best {
                Some(b) if b.area >= r.area => Some(b),
                _ => Some(r),
            })
    }

    /// Marks every pixel that is changed or cut off from the frame border by changed
    /// pixels. The border flood is 4-connected, the complement of 8-connected shapes.
    fn fill_enclosed(mask: &DifferenceMask) -> Vec<bool> {
        let width = mask.width() as usize;
        let height = mask.height() as usize;
        let mut outside = vec![false; width * height];
        if outside.is_empty() {
            return outside;
        }
        let mut stack = Vec::new();

        let seed = |x: usize, y: usize, outside: &mut [bool], stack: &mut Vec<(usize, usize)>| {
            let index = y * width + x;
            if !outside[index] && !mask.is_changed(x as u32, y as u32) {
                outside[index] = true;
                stack.push((x, y));
            }
        };

        for x in 0..width {
            seed(x, 0, &mut outside, &mut stack);
            seed(x, height - 1, &mut outside, &mut stack);
        }
        for y in 0..height {
            seed(0, y, &mut outside, &mut stack);
            seed(width - 1, y, &mut outside, &mut stack);
        }

        while let Some((cx, cy)) = stack.pop() {
            if cx > 0 {
                seed(cx - 1, cy, &mut outside, &mut stack);
            }
            if cx + 1 < width {
                seed(cx + 1, cy, &mut outside, &mut stack);
            }
            if cy > 0 {
                seed(cx, cy - 1, &mut outside, &mut stack);
            }
            if cy + 1 < height {
                seed(cx, cy + 1, &mut outside, &mut stack);
            }
        }

        outside.into_iter().map(|o| !o).collect()
    }

    /// Depth-first flood fill from a seed pixel over the filled grid.
    fn grow_region(
        filled: &[bool],
        width: usize,
        height: usize,
        visited: &mut [bool],
        seed_x: usize,
        seed_y: usize,
    ) -> Region {
        let (width_i64, height_i64) = (width as i64, height as i64);

        let mut stack = vec![(seed_x, seed_y)];
        visited[seed_y * width + seed_x] = true;

        let mut min_x = seed_x;
        let mut min_y = seed_y;
        let mut max_x = seed_x;
        let mut max_y = seed_y;
        let mut area = 0usize;

        while let Some((cx, cy)) = stack.pop() {
            area += 1;
            min_x = min_x.min(cx);
            min_y = min_y.min(cy);
            max_x = max_x.max(cx);
            max_y = max_y.max(cy);

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = cx as i64 + dx;
                    let ny = cy as i64 + dy;
                    if nx < 0 || nx >= width_i64 || ny < 0 || ny >= height_i64 {
                        continue;
                    }
                    let index = ny as usize * width + nx as usize;
                    if !visited[index] && filled[index] {
                        visited[index] = true;
                        stack.push((nx as usize, ny as usize));
                    }
                }
            }
        }

        Region {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
            area,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::region_detector::*;
    use super::*;
    use image::{GrayImage, Luma};

    fn draw(diff: &mut GrayImage, rects: &[(u32, u32, u32, u32)]) {
        for &(x, y, w, h) in rects {
            for py in y..y + h {
                for px in x..x + w {
                    diff.put_pixel(px, py, Luma([255]));
                }
            }
        }
    }

    fn mask_from(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> DifferenceMask {
        let mut diff = GrayImage::from_pixel(width, height, Luma([0]));
        draw(&mut diff, rects);
        DifferenceMask::threshold(&diff, 1)
    }

    /// One-pixel outline of the box at (x, y) with size w x h.
    fn outline(x: u32, y: u32, w: u32, h: u32) -> [(u32, u32, u32, u32); 4] {
        [(x, y, w, 1), (x, y + h - 1, w, 1), (x, y, 1, h), (x + w - 1, y, 1, h)]
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let mask = mask_from(10, 10, &[]);
        assert!(find_regions(&mask).is_empty());
        assert_eq!(largest_region(&mask, None), None);
    }

    #[test]
    fn rectangle_becomes_its_own_bounding_box() {
        let mask = mask_from(20, 20, &[(3, 4, 5, 6)]);
        let regions = find_regions(&mask);
        assert_eq!(
            regions,
            vec![Region { x: 3, y: 4, width: 5, height: 6, area: 30 }]
        );
        assert_eq!(regions[0].center(), (5.5, 7.0));
    }

    #[test]
    fn diagonal_contact_joins_areas() {
        let mask = mask_from(10, 10, &[(1, 1, 2, 2), (3, 3, 2, 2)]);
        let regions = find_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 8);
        assert_eq!((regions[0].width, regions[0].height), (4, 4));
    }

    #[test]
    fn largest_wins_over_union() {
        let mask = mask_from(40, 20, &[(1, 1, 3, 3), (20, 5, 8, 8)]);
        let best = largest_region(&mask, None).unwrap();
        assert_eq!(best, Region { x: 20, y: 5, width: 8, height: 8, area: 64 });
    }

    #[test]
    fn ties_keep_the_first_in_scan_order() {
        let mask = mask_from(30, 30, &[(20, 2, 3, 3), (2, 10, 3, 3)]);
        let best = largest_region(&mask, None).unwrap();
        assert_eq!((best.x, best.y), (20, 2));
    }

    #[test]
    fn min_area_filters_small_regions() {
        let mask = mask_from(30, 30, &[(1, 1, 3, 3), (10, 10, 5, 5)]);
        assert_eq!(largest_region(&mask, Some(100)), None);
        let best = largest_region(&mask, Some(10)).unwrap();
        assert_eq!(best.area, 25);
    }

    #[test]
    fn blob_inside_a_ring_belongs_to_the_ring() {
        let mut rects = outline(10, 10, 180, 180).to_vec();
        rects.push((70, 70, 60, 60));
        let mask = mask_from(200, 200, &rects);

        let regions = find_regions(&mask);
        assert_eq!(
            regions,
            vec![Region { x: 10, y: 10, width: 180, height: 180, area: 180 * 180 }]
        );
    }

    #[test]
    fn hollow_outline_outranks_a_denser_blob() {
        // 76 changed pixels enclosing 400, against a solid 100.
        let mut rects = outline(2, 2, 20, 20).to_vec();
        rects.push((40, 5, 10, 10));
        let mask = mask_from(60, 30, &rects);

        let best = largest_region(&mask, None).unwrap();
        assert_eq!(best, Region { x: 2, y: 2, width: 20, height: 20, area: 400 });
    }

    #[test]
    fn open_outline_does_not_enclose() {
        // A gap in the ring lets the outside flood in; the inner blob stands alone.
        let mut diff = GrayImage::from_pixel(40, 40, Luma([0]));
        draw(&mut diff, &outline(5, 5, 30, 30));
        draw(&mut diff, &[(15, 15, 6, 6)]);
        diff.put_pixel(20, 5, Luma([0]));
        let mask = DifferenceMask::threshold(&diff, 1);

        let regions = find_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1], Region { x: 15, y: 15, width: 6, height: 6, area: 36 });
    }

    #[test]
    fn shape_touching_the_border_still_fills() {
        // Outline whose left side lies on the frame edge.
        let mask = mask_from(20, 20, &outline(0, 3, 10, 10));
        let regions = find_regions(&mask);
        assert_eq!(regions, vec![Region { x: 0, y: 3, width: 10, height: 10, area: 100 }]);
    }
}
