use std::sync::Arc;

use image::RgbaImage;

use crate::project::ClipMetadata;

use super::TimelineItem;

/// Fixed left margin before the first timeline item.
pub const ITEMS_ROFFSET: f32 = 2.0;

/// Axis-aligned rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The ordered, position-based model of the timeline.
///
/// Items are totally ordered by x position; that order is the
/// authoritative clip sequence for concatenation. Outside of a drag the
/// scene keeps items left-packed from [`ITEMS_ROFFSET`] with no overlap.
#[derive(Debug, Default)]
pub struct TimelineScene {
    items: Vec<TimelineItem>,
    next_id: u32,
}

impl TimelineScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items sorted by their x position, leftmost first.
    pub fn items(&self) -> Vec<&TimelineItem> {
        let mut items: Vec<&TimelineItem> = self.items.iter().collect();
        items.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.id.cmp(&b.id)));
        items
    }

    pub fn item(&self, id: u32) -> Option<&TimelineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Place a new item directly after the rightmost one.
    pub fn append(&mut self, clip: Arc<ClipMetadata>, image: RgbaImage, track_height: u32) -> u32 {
        let x = self.last_end_x();
        let id = self.next_id;
        self.next_id += 1;

        let mut item = TimelineItem::new(id, clip, image);
        item.x = x;
        item.center_vertically(track_height);
        self.items.push(item);
        id
    }

    /// Free movement during a drag; x clamps at zero.
    pub fn set_position(&mut self, id: u32, x: f32) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.x = x.max(0.0);
        }
    }

    /// Settle a dropped item: the dragged item lands before the first other
    /// item whose left edge is at or past the drop x (an item sitting
    /// exactly on the drop x ends up after it), all other items keep their
    /// relative order, and everything re-packs from [`ITEMS_ROFFSET`] with
    /// no gaps.
    pub fn reorder_on_drop(&mut self, id: u32, drop_x: f32) {
        if !self.items.iter().any(|i| i.id == id) {
            return;
        }
        let drop_x = drop_x.max(0.0);

        let mut order: Vec<u32> = self
            .items()
            .iter()
            .filter(|i| i.id != id)
            .map(|i| i.id)
            .collect();
        let insert_at = order
            .iter()
            .filter(|&&oid| self.item(oid).map(|i| i.x < drop_x).unwrap_or(false))
            .count();
        order.insert(insert_at, id);

        self.pack(&order);
    }

    /// Remove an item, leaving the gap it occupied.
    pub fn remove(&mut self, id: u32) -> Option<TimelineItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }

    /// Shift all items to the left in their current order, removing any
    /// gaps between them.
    pub fn remove_gaps(&mut self) {
        let order: Vec<u32> = self.items().iter().map(|i| i.id).collect();
        self.pack(&order);
    }

    /// Drain every item, returned in x order. Used by the zoom relayout.
    pub fn clear(&mut self) -> Vec<TimelineItem> {
        let mut items = std::mem::take(&mut self.items);
        items.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.id.cmp(&b.id)));
        items
    }

    /// The clip sequence in x order — the input list for concatenation.
    pub fn clip_sequence(&self) -> Vec<Arc<ClipMetadata>> {
        self.items().iter().map(|i| i.clip.clone()).collect()
    }

    /// Union bounding box of all items, or the given minimum size when the
    /// timeline is empty.
    pub fn bounding_rect(&self, min_width: f32, min_height: f32) -> SceneRect {
        if self.items.is_empty() {
            return SceneRect {
                x: 0.0,
                y: 0.0,
                width: min_width,
                height: min_height,
            };
        }

        let mut left = f32::MAX;
        let mut top = f32::MAX;
        let mut right = f32::MIN;
        let mut bottom = f32::MIN;
        for item in &self.items {
            left = left.min(item.x);
            top = top.min(item.y);
            right = right.max(item.x + item.width());
            bottom = bottom.max(item.y + item.height());
        }

        SceneRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    fn last_end_x(&self) -> f32 {
        self.items()
            .last()
            .map(|i| i.x + i.width())
            .unwrap_or(ITEMS_ROFFSET)
    }

    /// Left-pack items in the given id order, starting at the margin.
    fn pack(&mut self, order: &[u32]) {
        let mut pos = ITEMS_ROFFSET;
        for &id in order {
            if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
                item.x = pos;
                pos += item.width();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::MediaInfo;
    use std::path::Path;

    fn clip(name: &str) -> Arc<ClipMetadata> {
        let info = MediaInfo {
            duration: 10.0,
            width: 640,
            height: 480,
            ..Default::default()
        };
        Arc::new(ClipMetadata::new(
            Path::new(name),
            &info,
            40,
            Path::new("snaps").join(name),
        ))
    }

    fn scene_with_widths(widths: &[u32]) -> (TimelineScene, Vec<u32>) {
        let mut scene = TimelineScene::new();
        let ids = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                scene.append(
                    clip(&format!("clip{}.mp4", i)),
                    RgbaImage::new(w, 40),
                    40,
                )
            })
            .collect();
        (scene, ids)
    }

    fn assert_packed(scene: &TimelineScene) {
        let items = scene.items();
        let mut pos = ITEMS_ROFFSET;
        for item in items {
            assert_eq!(item.x(), pos);
            pos += item.width();
        }
    }

    #[test]
    fn test_append_left_packs_from_margin() {
        let (scene, _) = scene_with_widths(&[100, 50, 75]);
        let items = scene.items();
        assert_eq!(items[0].x(), ITEMS_ROFFSET);
        // Strictly increasing x with no overlap
        for pair in items.windows(2) {
            assert!(pair[1].x() >= pair[0].x() + pair[0].width());
        }
        assert_packed(&scene);
    }

    #[test]
    fn test_append_then_delete_round_trip() {
        let (mut scene, ids) = scene_with_widths(&[100, 50]);
        scene.remove(ids[0]);
        scene.remove_gaps();

        let items = scene.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ids[1]);
        assert_eq!(items[0].x(), ITEMS_ROFFSET);
    }

    #[test]
    fn test_delete_closes_gap_preserving_order() {
        let (mut scene, ids) = scene_with_widths(&[100, 50, 75, 30]);
        scene.remove(ids[1]);
        scene.remove_gaps();

        let order: Vec<u32> = scene.items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3]]);
        assert_packed(&scene);
    }

    #[test]
    fn test_delete_without_gap_close_leaves_gap() {
        let (mut scene, ids) = scene_with_widths(&[100, 50, 75]);
        let removed = scene.remove(ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);

        // Third item still sits where it was
        assert_eq!(
            scene.item(ids[2]).unwrap().x(),
            ITEMS_ROFFSET + 100.0 + 50.0
        );
    }

    #[test]
    fn test_drop_moves_item_to_front() {
        let (mut scene, ids) = scene_with_widths(&[100, 50, 75]);
        // Drag the last item to the far left
        scene.set_position(ids[2], 0.0);
        scene.reorder_on_drop(ids[2], 0.0);

        let order: Vec<u32> = scene.items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![ids[2], ids[0], ids[1]]);
        assert_packed(&scene);
    }

    #[test]
    fn test_drop_moves_item_to_back() {
        let (mut scene, ids) = scene_with_widths(&[100, 50, 75]);
        scene.set_position(ids[0], 400.0);
        scene.reorder_on_drop(ids[0], 400.0);

        let order: Vec<u32> = scene.items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
        assert_packed(&scene);
    }

    #[test]
    fn test_drop_between_neighbors() {
        let (mut scene, ids) = scene_with_widths(&[100, 50, 75]);
        // Drop the first item just past the second item's left edge
        let target_x = scene.item(ids[1]).unwrap().x() + 10.0;
        scene.reorder_on_drop(ids[0], target_x);

        let order: Vec<u32> = scene.items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![ids[1], ids[0], ids[2]]);
        assert_packed(&scene);
    }

    #[test]
    fn test_drop_at_negative_x_clamps_to_zero() {
        let (mut scene, ids) = scene_with_widths(&[100, 50]);
        scene.set_position(ids[1], -25.0);
        assert_eq!(scene.item(ids[1]).unwrap().x(), 0.0);

        scene.reorder_on_drop(ids[1], -25.0);
        let order: Vec<u32> = scene.items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![ids[1], ids[0]]);
        assert_packed(&scene);
    }

    #[test]
    fn test_drop_on_exact_left_edge_lands_before_that_item() {
        let (mut scene, ids) = scene_with_widths(&[100, 50, 75]);
        let second_left = scene.item(ids[1]).unwrap().x();
        scene.reorder_on_drop(ids[2], second_left);

        let order: Vec<u32> = scene.items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[1]]);
        assert_packed(&scene);
    }

    #[test]
    fn test_bounding_rect_unions_items() {
        let (scene, _) = scene_with_widths(&[100, 50]);
        let rect = scene.bounding_rect(800.0, 40.0);
        assert_eq!(rect.x, ITEMS_ROFFSET);
        assert_eq!(rect.width, 150.0);
        assert_eq!(rect.height, 40.0);
    }

    #[test]
    fn test_bounding_rect_empty_uses_minimum() {
        let scene = TimelineScene::new();
        let rect = scene.bounding_rect(800.0, 40.0);
        assert_eq!(
            rect,
            SceneRect {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn test_clip_sequence_follows_x_order() {
        let (mut scene, ids) = scene_with_widths(&[100, 50]);
        scene.reorder_on_drop(ids[1], 0.0);

        let sequence = scene.clip_sequence();
        assert_eq!(sequence[0].path, Path::new("clip1.mp4"));
        assert_eq!(sequence[1].path, Path::new("clip0.mp4"));
    }
}
