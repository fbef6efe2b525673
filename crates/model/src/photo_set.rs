//! Ordered, index-stable photo slots for one layout.

use serde::{Deserialize, Serialize};

use crate::captured::CapturedImage;
use crate::layout::Layout;

/// One position in a photo set.
///
/// Slots that have not been captured yet hold [`Slot::Empty`] so that later
/// captures land in the correct grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "image")]
pub enum Slot {
    #[default]
    Empty,
    Photo(CapturedImage),
}

impl Slot {
    pub fn photo(&self) -> Option<&CapturedImage> {
        match self {
            Slot::Photo(image) => Some(image),
            Slot::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// Error returned when a slot index falls outside the layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("slot {index} is outside a {layout} layout ({capacity} slots)")]
pub struct SlotOutOfRange {
    pub index: usize,
    pub capacity: usize,
    pub layout: Layout,
}

/// Captured photos for the currently selected layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSet {
    layout: Layout,
    slots: Vec<Slot>,
}

impl PhotoSet {
    /// An empty set (no slots at all) for `layout`.
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            slots: Vec::with_capacity(layout.count()),
        }
    }

    /// A set holding `layout.count()` empty slots, ready for a multi-capture.
    pub fn with_empty_slots(layout: Layout) -> Self {
        Self {
            layout,
            slots: vec![Slot::Empty; layout.count()],
        }
    }

    /// Layout this set belongs to.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.layout.count()
    }

    /// Number of slots, empty markers included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the set has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a photo.
    pub fn photo_count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    pub fn has_photos(&self) -> bool {
        self.photo_count() > 0
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Photos with their slot index, in slot order.
    pub fn photos(&self) -> impl Iterator<Item = (usize, &CapturedImage)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.photo().map(|image| (index, image)))
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Put `image` into slot `index`, overwriting whatever is there.
    ///
    /// Missing slots before `index` are filled with empty markers.
    pub fn place(&mut self, index: usize, image: CapturedImage) -> Result<(), SlotOutOfRange> {
        if index >= self.capacity() {
            return Err(SlotOutOfRange {
                index,
                capacity: self.capacity(),
                layout: self.layout,
            });
        }
        if index >= self.slots.len() {
            self.slots.resize(index + 1, Slot::Empty);
        }
        self.slots[index] = Slot::Photo(image);
        Ok(())
    }

    /// Add a one-off capture and return the slot it landed in.
    ///
    /// Fills the first empty slot, otherwise appends. A full set drops its
    /// oldest photo so the newest capture is always kept.
    pub fn push(&mut self, image: CapturedImage) -> usize {
        if let Some(index) = self.slots.iter().position(Slot::is_empty) {
            self.slots[index] = Slot::Photo(image);
            return index;
        }
        if self.slots.len() >= self.capacity() {
            self.slots.remove(0);
        }
        self.slots.push(Slot::Photo(image));
        self.slots.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn image(tag: u32) -> CapturedImage {
        CapturedImage {
            width: tag,
            height: 1,
            data_url: format!("data:image/png;base64,{tag}"),
        }
    }

    #[test]
    fn new_set_is_empty() {
        let set = PhotoSet::new(Layout::Grid);
        assert!(set.is_empty());
        assert_eq!(set.capacity(), 4);
    }

    #[test]
    fn multi_capture_set_starts_with_markers() {
        let set = PhotoSet::with_empty_slots(Layout::Row);
        assert_eq!(set.len(), 3);
        assert_eq!(set.photo_count(), 0);
        assert!(set.slots().iter().all(Slot::is_empty));
    }

    #[test]
    fn place_overwrites_by_index() {
        let mut set = PhotoSet::with_empty_slots(Layout::Row);
        set.place(1, image(1)).unwrap();
        set.place(1, image(2)).unwrap();
        assert_eq!(set.get(1).and_then(Slot::photo), Some(&image(2)));
        assert!(set.get(0).unwrap().is_empty());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn place_pads_missing_slots() {
        let mut set = PhotoSet::new(Layout::Grid);
        set.place(2, image(7)).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.get(0).unwrap().is_empty());
        assert!(set.get(1).unwrap().is_empty());
    }

    #[test]
    fn place_rejects_out_of_layout_index() {
        let mut set = PhotoSet::new(Layout::Single);
        let err = set.place(1, image(1)).unwrap_err();
        assert_eq!(err.capacity, 1);
    }

    #[test]
    fn push_fills_first_gap() {
        let mut set = PhotoSet::with_empty_slots(Layout::Row);
        set.place(0, image(1)).unwrap();
        assert_eq!(set.push(image(2)), 1);
    }

    #[test]
    fn push_into_full_set_drops_oldest() {
        let mut set = PhotoSet::new(Layout::Row);
        for tag in 1..=4 {
            set.push(image(tag));
        }
        let tags: Vec<u32> = set.photos().map(|(_, img)| img.width).collect();
        assert_eq!(tags, vec![2, 3, 4]);
    }

    #[test]
    fn photos_reports_slot_indices() {
        let mut set = PhotoSet::with_empty_slots(Layout::Grid);
        set.place(3, image(9)).unwrap();
        let indices: Vec<usize> = set.photos().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![3]);
    }

    proptest! {
        #[test]
        fn length_never_exceeds_layout_count(
            layout_idx in 0usize..4,
            pushes in 0usize..12,
        ) {
            let layout = Layout::ALL[layout_idx];
            let mut set = PhotoSet::new(layout);
            for tag in 0..pushes {
                set.push(image(tag as u32));
            }
            prop_assert!(set.len() <= layout.count());
            prop_assert_eq!(set.photo_count(), pushes.min(layout.count()));
        }
    }
}
