//! Host-side section layout with hiding and reordering.
//!
//! [`SectionAxis`] keeps the logical/visual ordering and hidden state of one
//! axis of a grid, the same bookkeeping a header view does for its sections.
//! Positions are assigned to visible sections only, in visual order, so
//! hiding or moving a section shifts the positions of the ones after it
//! while their indexes stay put.
//!
//! [`SectionGrid`] pairs a column axis with a row axis and implements
//! [`PositionLayer`], making it a ready-made host for a group model.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_lattice_groups::{GroupModel, Orientation, SectionGrid};
//!
//! let grid = Arc::new(SectionGrid::new(10, 0));
//! let mut model = GroupModel::new();
//! model.set_position_layer(grid.clone(), Arc::new(Orientation::Horizontal));
//!
//! let id = model.add_group("Address", 2, 3);
//! grid.columns_mut().hide_section(2);
//! model.update_visible_start_positions();
//!
//! let group = model.group(id).unwrap();
//! assert_eq!(group.visible_start_index(), Some(3));
//! assert_eq!(group.visible_start_position(), Some(2));
//! ```

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::converter::PositionLayer;
use crate::logging::targets;

/// Hidden state and visual ordering of the sections on one grid axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionAxis {
    /// Number of sections.
    section_count: usize,

    /// Which sections are hidden.
    section_hidden: Vec<bool>,

    /// Maps logical index to visual index.
    section_visual_indices: Vec<usize>,

    /// Maps visual index to logical index.
    section_logical_indices: Vec<usize>,

    /// Maps logical index to position, `None` for hidden sections.
    section_positions: Vec<Option<usize>>,

    /// Maps position to logical index.
    visible_sections: Vec<usize>,
}

impl SectionAxis {
    /// Creates an axis with `count` visible sections in logical order.
    pub fn new(count: usize) -> Self {
        let mut axis = Self::default();
        axis.set_section_count(count);
        axis
    }

    // =========================================================================
    // Section Count
    // =========================================================================

    /// Returns the number of sections.
    pub fn section_count(&self) -> usize {
        self.section_count
    }

    /// Sets the number of sections.
    ///
    /// Resets the visual order to the logical order. Hidden state of the
    /// sections that remain is kept.
    pub fn set_section_count(&mut self, count: usize) {
        if count == self.section_count {
            return;
        }

        self.section_count = count;
        self.section_hidden.resize(count, false);

        // Reset visual/logical mappings to identity
        self.section_visual_indices = (0..count).collect();
        self.section_logical_indices = (0..count).collect();

        self.update_section_positions();
    }

    // =========================================================================
    // Section Visibility
    // =========================================================================

    /// Returns whether a section is hidden.
    pub fn is_section_hidden(&self, logical_index: usize) -> bool {
        self.section_hidden
            .get(logical_index)
            .copied()
            .unwrap_or(false)
    }

    /// Sets whether a section is hidden.
    pub fn set_section_hidden(&mut self, logical_index: usize, hidden: bool) {
        if logical_index >= self.section_count {
            return;
        }

        if self.section_hidden[logical_index] != hidden {
            self.section_hidden[logical_index] = hidden;
            tracing::trace!(
                target: targets::AXIS,
                logical_index,
                hidden,
                "section visibility changed"
            );
            self.update_section_positions();
        }
    }

    /// Shows a hidden section.
    pub fn show_section(&mut self, logical_index: usize) {
        self.set_section_hidden(logical_index, false);
    }

    /// Hides a section.
    pub fn hide_section(&mut self, logical_index: usize) {
        self.set_section_hidden(logical_index, true);
    }

    /// Returns the number of hidden sections.
    pub fn hidden_section_count(&self) -> usize {
        self.section_hidden.iter().filter(|&&h| h).count()
    }

    /// Returns the number of visible sections, i.e. the number of positions.
    pub fn visible_count(&self) -> usize {
        self.visible_sections.len()
    }

    // =========================================================================
    // Section Ordering (Visual vs Logical)
    // =========================================================================

    /// Returns the visual index for a logical index.
    pub fn visual_index(&self, logical_index: usize) -> usize {
        self.section_visual_indices
            .get(logical_index)
            .copied()
            .unwrap_or(logical_index)
    }

    /// Returns the logical index for a visual index.
    pub fn logical_index(&self, visual_index: usize) -> usize {
        self.section_logical_indices
            .get(visual_index)
            .copied()
            .unwrap_or(visual_index)
    }

    /// Moves a section from one visual index to another.
    pub fn move_section(&mut self, from_visual: usize, to_visual: usize) {
        if from_visual >= self.section_count || to_visual >= self.section_count {
            return;
        }
        if from_visual == to_visual {
            return;
        }

        let logical = self.section_logical_indices.remove(from_visual);
        self.section_logical_indices.insert(to_visual, logical);

        // Rebuild visual indices
        for (visual, &log) in self.section_logical_indices.iter().enumerate() {
            self.section_visual_indices[log] = visual;
        }

        tracing::trace!(target: targets::AXIS, logical, from_visual, to_visual, "section moved");
        self.update_section_positions();
    }

    /// Swaps two sections by their logical indices.
    pub fn swap_sections(&mut self, first: usize, second: usize) {
        if first >= self.section_count || second >= self.section_count {
            return;
        }
        if first == second {
            return;
        }

        let first_visual = self.visual_index(first);
        let second_visual = self.visual_index(second);

        self.section_logical_indices[first_visual] = second;
        self.section_logical_indices[second_visual] = first;

        self.section_visual_indices[first] = second_visual;
        self.section_visual_indices[second] = first_visual;

        self.update_section_positions();
    }

    // =========================================================================
    // Position Translation
    // =========================================================================

    /// Returns the logical index of the section shown at `position`.
    pub fn index_by_position(&self, position: usize) -> Option<usize> {
        self.visible_sections.get(position).copied()
    }

    /// Returns the position of a section, `None` if it is hidden or unknown.
    pub fn position_by_index(&self, logical_index: usize) -> Option<usize> {
        self.section_positions.get(logical_index).copied().flatten()
    }

    fn update_section_positions(&mut self) {
        self.section_positions.clear();
        self.section_positions.resize(self.section_count, None);
        self.visible_sections.clear();

        for visual in 0..self.section_count {
            let logical = self.logical_index(visual);
            if !self.is_section_hidden(logical) {
                self.section_positions[logical] = Some(self.visible_sections.len());
                self.visible_sections.push(logical);
            }
        }
    }
}

/// A two-axis host grid usable as a [`PositionLayer`].
///
/// Each axis sits behind a lock so the host can keep hiding, showing and
/// moving sections after sharing the grid with a group model.
#[derive(Debug, Default)]
pub struct SectionGrid {
    columns: RwLock<SectionAxis>,
    rows: RwLock<SectionAxis>,
}

impl SectionGrid {
    /// Creates a grid with the given number of columns and rows.
    pub fn new(column_count: usize, row_count: usize) -> Self {
        Self {
            columns: RwLock::new(SectionAxis::new(column_count)),
            rows: RwLock::new(SectionAxis::new(row_count)),
        }
    }

    /// Returns read access to the column axis.
    pub fn columns(&self) -> RwLockReadGuard<'_, SectionAxis> {
        self.columns.read()
    }

    /// Returns write access to the column axis.
    pub fn columns_mut(&self) -> RwLockWriteGuard<'_, SectionAxis> {
        self.columns.write()
    }

    /// Returns read access to the row axis.
    pub fn rows(&self) -> RwLockReadGuard<'_, SectionAxis> {
        self.rows.read()
    }

    /// Returns write access to the row axis.
    pub fn rows_mut(&self) -> RwLockWriteGuard<'_, SectionAxis> {
        self.rows.write()
    }
}

impl PositionLayer for SectionGrid {
    fn column_index_by_position(&self, position: usize) -> Option<usize> {
        self.columns.read().index_by_position(position)
    }

    fn column_position_by_index(&self, index: usize) -> Option<usize> {
        self.columns.read().position_by_index(index)
    }

    fn row_index_by_position(&self, position: usize) -> Option<usize> {
        self.rows.read().index_by_position(position)
    }

    fn row_position_by_index(&self, index: usize) -> Option<usize> {
        self.rows.read().position_by_index(index)
    }
}

static_assertions::assert_impl_all!(SectionGrid: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_count() {
        let mut axis = SectionAxis::new(3);
        assert_eq!(axis.section_count(), 3);
        assert_eq!(axis.visible_count(), 3);

        axis.set_section_count(5);
        assert_eq!(axis.section_count(), 5);
        assert_eq!(axis.position_by_index(4), Some(4));
    }

    #[test]
    fn test_section_visibility() {
        let mut axis = SectionAxis::new(5);

        assert!(!axis.is_section_hidden(1));
        axis.hide_section(1);
        assert!(axis.is_section_hidden(1));
        assert_eq!(axis.hidden_section_count(), 1);
        assert_eq!(axis.visible_count(), 4);

        assert_eq!(axis.position_by_index(1), None);
        assert_eq!(axis.position_by_index(2), Some(1));
        assert_eq!(axis.index_by_position(1), Some(2));

        axis.show_section(1);
        assert!(!axis.is_section_hidden(1));
        assert_eq!(axis.position_by_index(2), Some(2));
    }

    #[test]
    fn test_visual_logical_mapping() {
        let mut axis = SectionAxis::new(3);

        // Initially, visual == logical
        assert_eq!(axis.visual_index(0), 0);
        assert_eq!(axis.logical_index(0), 0);

        // Move section 0 to visual position 2
        axis.move_section(0, 2);
        assert_eq!(axis.logical_index(2), 0);
        assert_eq!(axis.visual_index(0), 2);
        assert_eq!(axis.position_by_index(0), Some(2));
        assert_eq!(axis.index_by_position(0), Some(1));
    }

    #[test]
    fn test_move_with_hidden_section() {
        let mut axis = SectionAxis::new(4);
        axis.hide_section(0);
        axis.move_section(3, 0);

        // Visual order: 3, 0 (hidden), 1, 2
        assert_eq!(axis.index_by_position(0), Some(3));
        assert_eq!(axis.index_by_position(1), Some(1));
        assert_eq!(axis.index_by_position(3), None);
    }

    #[test]
    fn test_swap_sections() {
        let mut axis = SectionAxis::new(3);
        axis.swap_sections(0, 2);
        assert_eq!(axis.logical_index(0), 2);
        assert_eq!(axis.logical_index(2), 0);
        assert_eq!(axis.position_by_index(2), Some(0));
    }

    #[test]
    fn test_out_of_range_requests_ignored() {
        let mut axis = SectionAxis::new(2);
        axis.hide_section(5);
        axis.move_section(0, 9);
        assert_eq!(axis.hidden_section_count(), 0);
        assert_eq!(axis.logical_index(0), 0);
        assert_eq!(axis.position_by_index(7), None);
    }

    #[test]
    fn test_grid_layer_axes() {
        let grid = SectionGrid::new(4, 6);
        grid.rows_mut().hide_section(0);

        assert_eq!(grid.column_position_by_index(0), Some(0));
        assert_eq!(grid.row_position_by_index(0), None);
        assert_eq!(grid.row_index_by_position(0), Some(1));
        assert_eq!(grid.columns().visible_count(), 4);
        assert_eq!(grid.rows().visible_count(), 5);
    }
}
