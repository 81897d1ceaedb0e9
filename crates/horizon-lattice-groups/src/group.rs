//! A single group of columns or rows.
//!
//! A [`Group`] covers a contiguous run of indexes. It records the configured
//! extent (`start_index`, `original_span`) next to the currently visible
//! extent (`visible_start_index`, `visible_start_position`, `visible_span`),
//! which drifts as the host hides, shows and reorders items. The visible
//! fields are a cache: they are refreshed from the start index on
//! [`Group::update_visible_start_position`] and rebuilt from the member list
//! on [`Group::consistency_check`] when the cache is found to be stale.
//!
//! Groups are owned by a [`GroupModel`](crate::GroupModel) and addressed by
//! [`GroupId`]. They carry no reference back to the model; every method that
//! needs position translation takes the model's [`PositionMapping`].

use std::fmt;
use std::ops::Range;

use slotmap::new_key_type;

use crate::converter::PositionMapping;
use crate::logging::targets;

new_key_type! {
    /// A stable handle to a group inside a [`GroupModel`](crate::GroupModel).
    ///
    /// Ids stay valid while the group is part of the model and stop
    /// resolving once it is removed.
    pub struct GroupId;
}

/// State of one group. Changing the composition of a group is done through
/// the owning model, which keeps the visible fields in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: GroupId,

    /// The name of the group, typically shown as the header cell text.
    name: String,

    /// The index of the first item in the group.
    start_index: Option<usize>,

    /// The index of the first visible item, differs from `start_index`
    /// while that item is hidden.
    visible_start_index: Option<usize>,

    /// The position of `visible_start_index`, `None` if nothing is visible.
    visible_start_position: Option<usize>,

    /// The configured number of items in the group.
    original_span: usize,

    /// The number of items currently visible.
    visible_span: usize,

    /// Indexes that stay visible while the group is collapsed.
    static_indexes: Vec<usize>,

    /// Indexes believed to belong to the group, used to rebuild the visible
    /// state when the host changed without telling the model.
    members: Vec<usize>,

    collapseable: bool,
    collapsed: bool,

    /// An unbreakable group keeps its composition. Items can be reordered
    /// inside it but not added or removed.
    unbreakable: bool,
}

impl Group {
    /// Creates a group spanning `span` positions from the position of
    /// `start_index`, recording the index found at each as a member.
    pub(crate) fn new(
        id: GroupId,
        name: impl Into<String>,
        start_index: Option<usize>,
        span: usize,
        mapping: &PositionMapping,
    ) -> Self {
        let visible_start_position = mapping.position_for_opt(start_index);
        // Positions are dense, so the walk ends at the first one past the host.
        let members = match visible_start_position {
            Some(start) => (start..start.saturating_add(span))
                .map_while(|pos| mapping.index_for(pos))
                .collect(),
            None => Vec::new(),
        };

        Self {
            id,
            name: name.into(),
            start_index,
            visible_start_index: start_index,
            visible_start_position,
            original_span: span,
            visible_span: span,
            static_indexes: Vec::new(),
            members,
            collapseable: true,
            collapsed: false,
            unbreakable: false,
        }
    }

    /// Returns the handle of this group in its model.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Returns the name of this group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the name of this group.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // =========================================================================
    // Extent
    // =========================================================================

    /// Returns the index of the first item, `None` once the group was emptied.
    pub fn start_index(&self) -> Option<usize> {
        self.start_index
    }

    /// Sets the index of the first item, e.g. after reordering.
    pub fn set_start_index(&mut self, start_index: Option<usize>) {
        self.start_index = start_index;
    }

    /// Returns the index of the first visible item.
    pub fn visible_start_index(&self) -> Option<usize> {
        self.visible_start_index
    }

    /// Sets the index of the first visible item.
    pub fn set_visible_start_index(&mut self, visible_start_index: Option<usize>) {
        self.visible_start_index = visible_start_index;
    }

    /// Returns the position of the first visible item, `None` if the whole
    /// group is hidden.
    pub fn visible_start_position(&self) -> Option<usize> {
        self.visible_start_position
    }

    /// Returns the configured number of items.
    pub fn original_span(&self) -> usize {
        self.original_span
    }

    /// Sets the configured number of items.
    ///
    /// The visible span is lowered if it would exceed the new value.
    pub fn set_original_span(&mut self, original_span: usize) {
        self.original_span = original_span;
        self.visible_span = self.visible_span.min(original_span);
    }

    /// Returns the number of items currently visible.
    pub fn visible_span(&self) -> usize {
        self.visible_span
    }

    /// Sets the number of visible items. Values above the original span are
    /// ignored.
    pub fn set_visible_span(&mut self, visible_span: usize) {
        if visible_span <= self.original_span {
            self.visible_span = visible_span;
        }
    }

    /// Returns true if no item is configured for this group.
    pub fn is_empty(&self) -> bool {
        self.original_span == 0
    }

    /// Returns the tracked member indexes.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns the indexes that stay visible when the group is collapsed, in
    /// insertion order.
    pub fn static_indexes(&self) -> &[usize] {
        &self.static_indexes
    }

    // =========================================================================
    // Flags
    // =========================================================================

    /// Returns whether the group is collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Sets the collapsed state. Ignored for groups that are not collapseable.
    pub fn set_collapsed(&mut self, collapsed: bool) {
        if self.collapseable {
            self.collapsed = collapsed;
        }
    }

    /// Toggles the collapsed state.
    pub fn toggle_collapsed(&mut self) {
        self.set_collapsed(!self.collapsed);
    }

    /// Returns whether the group can be collapsed.
    pub fn is_collapseable(&self) -> bool {
        self.collapseable
    }

    /// Sets whether the group can be collapsed.
    ///
    /// Disabling collapsing expands a collapsed group. Enabling it again does
    /// not restore the collapsed state.
    pub fn set_collapseable(&mut self, collapseable: bool) {
        self.collapseable = collapseable;
        if !collapseable {
            self.collapsed = false;
        }
    }

    /// Returns whether the composition of the group is fixed.
    pub fn is_unbreakable(&self) -> bool {
        self.unbreakable
    }

    /// Sets whether the composition of the group is fixed.
    pub fn set_unbreakable(&mut self, unbreakable: bool) {
        self.unbreakable = unbreakable;
    }

    // =========================================================================
    // Position Queries
    // =========================================================================

    /// Returns the positions of the visible items.
    pub fn visible_positions(&self) -> Range<usize> {
        match self.visible_start_position {
            Some(start) => start..start.saturating_add(self.visible_span),
            None => 0..0,
        }
    }

    /// Returns the indexes of the visible items.
    pub fn visible_indexes(&self, mapping: &PositionMapping) -> Vec<usize> {
        self.visible_positions()
            .filter_map(|pos| mapping.index_for(pos))
            .collect()
    }

    /// Returns true if `position` is the start position or inside the visible
    /// range. A fully hidden group contains no position.
    pub fn contains_position(&self, position: usize) -> bool {
        match self.visible_start_position {
            Some(start) => position == start || self.visible_positions().contains(&position),
            None => false,
        }
    }

    /// Returns true if `position` is the first visible position.
    pub fn is_left_edge(&self, position: usize) -> bool {
        self.visible_start_position == Some(position)
    }

    /// Returns true if `position` is the last visible position.
    pub fn is_right_edge(&self, position: usize) -> bool {
        let positions = self.visible_positions();
        !positions.is_empty() && positions.end - 1 == position
    }

    // =========================================================================
    // Visibility Recomputation
    // =========================================================================

    /// Refreshes the visible start index and position from the start index.
    ///
    /// When no visible start position can be found although the group still
    /// records visible items, the cache is stale and the visible state is
    /// rebuilt through [`consistency_check`](Self::consistency_check).
    pub fn update_visible_start_position(&mut self, mapping: &PositionMapping) {
        if mapping.position_for_opt(self.start_index).is_some() {
            self.visible_start_index = self.start_index;
        }
        self.visible_start_position = mapping.position_for_opt(self.visible_start_index);

        if self.visible_start_position.is_none() && self.visible_span > 0 {
            tracing::debug!(
                target: targets::GROUP,
                name = %self.name,
                visible_span = self.visible_span,
                "visible start lost, running consistency check"
            );
            self.consistency_check(mapping);
        }
    }

    /// Rebuilds the visible state from the member list.
    ///
    /// Members without a position count as hidden. The smallest visible member
    /// position becomes the visible start and the visible span is the
    /// original span minus the hidden members.
    pub fn consistency_check(&mut self, mapping: &PositionMapping) {
        let mut hidden = 0;
        let mut smallest_position: Option<usize> = None;
        for &member in &self.members {
            match mapping.position_for(member) {
                Some(pos) => {
                    smallest_position = Some(smallest_position.map_or(pos, |s| s.min(pos)));
                }
                None => hidden += 1,
            }
        }

        self.visible_span = self.original_span.saturating_sub(hidden);
        self.visible_start_index = mapping.index_for_opt(smallest_position);
        self.visible_start_position = smallest_position;

        tracing::trace!(
            target: targets::GROUP,
            name = %self.name,
            hidden,
            visible_span = self.visible_span,
            visible_start_position = ?self.visible_start_position,
            "consistency check"
        );
    }

    // =========================================================================
    // Membership (driven by GroupModel)
    // =========================================================================

    /// Extends the group by one item in front of its start.
    pub(crate) fn absorb_front(&mut self, index: usize, mapping: &PositionMapping) {
        self.original_span += 1;
        self.visible_span += 1;
        self.members.insert(0, index);
        self.start_index = Some(index);
        self.visible_start_index = Some(index);
        self.update_visible_start_position(mapping);
    }

    /// Extends the group by one item after its last visible item.
    pub(crate) fn absorb_back(&mut self, index: usize) {
        self.original_span += 1;
        self.visible_span += 1;
        self.members.push(index);
    }

    /// Shrinks the group by one item on behalf of `position`.
    ///
    /// Removing the start item moves the start forward. Any other position
    /// gives up the last visible item so the group never splits. Returns true
    /// when the group has no items left; its start fields are cleared then.
    pub(crate) fn release_position(&mut self, position: usize, mapping: &PositionMapping) -> bool {
        let index = mapping.index_for(position);

        if index.is_some() && index == self.start_index {
            self.start_index = mapping.index_for(position + 1);
            self.remove_member(index);
        } else {
            let tail = self
                .visible_start_position
                .map(|start| start.saturating_add(self.visible_span))
                .and_then(|end| end.checked_sub(1));
            self.remove_member(mapping.index_for_opt(tail));
        }

        self.original_span = self.original_span.saturating_sub(1);
        self.visible_span = self.visible_span.saturating_sub(1).min(self.original_span);

        let emptied = self.original_span == 0;
        if emptied {
            self.start_index = None;
            self.visible_start_index = None;
        } else if index == self.visible_start_index {
            self.visible_start_index = mapping.index_for(position + 1);
        }

        self.update_visible_start_position(mapping);
        emptied
    }

    /// Records a static index unless it is already present.
    pub(crate) fn push_static_index(&mut self, index: usize) {
        if !self.static_indexes.contains(&index) {
            self.static_indexes.push(index);
        }
    }

    /// Restores the cached visible fields verbatim.
    pub(crate) fn restore_visible_state(
        &mut self,
        visible_start_index: Option<usize>,
        visible_start_position: Option<usize>,
        visible_span: usize,
        mapping: &PositionMapping,
    ) {
        self.visible_start_index = visible_start_index;
        self.visible_start_position = visible_start_position;
        self.set_visible_span(visible_span);

        // A hidden start leaves no members from construction, so recover
        // them from the restored visible range.
        if self.members.is_empty() {
            self.members.extend(self.start_index);
            for pos in self.visible_positions() {
                match mapping.index_for(pos) {
                    Some(index) if !self.members.contains(&index) => self.members.push(index),
                    _ => {}
                }
            }
        }
    }

    fn remove_member(&mut self, index: Option<usize>) {
        let Some(index) = index else {
            return;
        };
        if let Some(at) = self.members.iter().position(|&m| m == index) {
            self.members.remove(at);
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Group:")?;
        writeln!(f, "\t name: {}", self.name)?;
        writeln!(f, "\t startIndex: {}", DisplayIndex(self.start_index))?;
        writeln!(f, "\t visibleStartIndex: {}", DisplayIndex(self.visible_start_index))?;
        writeln!(
            f,
            "\t visibleStartPosition: {}",
            DisplayIndex(self.visible_start_position)
        )?;
        writeln!(f, "\t originalSpan: {}", self.original_span)?;
        writeln!(f, "\t visibleSpan: {}", self.visible_span)?;
        writeln!(f, "\t collapseable: {}", self.collapseable)?;
        writeln!(f, "\t collapsed: {}", self.collapsed)?;
        writeln!(f, "\t unbreakable: {}", self.unbreakable)?;
        writeln!(f, "\t staticIndexes: {:?}", self.static_indexes)
    }
}

/// Formats an optional coordinate, `-1` standing for `None`.
pub(crate) struct DisplayIndex(pub(crate) Option<usize>);

impl fmt::Display for DisplayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("-1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(start: usize, span: usize) -> Group {
        Group::new(
            GroupId::default(),
            "Test",
            Some(start),
            span,
            &PositionMapping::identity(),
        )
    }

    #[test]
    fn test_new_group_identity() {
        let group = group(5, 3);
        assert_eq!(group.start_index(), Some(5));
        assert_eq!(group.visible_start_index(), Some(5));
        assert_eq!(group.visible_start_position(), Some(5));
        assert_eq!(group.original_span(), 3);
        assert_eq!(group.visible_span(), 3);
        assert_eq!(group.members(), &[5, 6, 7]);
        assert!(group.is_collapseable());
        assert!(!group.is_collapsed());
        assert!(!group.is_unbreakable());
    }

    #[test]
    fn test_visible_span_capped_by_original_span() {
        let mut group = group(0, 3);
        group.set_visible_span(4);
        assert_eq!(group.visible_span(), 3);
        group.set_visible_span(1);
        assert_eq!(group.visible_span(), 1);

        group.set_visible_span(3);
        group.set_original_span(2);
        assert_eq!(group.visible_span(), 2);
    }

    #[test]
    fn test_collapse_requires_collapseable() {
        let mut group = group(0, 3);
        group.set_collapsed(true);
        assert!(group.is_collapsed());

        group.set_collapseable(false);
        assert!(!group.is_collapsed());

        group.set_collapsed(true);
        assert!(!group.is_collapsed());

        group.set_collapseable(true);
        assert!(!group.is_collapsed());

        group.toggle_collapsed();
        assert!(group.is_collapsed());
    }

    #[test]
    fn test_edges_and_positions() {
        let group = group(2, 3);
        assert_eq!(group.visible_positions(), 2..5);
        assert!(group.is_left_edge(2));
        assert!(group.is_right_edge(4));
        assert!(!group.is_right_edge(5));
        assert!(group.contains_position(3));
        assert!(!group.contains_position(5));
        assert_eq!(group.visible_indexes(&PositionMapping::identity()), vec![2, 3, 4]);
    }

    #[test]
    fn test_hidden_group_contains_nothing() {
        let mut group = group(2, 0);
        group.restore_visible_state(None, None, 0, &PositionMapping::identity());
        assert!(!group.contains_position(0));
        assert!(!group.is_left_edge(0));
        assert!(!group.is_right_edge(0));
        assert!(group.visible_positions().is_empty());
    }

    #[test]
    fn test_release_start_position() {
        let mapping = PositionMapping::identity();
        let mut group = group(5, 3);

        assert!(!group.release_position(5, &mapping));
        assert_eq!(group.start_index(), Some(6));
        assert_eq!(group.visible_start_index(), Some(6));
        assert_eq!(group.visible_start_position(), Some(6));
        assert_eq!(group.members(), &[6, 7]);
        assert_eq!(group.original_span(), 2);
    }

    #[test]
    fn test_release_middle_position_takes_tail() {
        let mapping = PositionMapping::identity();
        let mut group = group(5, 3);

        assert!(!group.release_position(6, &mapping));
        assert_eq!(group.start_index(), Some(5));
        assert_eq!(group.visible_positions(), 5..7);
        assert_eq!(group.members(), &[5, 6]);
    }

    #[test]
    fn test_release_last_position_empties_group() {
        let mapping = PositionMapping::identity();
        let mut group = group(5, 1);

        assert!(group.release_position(5, &mapping));
        assert!(group.is_empty());
        assert_eq!(group.start_index(), None);
        assert_eq!(group.visible_start_index(), None);
        assert_eq!(group.visible_start_position(), None);
        assert_eq!(group.visible_span(), 0);
    }

    #[test]
    fn test_extreme_positions_saturate() {
        let group = group(usize::MAX - 1, 4);
        assert_eq!(group.visible_positions(), usize::MAX - 1..usize::MAX);
        assert_eq!(group.members(), &[usize::MAX - 1]);
        assert!(group.contains_position(usize::MAX - 1));
        assert!(group.is_right_edge(usize::MAX - 1));
        assert!(!group.is_right_edge(usize::MAX));
    }

    #[test]
    fn test_static_indexes_deduplicated() {
        let mut group = group(0, 4);
        group.push_static_index(2);
        group.push_static_index(1);
        group.push_static_index(2);
        assert_eq!(group.static_indexes(), &[2, 1]);
    }

    #[test]
    fn test_display_dump() {
        let mut group = group(1, 2);
        group.push_static_index(1);
        let text = group.to_string();
        assert!(text.starts_with("Group:\n\t name: Test\n"));
        assert!(text.contains("\t visibleStartPosition: 1\n"));
        assert!(text.contains("\t staticIndexes: [1]\n"));
    }
}
