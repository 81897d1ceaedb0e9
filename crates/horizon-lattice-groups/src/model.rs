//! The group model: an ordered collection of groups over one grid axis.
//!
//! [`GroupModel`] owns its [`Group`]s and hands out [`GroupId`]s to address
//! them. Lookups by name, position or static index scan the groups in
//! insertion order and return `None` when nothing matches.
//!
//! Group composition changes through [`GroupModel::add_positions_to_group`]
//! and [`GroupModel::remove_positions_from_group`]. Both keep a group
//! contiguous:
//!
//! - Adding only absorbs positions directly adjacent to the group, working
//!   outwards from it, and stops at the first gap.
//! - Removing a position from the middle of a group gives up the last
//!   visible item instead, so the group shrinks from the tail rather than
//!   splitting. A group that loses its last item is removed from the model.
//!
//! Requests that do not apply (unknown group, unbreakable group, positions
//! outside the group) are ignored rather than reported as errors.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_groups::GroupModel;
//!
//! let mut model = GroupModel::new();
//! let id = model.add_group("Person", 2, 3);
//!
//! // 1 is adjacent to the start, 5 to the end, 9 leaves a gap
//! model.add_positions_to_group(id, &[9, 1, 5]);
//!
//! let group = model.group(id).unwrap();
//! assert_eq!(group.start_index(), Some(1));
//! assert_eq!(group.original_span(), 5);
//! assert!(model.group_by_position(9).is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use slotmap::SlotMap;

use crate::config::GroupModelConfig;
use crate::converter::{IndexPositionConverter, PositionLayer, PositionMapping};
use crate::group::{Group, GroupId};
use crate::logging::targets;

/// Identifies the group an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTarget<'a> {
    /// The group with this id.
    Id(GroupId),
    /// The first group with this name.
    Name(&'a str),
    /// The first group whose visible range contains this position.
    Position(usize),
}

impl From<GroupId> for GroupTarget<'_> {
    fn from(id: GroupId) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for GroupTarget<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for GroupTarget<'_> {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

/// Tracks the column or row groups of a grid.
#[derive(Debug, Default)]
pub struct GroupModel {
    groups: SlotMap<GroupId, Group>,

    /// Insertion order of the groups, used for lookups and persistence.
    order: Vec<GroupId>,

    mapping: PositionMapping,

    config: GroupModelConfig,
}

impl GroupModel {
    /// Creates an empty model using the identity position mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty model with the given configuration.
    pub fn with_config(config: GroupModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates an empty model translating through the given host layer.
    pub fn with_position_layer(
        layer: Arc<dyn PositionLayer>,
        converter: Arc<dyn IndexPositionConverter>,
    ) -> Self {
        Self {
            mapping: PositionMapping::new(layer, converter),
            ..Self::default()
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GroupModelConfig {
        &self.config
    }

    // =========================================================================
    // Position Translation
    // =========================================================================

    /// Sets the host layer and converter used for position/index translation
    /// and refreshes the visible start of every group.
    pub fn set_position_layer(
        &mut self,
        layer: Arc<dyn PositionLayer>,
        converter: Arc<dyn IndexPositionConverter>,
    ) {
        self.mapping = PositionMapping::new(layer, converter);
        self.update_visible_start_positions();
    }

    /// Falls back to the identity mapping.
    pub fn clear_position_layer(&mut self) {
        self.mapping = PositionMapping::identity();
        self.update_visible_start_positions();
    }

    /// Returns the position mapping in use.
    pub fn mapping(&self) -> &PositionMapping {
        &self.mapping
    }

    /// Converts a position to its index.
    pub fn index_for(&self, position: usize) -> Option<usize> {
        self.mapping.index_for(position)
    }

    /// Converts an index to its position, `None` if it is not visible.
    pub fn position_for(&self, index: usize) -> Option<usize> {
        self.mapping.position_for(index)
    }

    /// Refreshes the visible start of every group after the host changed its
    /// positions (hide, show, reorder).
    pub fn update_visible_start_positions(&mut self) {
        for &id in &self.order {
            if let Some(group) = self.groups.get_mut(id) {
                group.update_visible_start_position(&self.mapping);
            }
        }
    }

    /// Rebuilds the visible state of every group from its members.
    ///
    /// Only needed when the host changed positions in a way the model could
    /// not follow, e.g. a hide without details about what was hidden.
    pub fn perform_consistency_check(&mut self) {
        for &id in &self.order {
            if let Some(group) = self.groups.get_mut(id) {
                group.consistency_check(&self.mapping);
            }
        }
    }

    // =========================================================================
    // Group Creation and Removal
    // =========================================================================

    /// Creates a group of `span` items starting at `start_index`, using the
    /// configured default flags.
    ///
    /// The caller is responsible for keeping names unique and ranges
    /// disjoint from other groups.
    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        start_index: usize,
        span: usize,
    ) -> GroupId {
        let collapseable = self.config.default_collapseable;
        let unbreakable = self.config.default_unbreakable;
        let id = self.insert_group(name, Some(start_index), span);
        if let Some(group) = self.groups.get_mut(id) {
            group.set_collapseable(collapseable);
            group.set_unbreakable(unbreakable);
        }
        id
    }

    pub(crate) fn insert_group(
        &mut self,
        name: impl Into<String>,
        start_index: Option<usize>,
        span: usize,
    ) -> GroupId {
        let mapping = &self.mapping;
        let id = self
            .groups
            .insert_with_key(|id| Group::new(id, name, start_index, span, mapping));
        self.order.push(id);
        tracing::trace!(target: targets::MODEL, ?id, ?start_index, span, "added group");
        id
    }

    /// Removes the targeted group and returns it, `None` if there is none.
    pub fn remove_group<'a>(&mut self, target: impl Into<GroupTarget<'a>>) -> Option<Group> {
        let id = self.resolve(target)?;
        let group = self.groups.remove(id)?;
        self.order.retain(|&other| other != id);
        tracing::trace!(target: targets::MODEL, ?id, name = group.name(), "removed group");
        Some(group)
    }

    /// Removes all groups.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.order.clear();
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the model has no groups.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the group with the given id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Returns mutable access to the group with the given id.
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    /// Iterates over the groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> + '_ {
        self.order.iter().filter_map(|&id| self.groups.get(id))
    }

    /// Returns the group ids in insertion order.
    pub fn group_ids(&self) -> &[GroupId] {
        &self.order
    }

    /// Returns the targeted group.
    pub fn find<'a>(&self, target: impl Into<GroupTarget<'a>>) -> Option<&Group> {
        match target.into() {
            GroupTarget::Id(id) => self.groups.get(id),
            GroupTarget::Name(name) => self.group_by_name(name),
            GroupTarget::Position(position) => self.group_by_position(position),
        }
    }

    /// Returns the id of the targeted group.
    pub fn resolve<'a>(&self, target: impl Into<GroupTarget<'a>>) -> Option<GroupId> {
        self.find(target).map(Group::id)
    }

    /// Returns the first group with the given name.
    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups().find(|group| group.name() == name)
    }

    /// Returns the first group whose visible range contains `position`.
    pub fn group_by_position(&self, position: usize) -> Option<&Group> {
        self.groups().find(|group| group.contains_position(position))
    }

    /// Returns the first group that has `index` as static index.
    pub fn group_by_static_index(&self, index: usize) -> Option<&Group> {
        self.groups()
            .find(|group| group.static_indexes().contains(&index))
    }

    /// Returns true if `position` belongs to a group.
    pub fn is_part_of_a_group(&self, position: usize) -> bool {
        self.group_by_position(position).is_some()
    }

    /// Returns true if the item at `position` is a static index of its group.
    pub fn is_static(&self, position: usize) -> bool {
        match (self.group_by_position(position), self.index_for(position)) {
            (Some(group), Some(index)) => group.static_indexes().contains(&index),
            _ => false,
        }
    }

    /// Returns true if `position` belongs to a collapseable group.
    pub fn is_part_of_a_collapseable_group(&self, position: usize) -> bool {
        self.group_by_position(position)
            .is_some_and(Group::is_collapseable)
    }

    /// Returns true if `position` belongs to an unbreakable group.
    pub fn is_part_of_an_unbreakable_group(&self, position: usize) -> bool {
        self.group_by_position(position)
            .is_some_and(Group::is_unbreakable)
    }

    // =========================================================================
    // Group Flags
    // =========================================================================

    /// Sets whether the targeted group can be collapsed.
    pub fn set_group_collapseable<'a>(
        &mut self,
        target: impl Into<GroupTarget<'a>>,
        collapseable: bool,
    ) {
        if let Some(group) = self.target_mut(target) {
            group.set_collapseable(collapseable);
        }
    }

    /// Sets whether the targeted group is unbreakable.
    pub fn set_group_unbreakable<'a>(
        &mut self,
        target: impl Into<GroupTarget<'a>>,
        unbreakable: bool,
    ) {
        if let Some(group) = self.target_mut(target) {
            group.set_unbreakable(unbreakable);
        }
    }

    /// Collapses or expands the targeted group if it is collapseable.
    pub fn set_group_collapsed<'a>(&mut self, target: impl Into<GroupTarget<'a>>, collapsed: bool) {
        if let Some(group) = self.target_mut(target) {
            group.set_collapsed(collapsed);
        }
    }

    /// Toggles the collapsed state of the targeted group.
    pub fn toggle_group_collapsed<'a>(&mut self, target: impl Into<GroupTarget<'a>>) {
        if let Some(group) = self.target_mut(target) {
            group.toggle_collapsed();
        }
    }

    /// Returns whether newly created groups are collapseable.
    pub fn default_collapseable(&self) -> bool {
        self.config.default_collapseable
    }

    /// Sets whether newly created groups are collapseable.
    pub fn set_default_collapseable(&mut self, collapseable: bool) {
        self.config.default_collapseable = collapseable;
    }

    /// Returns whether newly created groups are unbreakable.
    pub fn default_unbreakable(&self) -> bool {
        self.config.default_unbreakable
    }

    /// Sets whether newly created groups are unbreakable.
    pub fn set_default_unbreakable(&mut self, unbreakable: bool) {
        self.config.default_unbreakable = unbreakable;
    }

    fn target_mut<'a>(&mut self, target: impl Into<GroupTarget<'a>>) -> Option<&mut Group> {
        let id = self.resolve(target)?;
        self.groups.get_mut(id)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Adds positions to a group.
    ///
    /// Positions before the group are absorbed nearest first while each is
    /// directly in front of the current start; positions from the start on
    /// are absorbed in ascending order while each is directly behind the
    /// current end. Processing on either side stops at the first gap and the
    /// remaining positions of that side are dropped. Unbreakable groups are
    /// left unchanged.
    pub fn add_positions_to_group(&mut self, id: GroupId, positions: &[usize]) {
        let Some(group) = self.groups.get_mut(id) else {
            return;
        };
        if group.is_unbreakable() {
            return;
        }
        let Some(start) = group.visible_start_position() else {
            return;
        };

        let mut sorted = positions.to_vec();
        sorted.sort_unstable();
        let (before, after): (Vec<usize>, Vec<usize>) =
            sorted.into_iter().partition(|&pos| pos < start);

        for &pos in before.iter().rev() {
            if group.visible_start_position() != Some(pos + 1) {
                break;
            }
            let Some(index) = self.mapping.index_for(pos) else {
                break;
            };
            group.absorb_front(index, &self.mapping);
        }

        for &pos in &after {
            let next = group.visible_positions().end;
            if pos != next {
                break;
            }
            let Some(index) = self.mapping.index_for(next) else {
                break;
            };
            group.absorb_back(index);
        }

        tracing::trace!(
            target: targets::MODEL,
            ?id,
            start_index = ?group.start_index(),
            original_span = group.original_span(),
            "added positions to group"
        );
    }

    /// Removes positions from a group.
    ///
    /// Only visible positions of the group are considered. Removing the
    /// start item moves the start forward, removing any other position
    /// shrinks the group by its last visible item. A group left without
    /// items is removed from the model. Unbreakable groups are left
    /// unchanged.
    pub fn remove_positions_from_group(&mut self, id: GroupId, positions: &[usize]) {
        let Some(group) = self.groups.get_mut(id) else {
            return;
        };
        if group.is_unbreakable() {
            return;
        }

        let mut emptied = false;
        for &pos in positions {
            if !group.visible_positions().contains(&pos) {
                continue;
            }
            if group.release_position(pos, &self.mapping) {
                emptied = true;
                break;
            }
        }

        if emptied {
            self.remove_group(id);
        }
    }

    /// Removes positions from whichever groups contain them.
    ///
    /// Follows the rules of
    /// [`remove_positions_from_group`](Self::remove_positions_from_group)
    /// and returns the distinct ids of the groups that changed, in the order
    /// they were first touched. Ids of groups that were emptied and removed
    /// no longer resolve.
    pub fn remove_positions(&mut self, positions: &[usize]) -> Vec<GroupId> {
        let mut changed = Vec::new();
        for &pos in positions {
            let Some(id) = self.resolve(pos) else {
                continue;
            };
            let Some(group) = self.groups.get_mut(id) else {
                continue;
            };
            if group.is_unbreakable() {
                continue;
            }

            let emptied = group.release_position(pos, &self.mapping);
            if !changed.contains(&id) {
                changed.push(id);
            }
            if emptied {
                self.remove_group(id);
            }
        }
        changed
    }

    /// Adds static indexes to the targeted group.
    ///
    /// An index is only accepted if its current position lies inside the
    /// visible range of the group; others are ignored.
    pub fn add_static_indexes_to_group<'a>(
        &mut self,
        target: impl Into<GroupTarget<'a>>,
        indexes: &[usize],
    ) {
        let Some(id) = self.resolve(target) else {
            return;
        };
        let Some(group) = self.groups.get_mut(id) else {
            return;
        };

        for &index in indexes {
            let inside = self
                .mapping
                .position_for(index)
                .is_some_and(|pos| group.visible_positions().contains(&pos));
            if inside {
                group.push_static_index(index);
            }
        }
    }
}

impl fmt::Display for GroupModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Group Model:")?;
        for group in self.groups() {
            write!(f, "{group}")?;
        }
        Ok(())
    }
}

// Ensure GroupModel is Send + Sync
static_assertions::assert_impl_all!(GroupModel: Send, Sync);
