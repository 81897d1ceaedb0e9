//! Translation between stable indexes and visible positions.
//!
//! A group model describes its groups in *index* space, which never changes
//! when items are hidden or reordered. The host grid shows items at
//! *positions*, which do. The host supplies a [`PositionLayer`] for its
//! grid together with an [`IndexPositionConverter`] that picks the axis to
//! translate on. Without them, [`PositionMapping`] treats indexes and
//! positions as the same number, which lets a model run on its own.

use std::fmt;
use std::sync::Arc;

/// The axis of the host grid a group model tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Column groups.
    #[default]
    Horizontal,
    /// Row groups.
    Vertical,
}

/// The host grid handle used for position/index translation.
///
/// All methods return `None` when the requested item has no counterpart,
/// e.g. a hidden index has no position.
pub trait PositionLayer: Send + Sync {
    /// Returns the column index shown at the given column position.
    fn column_index_by_position(&self, position: usize) -> Option<usize>;

    /// Returns the position of the given column index, `None` if hidden.
    fn column_position_by_index(&self, index: usize) -> Option<usize>;

    /// Returns the row index shown at the given row position.
    fn row_index_by_position(&self, position: usize) -> Option<usize>;

    /// Returns the position of the given row index, `None` if hidden.
    fn row_position_by_index(&self, index: usize) -> Option<usize>;
}

/// Converts between positions on a [`PositionLayer`] and indexes.
pub trait IndexPositionConverter: Send + Sync {
    /// Converts a position on the layer to the corresponding index.
    fn index_for_position(&self, layer: &dyn PositionLayer, position: usize) -> Option<usize>;

    /// Converts an index to its position on the layer, `None` if not visible.
    fn position_for_index(&self, layer: &dyn PositionLayer, index: usize) -> Option<usize>;
}

impl IndexPositionConverter for Orientation {
    fn index_for_position(&self, layer: &dyn PositionLayer, position: usize) -> Option<usize> {
        match self {
            Self::Horizontal => layer.column_index_by_position(position),
            Self::Vertical => layer.row_index_by_position(position),
        }
    }

    fn position_for_index(&self, layer: &dyn PositionLayer, index: usize) -> Option<usize> {
        match self {
            Self::Horizontal => layer.column_position_by_index(index),
            Self::Vertical => layer.row_position_by_index(index),
        }
    }
}

/// The translation seam owned by a group model.
///
/// Holds the optional layer/converter pair. When both are present every
/// translation goes through the converter, otherwise the identity mapping
/// is used.
#[derive(Clone, Default)]
pub struct PositionMapping {
    target: Option<(Arc<dyn PositionLayer>, Arc<dyn IndexPositionConverter>)>,
}

impl PositionMapping {
    /// Creates an identity mapping.
    pub fn identity() -> Self {
        Self { target: None }
    }

    /// Creates a mapping that delegates to the given layer and converter.
    pub fn new(layer: Arc<dyn PositionLayer>, converter: Arc<dyn IndexPositionConverter>) -> Self {
        Self {
            target: Some((layer, converter)),
        }
    }

    /// Returns true if a layer and converter are configured.
    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// Returns the index for the given position.
    pub fn index_for(&self, position: usize) -> Option<usize> {
        match &self.target {
            Some((layer, converter)) => converter.index_for_position(layer.as_ref(), position),
            None => Some(position),
        }
    }

    /// Returns the position for the given index, `None` if it is not visible.
    pub fn position_for(&self, index: usize) -> Option<usize> {
        match &self.target {
            Some((layer, converter)) => converter.position_for_index(layer.as_ref(), index),
            None => Some(index),
        }
    }

    /// Like [`index_for`](Self::index_for), passing the `None` sentinel through.
    pub(crate) fn index_for_opt(&self, position: Option<usize>) -> Option<usize> {
        position.and_then(|p| self.index_for(p))
    }

    /// Like [`position_for`](Self::position_for), passing the `None` sentinel through.
    pub(crate) fn position_for_opt(&self, index: Option<usize>) -> Option<usize> {
        index.and_then(|i| self.position_for(i))
    }
}

impl fmt::Debug for PositionMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionMapping")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Columns shifted right by one, rows reversed over ten items.
    struct ShiftedLayer;

    impl PositionLayer for ShiftedLayer {
        fn column_index_by_position(&self, position: usize) -> Option<usize> {
            Some(position + 1)
        }

        fn column_position_by_index(&self, index: usize) -> Option<usize> {
            index.checked_sub(1)
        }

        fn row_index_by_position(&self, position: usize) -> Option<usize> {
            9usize.checked_sub(position)
        }

        fn row_position_by_index(&self, index: usize) -> Option<usize> {
            9usize.checked_sub(index)
        }
    }

    #[test]
    fn test_identity_mapping() {
        let mapping = PositionMapping::identity();
        assert!(!mapping.is_configured());
        assert_eq!(mapping.index_for(7), Some(7));
        assert_eq!(mapping.position_for(3), Some(3));
        assert_eq!(mapping.position_for_opt(None), None);
    }

    #[test]
    fn test_orientation_selects_axis() {
        let layer: Arc<dyn PositionLayer> = Arc::new(ShiftedLayer);

        let columns = PositionMapping::new(layer.clone(), Arc::new(Orientation::Horizontal));
        assert!(columns.is_configured());
        assert_eq!(columns.index_for(0), Some(1));
        assert_eq!(columns.position_for(0), None);

        let rows = PositionMapping::new(layer, Arc::new(Orientation::Vertical));
        assert_eq!(rows.index_for(0), Some(9));
        assert_eq!(rows.position_for(2), Some(7));
    }
}
