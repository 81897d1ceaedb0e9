//! Column and row groups for Horizon Lattice table headers.
//!
//! This crate keeps track of named, contiguous groups of columns or rows and
//! keeps their boundaries consistent while the host grid hides, shows and
//! reorders items underneath them:
//!
//! - **Group Model**: ordered groups with lookups by name, position and static index
//! - **Membership**: contiguous growth and tail-first shrinking of groups
//! - **Visibility**: cached visible extent with recovery from the member list
//! - **Collapse State**: collapseable, collapsed and unbreakable flags
//! - **Persistence**: save/load of the group state as an INI property
//! - **Section Axis**: a host-side layout for hide/show/move to drive a model
//!
//! Groups are described in *index* space, which is stable. The host shows
//! items at *positions*, which change as items are hidden or moved. The
//! model translates between the two through a [`PositionLayer`] and an
//! [`IndexPositionConverter`] supplied by the host, or treats both as equal
//! when none is set.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_lattice_groups::{GroupModel, Orientation, SectionGrid};
//!
//! let grid = Arc::new(SectionGrid::new(12, 0));
//! let mut model = GroupModel::new();
//! model.set_position_layer(grid.clone(), Arc::new(Orientation::Horizontal));
//!
//! let person = model.add_group("Person", 0, 4);
//! let address = model.add_group("Address", 4, 3);
//!
//! // Hiding a column shifts the positions of everything after it
//! grid.columns_mut().hide_section(1);
//! model.perform_consistency_check();
//!
//! assert_eq!(model.group(person).unwrap().visible_span(), 3);
//! assert_eq!(model.group(address).unwrap().visible_start_position(), Some(3));
//! assert_eq!(model.group_by_position(3).unwrap().name(), "Address");
//! ```
//!
//! The model is not internally synchronized. It is `Send + Sync`, but
//! mutation needs exclusive access, as with any `&mut` API.

mod config;
mod converter;
mod error;
mod group;
pub mod logging;
mod model;
pub mod persistence;
mod section_axis;

pub use config::{GroupModelConfig, DEFAULT_PERSISTENCE_KEY};
pub use converter::{IndexPositionConverter, Orientation, PositionLayer, PositionMapping};
pub use error::{GroupModelError, Result};
pub use group::{Group, GroupId};
pub use model::{GroupModel, GroupTarget};
pub use persistence::{decode_groups, encode_groups, GroupRecord};
pub use section_axis::{SectionAxis, SectionGrid};
