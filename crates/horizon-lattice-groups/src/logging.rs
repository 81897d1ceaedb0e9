//! Logging targets for the group model.
//!
//! The crate logs through `tracing`. Install a subscriber in the host
//! application to see the output, and filter by the targets below:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_lattice_groups::model=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Group model target (group lifecycle and membership changes).
    pub const MODEL: &str = "horizon_lattice_groups::model";
    /// Group state target (visibility recomputation).
    pub const GROUP: &str = "horizon_lattice_groups::group";
    /// Persistence target (save/load of group state).
    pub const PERSISTENCE: &str = "horizon_lattice_groups::persistence";
    /// Section axis target (host-side hide/show/move).
    pub const AXIS: &str = "horizon_lattice_groups::axis";
}
