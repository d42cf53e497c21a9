/// WGS84 Earth Frame Ellipsoid semi-major axis (meters).
/// Used as the mean radius of the home-relative linearization.
pub const EARTH_SEMI_MAJOR_AXIS_WGS84: f64 = 6378137.0_f64;

/// Default cycle timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: f64 = 100.0;

/// Geodetic coordinates below this magnitude (in every component)
/// are considered a "no fix" report and never linearized.
pub const DEGENERATE_COORDINATE_THRESHOLD: f64 = 1.0E-5;
