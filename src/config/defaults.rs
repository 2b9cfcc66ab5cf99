//! Default constants for jumpers configuration.
//!
//! All magic values are centralized here with documentation.

// =============================================================================
// Paths
// =============================================================================

/// Default input table
pub const DEFAULT_INPUT_PATH: &str = "./data/data.txt";

/// Default report destination
pub const DEFAULT_OUTPUT_PATH: &str = "./output/result.txt";

// =============================================================================
// Parser Defaults
// =============================================================================

/// Marker of a table header line ("from" column title of the exported tables).
/// Each header starts a new file number in provenance tags.
pub const DEFAULT_HEADER_MARKER: &str = "Откуда";

// =============================================================================
// Report Defaults
// =============================================================================

/// A link is annotated once a terminal was mentioned by more input lines than this.
pub const DEFAULT_ANNOTATION_THRESHOLD: usize = 2;

/// Annotation appended to the provenance row of such a link
pub const DEFAULT_ANNOTATION: &str = "!";

// =============================================================================
// Environment
// =============================================================================

/// Prefix of environment overrides, e.g. `JUMPERS_MERGE__STRATEGY=pairwise`
pub const ENV_PREFIX: &str = "JUMPERS_";

/// Separator between nested keys in environment overrides
pub const ENV_SEPARATOR: &str = "__";
