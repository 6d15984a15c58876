/// Custom URL scheme carried by share locators
pub const LOCATOR_SCHEME: &str = "countdown";

/// Fixed host carried by share locators
pub const LOCATOR_HOST: &str = "share";

/// The only query key a share locator is expected to carry
pub const LOCATOR_DATA_KEY: &str = "data";

/// Maximum number of entries written to the projection file
pub const PROJECTION_LIMIT: usize = 5;

/// Projection file name inside the shared container
pub const PROJECTION_FILE_NAME: &str = "countdown-snapshot.json";

/// Longer edge of a projection thumbnail, in pixels
pub const THUMBNAIL_MAX_DIMENSION: u32 = 256;

/// JPEG quality used when re-encoding thumbnails (0-100)
pub const THUMBNAIL_JPEG_QUALITY: u8 = 70;

/// Upper bound on a decompressed share payload (16 MiB)
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// Smallest output chunk the compression adapter drains into
pub const MIN_COMPRESSION_CHUNK: usize = 4 * 1024;

/// Days between "now" and the companion placeholder's target
pub const PLACEHOLDER_DAYS_AHEAD: i64 = 30;

/// Title shown by companions before any countdown exists
pub const PLACEHOLDER_TITLE: &str = "My Countdown";
