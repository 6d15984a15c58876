//! # countdown-shared
//!
//! The countdown record plus everything needed to move one between
//! installations: the compression adapter, the share-link codec and the
//! thumbnail helper used by the snapshot projector.

pub mod compression;
pub mod constants;
pub mod error;
pub mod interchange;
pub mod model;
pub mod thumbnail;
pub mod types;

pub use compression::{Deflate, StreamCodec};
pub use error::{CompressionError, CountdownError, InterchangeError, ThumbnailError};
pub use interchange::{export_locator, import_record, SharePayload};
pub use model::Countdown;
pub use types::{BackgroundStyle, CountdownId, FontStyle, PeerRef};
