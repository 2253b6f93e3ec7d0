//! Timeboard Raster Library
//!
//! Composes a static bitmap of a document (or a region of it) for export.
//! The pipeline shares the core crate's geometry and text layout, so the
//! flattened image matches what the user saw while editing.

mod scene;

pub mod export;

pub use export::{render_document, Bitmap, RasterError, EXPORT_PADDING};
