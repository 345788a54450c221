//! Document state engine for the browser text/annotation editor
//!
//! Reconstructs editable text from content-stream runs and a rendered page
//! raster, and keeps a reversible edit history over text items and layers.
//!
//! Components, leaves first:
//! - `geometry`: affine transforms, rectangles, colors
//! - `extract`: text runs + raster into `EditableTextItem`s
//! - `loader`: all-or-nothing, ticketed document loads
//! - `store`: `LayerStore`, the owner of all mutable state
//! - `history`: snapshot undo/redo
//! - `selection`: click/drag selection and hit testing
//! - `compositor`: read-only render frames

pub mod commands;
pub mod compositor;
pub mod config;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod history;
pub mod loader;
pub mod model;
pub mod raster;
pub mod selection;
pub mod store;

pub use commands::{CommandOutcome, EditCommand};
pub use compositor::{Compositor, Frame};
pub use config::EngineConfig;
pub use error::{DocEditError, DocEditResult, SamplingError};
pub use extract::{TextLayoutExtractor, TextRun};
pub use geometry::{AffineTransform, Color, Point, Rect};
pub use history::{History, HistoryStatus};
pub use loader::{
    DocumentLoader, LoadTicket, LoadedDocument, PageRasterizer, PendingLoad, TextContentProvider,
};
pub use model::{
    AnnotationType, EditableTextItem, FontStyle, FontWeight, Layer, LayerId, LayerKind,
    LayerPatch, LayerStyle, PageInfo, Snapshot, TextAlign, TextItemId, TextItemPatch, Tool,
};
pub use raster::{PixelSource, Raster};
pub use selection::{Hit, Selection};
pub use store::LayerStore;
