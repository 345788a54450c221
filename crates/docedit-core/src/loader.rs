//! Document loading
//!
//! A load is all-or-nothing: pages are rendered and extracted in order, the
//! first failure aborts the whole load, and nothing reaches the store until
//! every page succeeded. Loads are identified by a `LoadTicket` issued by
//! the store so a superseded load can be rejected at commit time.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{DocEditError, DocEditResult};
use crate::extract::{TextLayoutExtractor, TextRun};
use crate::geometry::fit_scale;
use crate::model::{EditableTextItem, PageInfo};
use crate::raster::{PixelSource, Raster};

/// Renders pages of the source document.
pub trait PageRasterizer {
    fn page_count(&self) -> usize;

    /// Page size in PDF units.
    fn page_size(&self, page: usize) -> DocEditResult<(f64, f64)>;

    /// Render `page` at exactly `scale`.
    fn render(&mut self, page: usize, scale: f64) -> DocEditResult<Raster>;
}

/// Supplies the content-stream text runs of each page.
pub trait TextContentProvider {
    fn text_runs(&mut self, page: usize) -> DocEditResult<Vec<TextRun>>;
}

/// Handle for one document load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadTicket(pub u64);

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Result of a successful load, ready to be committed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedDocument {
    pub ticket: LoadTicket,
    pub pages: Vec<PageInfo>,
    pub text_items: Vec<EditableTextItem>,
}

fn extraction_error(page: usize, err: DocEditError) -> DocEditError {
    if err.is_load_failure() {
        err
    } else {
        DocEditError::Extraction {
            page,
            reason: err.to_string(),
        }
    }
}

/// A load whose pages are pushed one at a time.
///
/// Used when rendering happens outside the engine (pdf.js in the browser):
/// the caller renders each page at `scale_for(..)` and pushes the raster and
/// runs. Any error leaves the load unusable; the caller drops it.
#[derive(Debug, Clone)]
pub struct PendingLoad {
    ticket: LoadTicket,
    config: EngineConfig,
    pages: Vec<PageInfo>,
    text_items: Vec<EditableTextItem>,
}

impl PendingLoad {
    pub fn new(ticket: LoadTicket, config: EngineConfig) -> Self {
        Self {
            ticket,
            config,
            pages: Vec::new(),
            text_items: Vec::new(),
        }
    }

    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Shared scale for a page of the given size.
    pub fn scale_for(&self, page_width: f64, page_height: f64) -> f64 {
        fit_scale(
            page_width,
            page_height,
            self.config.page_width,
            self.config.page_height,
        )
    }

    /// Extract the next page from its raster and text runs.
    pub fn add_page<R: PixelSource + ?Sized>(
        &mut self,
        page_width: f64,
        page_height: f64,
        raster: &R,
        runs: &[TextRun],
    ) -> DocEditResult<PageInfo> {
        let index = self.pages.len();
        if !(page_width.is_finite() && page_width > 0.0 && page_height.is_finite() && page_height > 0.0)
        {
            return Err(DocEditError::Extraction {
                page: index,
                reason: format!("invalid page size {}x{}", page_width, page_height),
            });
        }

        let scale = self.scale_for(page_width, page_height);
        let expected = (
            (page_width * scale).round() as u32,
            (page_height * scale).round() as u32,
        );
        let actual = (raster.width(), raster.height());
        let tolerance = self.config.scale_tolerance_px;
        if (actual.0 as f64 - expected.0 as f64).abs() > tolerance
            || (actual.1 as f64 - expected.1 as f64).abs() > tolerance
        {
            return Err(DocEditError::ScaleMismatch {
                page: index,
                expected,
                actual,
            });
        }

        let extractor = TextLayoutExtractor::new(&self.config, self.ticket.generation());
        let items = extractor.extract_page(index, scale, runs, raster);

        let info = PageInfo {
            index,
            width: actual.0,
            height: actual.1,
            scale,
        };
        self.pages.push(info);
        self.text_items.extend(items);
        Ok(info)
    }

    pub fn finish(self) -> LoadedDocument {
        info!(
            ticket = self.ticket.0,
            pages = self.pages.len(),
            items = self.text_items.len(),
            "document extracted"
        );
        LoadedDocument {
            ticket: self.ticket,
            pages: self.pages,
            text_items: self.text_items,
        }
    }
}

/// Drives a full load through the rasterizer and text provider.
pub struct DocumentLoader<'a> {
    config: &'a EngineConfig,
}

impl<'a> DocumentLoader<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn load<R, P>(
        &self,
        ticket: LoadTicket,
        rasterizer: &mut R,
        provider: &mut P,
    ) -> DocEditResult<LoadedDocument>
    where
        R: PageRasterizer + ?Sized,
        P: TextContentProvider + ?Sized,
    {
        let mut pending = PendingLoad::new(ticket, self.config.clone());
        for page in 0..rasterizer.page_count() {
            let (width, height) = rasterizer
                .page_size(page)
                .map_err(|e| extraction_error(page, e))?;
            let scale = pending.scale_for(width, height);
            let raster = rasterizer
                .render(page, scale)
                .map_err(|e| extraction_error(page, e))?;
            let runs = provider
                .text_runs(page)
                .map_err(|e| extraction_error(page, e))?;
            debug!(page, scale, runs = runs.len(), "rendered page");
            pending.add_page(width, height, &raster, &runs)?;
        }
        Ok(pending.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{AffineTransform, Color};

    struct FakeDocument {
        sizes: Vec<(f64, f64)>,
        fail_render_on: Option<usize>,
        /// Render this page one pixel per unit regardless of scale
        ignore_scale_on: Option<usize>,
    }

    impl FakeDocument {
        fn new(sizes: Vec<(f64, f64)>) -> Self {
            Self {
                sizes,
                fail_render_on: None,
                ignore_scale_on: None,
            }
        }
    }

    impl PageRasterizer for FakeDocument {
        fn page_count(&self) -> usize {
            self.sizes.len()
        }

        fn page_size(&self, page: usize) -> DocEditResult<(f64, f64)> {
            Ok(self.sizes[page])
        }

        fn render(&mut self, page: usize, scale: f64) -> DocEditResult<Raster> {
            if self.fail_render_on == Some(page) {
                return Err(DocEditError::InvalidCommand("corrupt stream".to_string()));
            }
            let (w, h) = self.sizes[page];
            let scale = if self.ignore_scale_on == Some(page) {
                1.0
            } else {
                scale
            };
            Ok(Raster::solid(
                (w * scale).round() as u32,
                (h * scale).round() as u32,
                Color::WHITE,
            ))
        }
    }

    /// One "Hello" run per page
    struct FakeText;

    impl TextContentProvider for FakeText {
        fn text_runs(&mut self, _page: usize) -> DocEditResult<Vec<TextRun>> {
            Ok(vec![TextRun::new(
                "Hello",
                AffineTransform::new(12.0, 0.0, 0.0, 12.0, 72.0, 400.0),
            )])
        }
    }

    fn load(doc: &mut FakeDocument) -> DocEditResult<LoadedDocument> {
        let config = EngineConfig::default();
        DocumentLoader::new(&config).load(LoadTicket(7), doc, &mut FakeText)
    }

    #[test]
    fn test_load_all_pages() {
        let mut doc = FakeDocument::new(vec![(595.0, 842.0), (1190.0, 1684.0)]);
        let loaded = load(&mut doc).unwrap();

        assert_eq!(loaded.ticket, LoadTicket(7));
        assert_eq!(loaded.pages.len(), 2);
        assert_eq!(loaded.pages[1].scale, 0.5);
        assert_eq!((loaded.pages[1].width, loaded.pages[1].height), (595, 842));
        assert_eq!(loaded.text_items.len(), 2);
        assert_eq!(loaded.text_items[1].id.as_str(), "text-2-0-7");
        assert_eq!(loaded.text_items[1].height, 6.0);
    }

    #[test]
    fn test_render_failure_aborts_load() {
        let mut doc = FakeDocument::new(vec![(595.0, 842.0), (595.0, 842.0)]);
        doc.fail_render_on = Some(1);
        let err = load(&mut doc).unwrap_err();
        assert!(matches!(err, DocEditError::Extraction { page: 1, .. }));
    }

    #[test]
    fn test_scale_mismatch_aborts_load() {
        let mut doc = FakeDocument::new(vec![(1190.0, 1684.0)]);
        doc.ignore_scale_on = Some(0);
        let err = load(&mut doc).unwrap_err();
        assert_eq!(
            err,
            DocEditError::ScaleMismatch {
                page: 0,
                expected: (595, 842),
                actual: (1190, 1684),
            }
        );
    }

    #[test]
    fn test_pending_load_rejects_bad_page_size() {
        let mut pending = PendingLoad::new(LoadTicket(1), EngineConfig::default());
        let raster = Raster::solid(10, 10, Color::WHITE);
        let err = pending.add_page(0.0, 842.0, &raster, &[]).unwrap_err();
        assert!(err.is_load_failure());
        assert_eq!(pending.page_count(), 0);
    }

    #[test]
    fn test_pending_load_letter_page() {
        let mut pending = PendingLoad::new(LoadTicket(2), EngineConfig::default());
        // US Letter is width-bound: 595/612
        let scale = pending.scale_for(612.0, 792.0);
        assert!((scale - 595.0 / 612.0).abs() < 1e-12);
        let raster = Raster::solid(595, (792.0 * scale).round() as u32, Color::WHITE);
        let info = pending.add_page(612.0, 792.0, &raster, &[]).unwrap();
        assert_eq!(info.width, 595);
        let loaded = pending.finish();
        assert_eq!(loaded.pages.len(), 1);
        assert!(loaded.text_items.is_empty());
    }
}
