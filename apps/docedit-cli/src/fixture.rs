//! JSON fixture documents
//!
//! A fixture stands in for pdf.js: each page is rendered as a solid fill
//! and its text runs are taken verbatim from the file.

use docedit_core::extract::TextRun;
use docedit_core::{
    Color, DocEditError, DocEditResult, PageRasterizer, Raster, TextContentProvider,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FixturePage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub runs: Vec<serde_json::Value>,
    #[serde(default)]
    pub fill: Option<Color>,
}

impl FixturePage {
    pub fn text_runs(&self) -> Vec<TextRun> {
        self.runs
            .iter()
            .cloned()
            .map(TextRun::from_value_lenient)
            .collect()
    }

    pub fn raster(&self, scale: f64) -> Raster {
        let width = (self.width * scale).round().max(0.0) as u32;
        let height = (self.height * scale).round().max(0.0) as u32;
        Raster::solid(width, height, self.fill.unwrap_or(Color::WHITE))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureDocument {
    pub pages: Vec<FixturePage>,
}

impl FixtureDocument {
    pub fn from_json(json: &str) -> DocEditResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn page_at(&self, page: usize) -> DocEditResult<&FixturePage> {
        self.pages.get(page).ok_or(DocEditError::PageOutOfRange {
            page,
            count: self.pages.len(),
        })
    }
}

impl PageRasterizer for FixtureDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> DocEditResult<(f64, f64)> {
        let page = self.page_at(page)?;
        Ok((page.width, page.height))
    }

    fn render(&mut self, page: usize, scale: f64) -> DocEditResult<Raster> {
        Ok(self.page_at(page)?.raster(scale))
    }
}

impl TextContentProvider for FixtureDocument {
    fn text_runs(&mut self, page: usize) -> DocEditResult<Vec<TextRun>> {
        Ok(self.page_at(page)?.text_runs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fixture() {
        let doc = FixtureDocument::from_json(
            r##"{"pages": [{"width": 612, "height": 792, "fill": "#eeeeee",
                "runs": [{"str": "Hi", "transform": [10, 0, 0, 10, 0, 0]}, {"type": "endMarkedContent"}]}]}"##,
        )
        .unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page_size(0).unwrap(), (612.0, 792.0));
        let runs = doc.pages[0].text_runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hi");
        assert_eq!(runs[1], TextRun::default());
    }

    #[test]
    fn test_render_size_follows_scale() {
        let mut doc = FixtureDocument::from_json(r#"{"pages": [{"width": 1190, "height": 1684}]}"#)
            .unwrap();
        let raster = doc.render(0, 0.5).unwrap();
        assert_eq!((raster.width, raster.height), (595, 842));
        assert!(matches!(
            doc.render(3, 1.0),
            Err(DocEditError::PageOutOfRange { page: 3, count: 1 })
        ));
    }
}
