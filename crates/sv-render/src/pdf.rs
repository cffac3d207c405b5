//! Paginated PDF rendering.
//!
//! A4 pages with a centered title, an optional dedication line, one
//! `Page N` heading plus body text per story page (flat-text fallback when
//! the story has no page array), and a fixed footer on the last page.
//! Uses the built-in Helvetica faces, so no font assets ship with the
//! binary.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use tracing::debug;

use sv_models::Story;

use crate::error::{RenderError, RenderResult};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

const TITLE_SIZE: f32 = 24.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 12.0;
const FOOTER_SIZE: f32 = 10.0;

/// Points to millimeters.
const PT_TO_MM: f32 = 0.352_778;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Render a story to a PDF file at `path`.
pub async fn render_pdf(story: &Story, path: impl AsRef<Path>) -> RenderResult<()> {
    let story = story.clone();
    let path = path.as_ref().to_path_buf();

    tokio::task::spawn_blocking(move || render_pdf_sync(&story, &path))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
}

fn render_pdf_sync(story: &Story, path: &Path) -> RenderResult<()> {
    let title = story.title_or_default().to_string();
    let (doc, page, layer) = PdfDocument::new(
        title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    let mut writer = PageWriter::new(doc, page, layer)?;

    // Title
    writer.advance(TITLE_SIZE);
    writer.write_centered(&title, Face::Bold, TITLE_SIZE);
    writer.gap(TITLE_SIZE);

    // Dedication
    if let Some(child_name) = story.child_name.as_deref() {
        writer.write_centered(
            &format!("A special story for {}", child_name),
            Face::Oblique,
            14.0,
        );
        writer.gap(14.0);
    }

    let pages = story.pages();
    if !pages.is_empty() {
        for page in pages {
            writer.write_centered(&format!("Page {}", page.page_number), Face::Bold, HEADING_SIZE);
            writer.gap(HEADING_SIZE * 0.5);
            writer.write_paragraph(page.text.as_deref().unwrap_or(""), Face::Regular, BODY_SIZE);
            writer.gap(BODY_SIZE * 2.0);
        }
    } else if let Some(text) = story.flat_text() {
        writer.write_paragraph(text, Face::Regular, BODY_SIZE);
        writer.gap(BODY_SIZE * 2.0);
    }

    // Footer
    writer.write_centered("Created with StoryVerse", Face::Oblique, FOOTER_SIZE);

    writer.save(path)?;
    debug!("Rendered PDF to {}", path.display());
    Ok(())
}

/// Helvetica face selection.
#[derive(Clone, Copy)]
enum Face {
    Regular,
    Bold,
    Oblique,
}

/// Cursor-based writer that starts a fresh A4 page when the cursor would
/// cross the bottom margin.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
    /// Cursor from the top of the page, in mm.
    y: f32,
}

impl PageWriter {
    fn new(
        doc: PdfDocumentReference,
        page: printpdf::PdfPageIndex,
        layer: printpdf::PdfLayerIndex,
    ) -> RenderResult<Self> {
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let oblique = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;

        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            oblique,
            y: MARGIN_MM,
        })
    }

    fn font(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Oblique => &self.oblique,
        }
    }

    fn line_height_mm(size: f32) -> f32 {
        size * 1.4 * PT_TO_MM
    }

    /// Estimated width of `text` at `size`, in mm.
    fn text_width_mm(text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * AVG_GLYPH_WIDTH * PT_TO_MM
    }

    /// Characters that fit a body line at `size`.
    fn chars_per_line(size: f32) -> usize {
        let usable_mm = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        (usable_mm / (size * AVG_GLYPH_WIDTH * PT_TO_MM)).floor() as usize
    }

    /// Move the cursor down, breaking to a new page when needed.
    fn advance(&mut self, size: f32) {
        self.y += Self::line_height_mm(size);
        if self.y > PAGE_HEIGHT_MM - MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = MARGIN_MM + Self::line_height_mm(size);
        }
    }

    /// Insert vertical space without writing.
    fn gap(&mut self, size: f32) {
        self.y += Self::line_height_mm(size);
    }

    fn write_at(&self, text: &str, face: Face, size: f32, x: f32) {
        // printpdf's origin is the bottom-left corner.
        let baseline = PAGE_HEIGHT_MM - self.y;
        self.layer
            .use_text(text, size, Mm(x), Mm(baseline), self.font(face));
    }

    fn write_centered(&mut self, text: &str, face: Face, size: f32) {
        self.advance(size);
        let x = ((PAGE_WIDTH_MM - Self::text_width_mm(text, size)) / 2.0).max(MARGIN_MM);
        self.write_at(text, face, size, x);
    }

    /// Write word-wrapped left-aligned text.
    fn write_paragraph(&mut self, text: &str, face: Face, size: f32) {
        let width = Self::chars_per_line(size);
        for line in wrap_text(text, width) {
            self.advance(size);
            self.write_at(&line, face, size, MARGIN_MM);
        }
    }

    fn save(self, path: &Path) -> RenderResult<()> {
        let file = File::create(path)?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

/// Greedy word wrap. Words longer than `max_chars` are hard-split so a
/// single token can never overflow the line.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        // Hard-split oversized words
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split_at].to_string());
            word = &word[split_at..];
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_models::{StoryContent, StoryPage};
    use tempfile::TempDir;

    fn story_with_pages(n: u32) -> Story {
        Story {
            title: Some("Test".to_string()),
            content: Some(StoryContent {
                pages: Some(
                    (1..=n)
                        .map(|i| StoryPage {
                            page_number: i,
                            text: Some(format!("Text for page {}", i)),
                            image_url: None,
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_wrap_short_text() {
        assert_eq!(wrap_text("hello world", 80), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_splits_on_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn test_wrap_hard_splits_long_words() {
        let lines = wrap_text("supercalifragilistic", 8);
        assert_eq!(lines, vec!["supercal", "ifragili", "stic"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_text("", 80).is_empty());
        assert!(wrap_text("   ", 80).is_empty());
    }

    #[tokio::test]
    async fn test_render_pdf_writes_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.pdf");

        render_pdf(&story_with_pages(3), &path).await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[tokio::test]
    async fn test_render_pdf_flat_text_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flat.pdf");

        let story = Story {
            title: Some("Flat".to_string()),
            content: Some(StoryContent {
                text: Some("Once upon a time there was a flat story.".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        render_pdf(&story, &path).await.unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_render_pdf_many_pages_paginates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("long.pdf");

        // Enough content to force several page breaks.
        let mut story = story_with_pages(40);
        if let Some(content) = story.content.as_mut() {
            for page in content.pages.as_mut().unwrap() {
                page.text = Some("word ".repeat(200));
            }
        }

        render_pdf(&story, &path).await.unwrap();
        assert!(std::fs::read(&path).unwrap().len() > 2000);
    }
}
