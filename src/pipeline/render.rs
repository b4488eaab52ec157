//! Brief rendering: [`StructuredSummary`] → paginated PDF.
//!
//! The layout is fixed and identical for every run:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │          AI Summary          │  header, bold, every page
//! │ Title: …                     │
//! │ Subtitle: …                  │
//! │ narrative … (oblique, Rich)  │
//! │ Key Points:                  │
//! │ - bullet 1                   │
//! │ - bullet 2 …                 │
//! │                              │  10 mm gap (Rich)
//! │ Source / Infographic: <link> │  blue, underlined, /URI link (Rich)
//! └──────────────────────────────┘
//! ```
//!
//! Every block is a flowing multi-line cell: long text wraps at the printable
//! width and continues on a new page when it reaches the bottom margin.
//!
//! Output is deterministic. Content streams are left uncompressed and no
//! creation date is written, so the same summary always yields the same
//! bytes.

use crate::config::SummaryMode;
use crate::error::SummaryError;
use crate::output::StructuredSummary;
use crate::pipeline::layout::{encode_win_ansi, wrap_text, Font};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Points per millimetre.
const MM: f32 = 72.0 / 25.4;

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const MARGIN_LEFT: f32 = 10.0 * MM;
const MARGIN_RIGHT: f32 = 10.0 * MM;
const MARGIN_TOP: f32 = 10.0 * MM;
/// Content may not extend below this distance from the bottom edge.
const MARGIN_BREAK: f32 = 20.0 * MM;
/// Horizontal padding inside a cell.
const CELL_PADDING: f32 = 1.0 * MM;
/// Height of one text line (cell).
const LINE_HEIGHT: f32 = 10.0 * MM;

pub const HEADER_TEXT: &str = "AI Summary";
pub const KEY_POINTS_HEADING: &str = "Key Points:";
pub const LINK_LABEL: &str = "Source / Infographic:";

const BODY_SIZE: f32 = 12.0;
const NARRATIVE_SIZE: f32 = 11.0;
const HEADER_SIZE: f32 = 12.0;

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const LINK_BLUE: (f32, f32, f32) = (0.0, 0.0, 1.0);

/// Styling for one text block.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: Font,
    size: f32,
    color: (f32, f32, f32),
    underline: bool,
}

impl TextStyle {
    const BODY: TextStyle = TextStyle {
        font: Font::Regular,
        size: BODY_SIZE,
        color: BLACK,
        underline: false,
    };
    const NARRATIVE: TextStyle = TextStyle {
        font: Font::Oblique,
        size: NARRATIVE_SIZE,
        color: BLACK,
        underline: false,
    };
    const LINK: TextStyle = TextStyle {
        font: Font::Regular,
        size: BODY_SIZE,
        color: LINK_BLUE,
        underline: true,
    };
}

/// A clickable rectangle on a page, in PDF user space.
#[derive(Debug, Clone, PartialEq)]
struct LinkArea {
    rect: [f32; 4],
    uri: String,
}

#[derive(Debug, Default)]
struct PageContent {
    operations: Vec<Operation>,
    links: Vec<LinkArea>,
}

/// Cursor-based page writer. `y` is measured from the top edge downwards.
struct Canvas {
    pages: Vec<PageContent>,
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        let mut canvas = Self {
            pages: Vec::new(),
            y: MARGIN_TOP,
        };
        canvas.add_page();
        canvas
    }

    fn printable_width() -> f32 {
        PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT - 2.0 * CELL_PADDING
    }

    fn current(&mut self) -> &mut PageContent {
        // `new` always pushes the first page.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn add_page(&mut self) {
        self.pages.push(PageContent::default());
        self.y = MARGIN_TOP;

        let style = TextStyle {
            font: Font::Bold,
            size: HEADER_SIZE,
            color: BLACK,
            underline: false,
        };
        let width = style.font.text_width(HEADER_TEXT, style.size);
        let x = MARGIN_LEFT + (PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT - width) / 2.0;
        self.draw_line(HEADER_TEXT, x, style, None);
        self.y += LINE_HEIGHT;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - MARGIN_BREAK {
            self.add_page();
        }
    }

    /// Vertical gap; may run past the bottom margin, the next block breaks.
    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    /// Write `text` as a wrapped block, one line per `LINE_HEIGHT`.
    fn paragraph(&mut self, text: &str, style: TextStyle, link: Option<&str>) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        for line in wrap_text(&text, style.font, style.size, Self::printable_width()) {
            self.ensure_room(LINE_HEIGHT);
            self.draw_line(&line, MARGIN_LEFT + CELL_PADDING, style, link);
            self.y += LINE_HEIGHT;
        }
    }

    /// Emit one line of text in the cell whose top edge is `self.y`.
    fn draw_line(&mut self, text: &str, x: f32, style: TextStyle, link: Option<&str>) {
        let cell_top = PAGE_HEIGHT - self.y;
        let cell_bottom = cell_top - LINE_HEIGHT;
        // Vertically centred baseline, as in a classic single-line cell.
        let baseline = cell_top - 0.5 * LINE_HEIGHT - 0.3 * style.size;
        let width = style.font.text_width(text, style.size);
        let (r, g, b) = style.color;

        let page = self.current();
        page.operations.extend([
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![style.font.resource_name().into(), style.size.into()],
            ),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);

        if style.underline && width > 0.0 {
            let thickness = 0.05 * style.size;
            page.operations.extend([
                Operation::new(
                    "re",
                    vec![
                        x.into(),
                        (baseline - 0.1 * style.size - thickness).into(),
                        width.into(),
                        thickness.into(),
                    ],
                ),
                Operation::new("f", vec![]),
            ]);
        }

        if let Some(uri) = link {
            if width > 0.0 {
                page.links.push(LinkArea {
                    rect: [x, cell_bottom, x + width, cell_top],
                    uri: uri.to_string(),
                });
            }
        }
    }
}

/// Lay out the summary blocks in their fixed order.
fn layout(summary: &StructuredSummary, mode: SummaryMode) -> Vec<PageContent> {
    let mut canvas = Canvas::new();

    canvas.paragraph(&format!("Title: {}", summary.title), TextStyle::BODY, None);
    canvas.paragraph(&format!("Subtitle: {}", summary.subtitle), TextStyle::BODY, None);

    if mode.has_narrative() {
        if let Some(ref narrative) = summary.narrative {
            canvas.paragraph(narrative, TextStyle::NARRATIVE, None);
        }
    }

    canvas.paragraph(KEY_POINTS_HEADING, TextStyle::BODY, None);
    for bullet in &summary.bullets {
        canvas.paragraph(&format!("- {}", bullet), TextStyle::BODY, None);
    }

    if mode.renders_link() {
        canvas.gap(LINE_HEIGHT);
        canvas.paragraph(
            &format!("{} {}", LINK_LABEL, summary.link),
            TextStyle::LINK,
            Some(&summary.link),
        );
    }

    canvas.pages
}

fn render_error(path: &Path, detail: impl ToString) -> SummaryError {
    SummaryError::RenderError {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Render the summary into an in-memory PDF.
pub fn render_to_bytes(
    summary: &StructuredSummary,
    mode: SummaryMode,
) -> Result<Vec<u8>, SummaryError> {
    let pages = layout(summary, mode);
    let mut doc = Document::with_version("1.5");

    let mut fonts = lopdf::Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        let content = Content {
            operations: page.operations,
        };
        let encoded = content
            .encode()
            .map_err(|e| render_error(Path::new("<memory>"), e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let annots: Vec<Object> = page
            .links
            .iter()
            .map(|link| Object::Reference(add_link_annotation(&mut doc, link)))
            .collect();

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        };
        if !annots.is_empty() {
            page_dict.set("Annots", annots);
        }
        kids.push(doc.add_object(page_dict).into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => info_string(&summary.title),
        "Producer" => Object::string_literal("edgequake-pdf2brief"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| render_error(Path::new("<memory>"), e))?;

    debug!("Rendered brief: {} pages, {} bytes", page_count, buf.len());
    Ok(buf)
}

/// Document-info text string: plain ASCII as is, anything else as UTF-16BE
/// with a byte-order mark.
fn info_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn add_link_annotation(doc: &mut Document, link: &LinkArea) -> ObjectId {
    let [x0, y0, x1, y1] = link.rect;
    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![x0.into(), y0.into(), x1.into(), y1.into()],
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(link.uri.as_bytes().to_vec()),
        },
    })
}

/// Render the summary and write it to `path`.
///
/// The PDF is written to a temporary file next to `path` and renamed into
/// place, so a failed run never leaves a half-written brief behind and an
/// existing brief is replaced atomically.
pub fn render_summary(
    summary: &StructuredSummary,
    mode: SummaryMode,
    path: &Path,
) -> Result<(), SummaryError> {
    let bytes = render_to_bytes(summary, mode).map_err(|e| match e {
        SummaryError::RenderError { detail, .. } => render_error(path, detail),
        other => other,
    })?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| render_error(path, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf2brief-")
        .suffix(".pdf.tmp")
        .tempfile_in(dir)
        .map_err(|e| render_error(path, e))?;
    tmp.write_all(&bytes).map_err(|e| render_error(path, e))?;
    tmp.flush().map_err(|e| render_error(path, e))?;
    // On error the NamedTempFile is dropped and deleted.
    tmp.persist(path).map_err(|e| render_error(path, e.error))?;

    info!("Wrote brief: {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> StructuredSummary {
        StructuredSummary {
            title: "Plants Turn Light Into Fuel".into(),
            subtitle: "A key process for ecosystems".into(),
            narrative: Some("Every leaf is a tiny solar factory.".into()),
            bullets: vec![
                "Uses sunlight".into(),
                "Produces oxygen".into(),
                "Feeds food chains".into(),
            ],
            link: "https://example.com/photo".into(),
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn rich_layout_contains_every_block() {
        let bytes = render_to_bytes(&summary(), SummaryMode::Rich).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        for needle in [
            "(AI Summary)",
            "(Title: Plants Turn Light Into Fuel)",
            "(Subtitle: A key process for ecosystems)",
            "(Every leaf is a tiny solar factory.)",
            "(Key Points:)",
            "(- Uses sunlight)",
            "(- Produces oxygen)",
            "(- Feeds food chains)",
            "(Source / Infographic: https://example.com/photo)",
            "/Helvetica-Oblique",
            "/URI",
        ] {
            assert!(contains(&bytes, needle), "missing {needle}");
        }
    }

    #[test]
    fn lean_layout_has_no_narrative_or_link() {
        let bytes = render_to_bytes(&summary(), SummaryMode::Lean).unwrap();
        assert!(contains(&bytes, "(Title: Plants Turn Light Into Fuel)"));
        assert!(!contains(&bytes, "solar factory"));
        assert!(!contains(&bytes, "Source / Infographic"));
        assert!(!contains(&bytes, "/Annot"));
    }

    fn shown_text(page: &PageContent) -> Vec<String> {
        page.operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn blocks_appear_in_fixed_order() {
        let pages = layout(&summary(), SummaryMode::Rich);
        assert_eq!(pages.len(), 1);
        assert_eq!(
            shown_text(&pages[0]),
            vec![
                "AI Summary",
                "Title: Plants Turn Light Into Fuel",
                "Subtitle: A key process for ecosystems",
                "Every leaf is a tiny solar factory.",
                "Key Points:",
                "- Uses sunlight",
                "- Produces oxygen",
                "- Feeds food chains",
                "Source / Infographic: https://example.com/photo",
            ]
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_to_bytes(&summary(), SummaryMode::Rich).unwrap();
        let b = render_to_bytes(&summary(), SummaryMode::Rich).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn long_content_flows_onto_more_pages_with_header() {
        let mut s = summary();
        s.bullets = (0..60).map(|i| format!("Takeaway number {i}")).collect();
        let pages = layout(&s, SummaryMode::Lean);
        assert!(pages.len() > 1);
        for page in &pages {
            assert_eq!(
                shown_text(page).first().map(String::as_str),
                Some(HEADER_TEXT),
                "every page starts with the header"
            );
        }
    }

    #[test]
    fn long_link_is_clickable_on_every_wrapped_line() {
        let mut s = summary();
        s.link = format!("https://example.com/{}", "a".repeat(400));
        let pages = layout(&s, SummaryMode::Rich);
        let links: Vec<&LinkArea> = pages.iter().flat_map(|p| p.links.iter()).collect();
        assert!(links.len() > 1);
        assert!(links.iter().all(|l| l.uri == s.link));
        for l in links {
            assert!(l.rect[2] <= PAGE_WIDTH - MARGIN_RIGHT);
        }
    }

    #[test]
    fn non_latin_text_is_replaced_not_dropped() {
        let mut s = summary();
        s.title = "光合作用 – “light”".into();
        let bytes = render_to_bytes(&s, SummaryMode::Lean).unwrap();
        assert!(contains(&bytes, "Title: ????"));
    }

    #[test]
    fn render_summary_writes_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary_for_Policy_Maker.pdf");
        render_summary(&summary(), SummaryMode::Rich, &path).unwrap();
        assert!(path.exists());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn render_summary_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.pdf");
        std::fs::write(&path, b"old").unwrap();
        render_summary(&summary(), SummaryMode::Lean, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn unwritable_target_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();
        let path = blocker.join("brief.pdf");
        let err = render_summary(&summary(), SummaryMode::Lean, &path).unwrap_err();
        assert!(matches!(err, SummaryError::RenderError { .. }));
        assert!(!path.exists());
    }

    fn info_title(bytes: &[u8]) -> Vec<u8> {
        let doc = Document::load_mem(bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        info.get(b"Title").unwrap().as_str().unwrap().to_vec()
    }

    #[test]
    fn ascii_title_is_stored_as_plain_info_string() {
        let bytes = render_to_bytes(&summary(), SummaryMode::Lean).unwrap();
        assert_eq!(info_title(&bytes), b"Plants Turn Light Into Fuel");
    }

    #[test]
    fn non_ascii_title_is_stored_as_utf16_info_string() {
        let mut s = summary();
        s.title = "Café Überblick 光".into();
        let bytes = render_to_bytes(&s, SummaryMode::Lean).unwrap();
        let stored = info_title(&bytes);
        assert_eq!(&stored[..2], &[0xFE, 0xFF]);
        let units: Vec<u16> = stored[2..]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(String::from_utf16(&units).unwrap(), "Café Überblick 光");
    }

    #[test]
    fn rendered_pdf_loads_back() {
        let bytes = render_to_bytes(&summary(), SummaryMode::Rich).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
