//! HTML rendering: composed pages → one self-contained document.
//!
//! Every record value passes through [`escape_html`] before it reaches the
//! markup, including URLs placed in attributes. Each [`PageDescriptor`]
//! becomes one `<section class="page">` with a forced page break, so the
//! browser prints (or rasterises) exactly one sheet per descriptor as long
//! as its content fits.

use crate::config::GenerationConfig;
use crate::pipeline::compose::{
    BlockItem, Emphasis, LinkKind, PageDescriptor, PageKind, Placeholder, SectionBlock,
    SectionKind,
};
use crate::pipeline::normalize::ProfileRecord;
use crate::styles;
use std::fmt::Write as _;

/// Settings that affect markup but not composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub web_fonts: bool,
    pub page_width_px: u32,
    pub page_height_px: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for RenderOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            web_fonts: config.web_fonts,
            page_width_px: config.page_width_px,
            page_height_px: config.page_height_px(),
        }
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render every page into one HTML document.
pub fn render_document(
    record: &ProfileRecord,
    pages: &[PageDescriptor],
    options: &RenderOptions,
) -> String {
    let total = pages.len();
    let body: String = pages
        .iter()
        .enumerate()
        .map(|(i, page)| render_page(record, page, i + 1, total))
        .collect();
    wrap_document(record, &body, options)
}

/// Render one page as a standalone document (footer numbering still
/// reflects the full page count).
///
/// Used for per-page rasterisation, where each capture must contain exactly
/// one page.
pub fn render_single_page(
    record: &ProfileRecord,
    pages: &[PageDescriptor],
    index: usize,
    options: &RenderOptions,
) -> Option<String> {
    let page = pages.get(index)?;
    let body = render_page(record, page, index + 1, pages.len());
    Some(wrap_document(record, &body, options))
}

fn wrap_document(record: &ProfileRecord, body: &str, options: &RenderOptions) -> String {
    let title = format!("{} - Profile", record.display_name());
    let mut out = String::with_capacity(body.len() + styles::PROFILE_CSS.len() + 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str(&styles::head(&escape_html(&title), options.web_fonts));
    let _ = writeln!(
        out,
        "<style>.page {{ width: {}px; min-height: {}px; }}</style>",
        options.page_width_px, options.page_height_px
    );
    out.push_str("</head>\n<body>\n");
    out.push_str(body);
    out.push_str("</body>\n</html>\n");
    out
}

fn render_page(record: &ProfileRecord, page: &PageDescriptor, number: usize, total: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<section class=\"page page-{}\">",
        page_slug(page.kind)
    );
    for block in &page.blocks {
        render_block(&mut out, block);
    }
    let _ = writeln!(
        out,
        "<footer class=\"page-footer\">{} • {} • Page {} of {}</footer>",
        escape_html(record.display_name()),
        page.kind.label(),
        number,
        total
    );
    out.push_str("</section>\n");
    out
}

fn page_slug(kind: PageKind) -> &'static str {
    match kind {
        PageKind::Identity => "identity",
        PageKind::Detail => "detail",
        PageKind::Company => "company",
    }
}

fn render_block(out: &mut String, block: &SectionBlock) {
    let class = match block.kind {
        SectionKind::IdCard => "id-card",
        SectionKind::ProfileHeader => "profile-header",
        SectionKind::CompanyHeader => "company-header",
        _ => "section",
    };
    let _ = writeln!(out, "<div class=\"{class}\">");

    // Company header keeps the logo beside the text column.
    let header_text = block.kind == SectionKind::CompanyHeader;
    let mut text_open = false;

    if let Some(title) = &block.title {
        let _ = writeln!(out, "<h2>{}</h2>", escape_html(title));
    }
    for item in &block.items {
        if header_text && !text_open && !matches!(item, BlockItem::Avatar { .. }) {
            out.push_str("<div>\n");
            text_open = true;
        }
        render_item(out, item, block.kind);
    }
    if text_open {
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");
}

fn render_item(out: &mut String, item: &BlockItem, section: SectionKind) {
    match item {
        BlockItem::Avatar {
            image_url,
            alt,
            placeholder,
        } => {
            let mut class = String::from("avatar");
            if section == SectionKind::CompanyHeader {
                class.push_str(" logo");
            }
            match (image_url, placeholder) {
                (Some(src), _) => {
                    let _ = writeln!(
                        out,
                        "<div class=\"{class}\"><img src=\"{}\" alt=\"{}\"></div>",
                        escape_html(src),
                        escape_html(alt)
                    );
                }
                (None, Placeholder::Initials(letters)) => {
                    let _ = writeln!(
                        out,
                        "<div class=\"{class}\" aria-label=\"{}\">{}</div>",
                        escape_html(alt),
                        escape_html(letters)
                    );
                }
                (None, Placeholder::Blank) => {
                    let _ = writeln!(
                        out,
                        "<div class=\"{class} blank\" aria-label=\"{}\"></div>",
                        escape_html(alt)
                    );
                }
            }
        }
        BlockItem::Heading(text) => {
            let _ = writeln!(out, "<h1>{}</h1>", escape_html(text));
        }
        BlockItem::Subtitle(text) => {
            let _ = writeln!(out, "<p class=\"subtitle\">{}</p>", escape_html(text));
        }
        BlockItem::Field {
            label,
            value,
            emphasis,
        } => render_field(out, label, value, *emphasis),
        BlockItem::Link {
            label,
            text,
            href,
            kind,
        } => {
            let target = match kind {
                LinkKind::External => " target=\"_blank\" rel=\"noopener noreferrer\"",
                LinkKind::Mail | LinkKind::Tel => "",
            };
            let _ = writeln!(
                out,
                "<div class=\"field\"><span class=\"label\">{}</span><span class=\"value\"><a href=\"{}\"{target}>{}</a></span></div>",
                escape_html(label),
                escape_html(href),
                escape_html(text)
            );
        }
        BlockItem::List(entries) => {
            out.push_str("<ul class=\"list\">\n");
            for entry in entries {
                let _ = writeln!(out, "<li>{}</li>", escape_html(entry));
            }
            out.push_str("</ul>\n");
        }
        BlockItem::Paragraph(text) => {
            let _ = writeln!(out, "<p class=\"paragraph\">{}</p>", escape_html(text));
        }
    }
}

fn render_field(out: &mut String, label: &str, value: &str, emphasis: Emphasis) {
    let label = escape_html(label);
    let value = escape_html(value);
    match emphasis {
        Emphasis::Plain => {
            let _ = writeln!(
                out,
                "<div class=\"field\"><span class=\"label\">{label}</span><span class=\"value\">{value}</span></div>"
            );
        }
        Emphasis::Badge => {
            let _ = writeln!(
                out,
                "<div class=\"field\"><span class=\"badge\">{label}: {value}</span></div>"
            );
        }
        Emphasis::Callout | Emphasis::Headline | Emphasis::Current => {
            let modifier = match emphasis {
                Emphasis::Headline => " headline",
                Emphasis::Current => " current",
                _ => "",
            };
            let _ = writeln!(
                out,
                "<div class=\"callout{modifier}\"><span class=\"label\">{label}</span><div class=\"value\">{value}</div></div>"
            );
        }
    }
}
