//! Page composition: [`ProfileRecord`] → ordered [`PageDescriptor`]s.
//!
//! Each section is a pure builder `fn(&ProfileRecord, &ComposeOptions) ->
//! Option<SectionBlock>`; returning `None` means the section has nothing to
//! show and is omitted entirely. Pages are assembled from fixed ordering
//! tables, so the order of blocks on a page is the order of the table and
//! never depends on the data.
//!
//! ```text
//! Identity  ── id_card
//! Detail    ── profile_header, personal_info, experience, person_posts, contact
//! Company   ── company_header, company_info, company_about, company_brief,
//!              partners, events, company_posts
//! ```
//!
//! Identity and Detail are always emitted. Company is emitted iff
//! [`ProfileRecord::has_company_info`] holds, so a document has exactly two
//! or three pages.

use crate::config::{AvatarFallback, EventsLayout, GenerationConfig};
use crate::pipeline::normalize::{ProfileRecord, UNKNOWN_INITIALS};
use crate::record::present_str;
use serde::Serialize;
use tracing::debug;

/// Which physical page a descriptor represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageKind {
    Identity,
    Detail,
    Company,
}

impl PageKind {
    /// Footer label.
    pub fn label(&self) -> &'static str {
        match self {
            PageKind::Identity => "Contact Card",
            PageKind::Detail => "Profile Details",
            PageKind::Company => "Company Profile",
        }
    }
}

/// Logical section identity, used by the renderer to pick a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    IdCard,
    ProfileHeader,
    PersonalInfo,
    Experience,
    Posts,
    Contact,
    CompanyHeader,
    CompanyInfo,
    CompanyAbout,
    CompanyBrief,
    Partners,
    Events,
    CompanyPosts,
}

/// Visual weight of a labelled field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Emphasis {
    Plain,
    /// Boxed long-form text (summary, posts).
    Callout,
    /// Distinct styling for the person's headline.
    Headline,
    /// Highlighted current position.
    Current,
    /// Small pill (education on the ID card).
    Badge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkKind {
    Mail,
    Tel,
    External,
}

/// What stands in for a missing photo or logo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Placeholder {
    Initials(String),
    Blank,
}

/// One renderable element inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockItem {
    Avatar {
        image_url: Option<String>,
        alt: String,
        placeholder: Placeholder,
    },
    Heading(String),
    Subtitle(String),
    Field {
        label: String,
        value: String,
        emphasis: Emphasis,
    },
    Link {
        label: String,
        text: String,
        href: String,
        kind: LinkKind,
    },
    List(Vec<String>),
    Paragraph(String),
}

/// One visually independent unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionBlock {
    pub kind: SectionKind,
    pub title: Option<String>,
    pub items: Vec<BlockItem>,
}

impl SectionBlock {
    fn new(kind: SectionKind, title: Option<&str>) -> Self {
        Self {
            kind,
            title: title.map(str::to_string),
            items: Vec::new(),
        }
    }

    fn push(&mut self, item: BlockItem) {
        self.items.push(item);
    }

    fn extend_opt(&mut self, item: Option<BlockItem>) {
        self.items.extend(item);
    }

    /// `None` when nothing was pushed.
    fn non_empty(self) -> Option<Self> {
        if self.items.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// One page: an ordered list of section blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    pub kind: PageKind,
    pub blocks: Vec<SectionBlock>,
}

impl PageDescriptor {
    pub fn block(&self, kind: SectionKind) -> Option<&SectionBlock> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    pub fn has_block(&self, kind: SectionKind) -> bool {
        self.block(kind).is_some()
    }
}

/// Rendering choices the composer honours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    pub events_layout: EventsLayout,
    pub avatar_fallback: AvatarFallback,
}

impl From<&GenerationConfig> for ComposeOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            events_layout: config.events_layout,
            avatar_fallback: config.avatar_fallback,
        }
    }
}

type SectionBuilder = fn(&ProfileRecord, &ComposeOptions) -> Option<SectionBlock>;

const IDENTITY_SECTIONS: &[SectionBuilder] = &[id_card];

const DETAIL_SECTIONS: &[SectionBuilder] = &[
    profile_header,
    personal_info,
    experience,
    person_posts,
    contact,
];

const COMPANY_SECTIONS: &[SectionBuilder] = &[
    company_header,
    company_info,
    company_about,
    company_brief,
    partners,
    events,
    company_posts,
];

/// Compose with default options.
pub fn compose(record: &ProfileRecord) -> Vec<PageDescriptor> {
    compose_with(record, &ComposeOptions::default())
}

/// Compose the pages for one record.
pub fn compose_with(record: &ProfileRecord, options: &ComposeOptions) -> Vec<PageDescriptor> {
    let mut pages = vec![
        build_page(PageKind::Identity, IDENTITY_SECTIONS, record, options),
        build_page(PageKind::Detail, DETAIL_SECTIONS, record, options),
    ];
    if record.has_company_info() {
        pages.push(build_page(PageKind::Company, COMPANY_SECTIONS, record, options));
    }
    debug!(
        "Composed {} pages for '{}'",
        pages.len(),
        record.display_name()
    );
    pages
}

/// Number of pages [`compose_with`] would emit.
pub fn page_count(record: &ProfileRecord) -> usize {
    2 + usize::from(record.has_company_info())
}

fn build_page(
    kind: PageKind,
    table: &[SectionBuilder],
    record: &ProfileRecord,
    options: &ComposeOptions,
) -> PageDescriptor {
    PageDescriptor {
        kind,
        blocks: table
            .iter()
            .filter_map(|build| build(record, options))
            .collect(),
    }
}

// ── Link targets ─────────────────────────────────────────────────────────

pub fn mailto_href(email: &str) -> String {
    format!("mailto:{}", email.trim())
}

/// `tel:` link with all whitespace removed.
pub fn tel_href(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    format!("tel:{digits}")
}

/// Prepend `https://` when the value carries no scheme.
pub fn external_href(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url.trim_start_matches('/'))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn field(label: &str, value: &str, emphasis: Emphasis) -> Option<BlockItem> {
    present_str(value).map(|v| BlockItem::Field {
        label: label.to_string(),
        value: v.to_string(),
        emphasis,
    })
}

fn link(label: &str, value: &str, kind: LinkKind) -> Option<BlockItem> {
    present_str(value).map(|v| BlockItem::Link {
        label: label.to_string(),
        text: v.to_string(),
        href: match kind {
            LinkKind::Mail => mailto_href(v),
            LinkKind::Tel => tel_href(v),
            LinkKind::External => external_href(v),
        },
        kind,
    })
}

fn avatar(image_url: &str, alt: &str, letters: String, options: &ComposeOptions) -> BlockItem {
    BlockItem::Avatar {
        image_url: present_str(image_url).map(str::to_string),
        alt: alt.to_string(),
        placeholder: match options.avatar_fallback {
            AvatarFallback::Initials => Placeholder::Initials(letters),
            AvatarFallback::Blank => Placeholder::Blank,
        },
    }
}

fn numbered_entries(
    block: &mut SectionBlock,
    prefix: &str,
    entries: &[String],
    emphasis: Emphasis,
) {
    for (i, entry) in entries.iter().enumerate() {
        if let Some(item) = field(&format!("{} {}", prefix, i + 1), entry, emphasis) {
            block.push(item);
        }
    }
}

// ── Identity page ────────────────────────────────────────────────────────

fn id_card(record: &ProfileRecord, options: &ComposeOptions) -> Option<SectionBlock> {
    let name = record.display_name();
    let mut block = SectionBlock::new(SectionKind::IdCard, None);
    block.push(avatar(&record.photo_url, name, record.initials(), options));
    block.push(BlockItem::Heading(name.to_string()));
    if let Some(title) = present_str(&record.title) {
        block.push(BlockItem::Subtitle(title.to_string()));
    }
    block.extend_opt(field("Location", &record.location(), Emphasis::Plain));
    block.extend_opt(field("Education", &record.education, Emphasis::Badge));
    Some(block)
}

// ── Detail page ──────────────────────────────────────────────────────────

fn profile_header(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let mut block = SectionBlock::new(SectionKind::ProfileHeader, None);
    block.push(BlockItem::Heading(record.display_name().to_string()));
    if let Some(title) = present_str(&record.title) {
        block.push(BlockItem::Subtitle(title.to_string()));
    }
    Some(block)
}

fn personal_info(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let mut block = SectionBlock::new(SectionKind::PersonalInfo, Some("Personal Information"));
    block.extend_opt(field("About", &record.summary, Emphasis::Callout));
    block.extend_opt(field("Headline", &record.headline, Emphasis::Headline));
    block.extend_opt(field("Education", &record.education, Emphasis::Plain));
    block.non_empty()
}

fn experience(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let mut block = SectionBlock::new(SectionKind::Experience, Some("Professional Experience"));
    for (slot, text) in record.experiences() {
        let item = if slot == 1 {
            field("Current Experience", text, Emphasis::Current)
        } else {
            field(&format!("Experience {slot}"), text, Emphasis::Plain)
        };
        block.extend_opt(item);
    }
    block.non_empty()
}

fn person_posts(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let mut block = SectionBlock::new(SectionKind::Posts, Some("Last Posts"));
    numbered_entries(&mut block, "Post", &record.person_posts, Emphasis::Callout);
    block.non_empty()
}

fn contact(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let mut block = SectionBlock::new(SectionKind::Contact, Some("Contact Information"));
    block.extend_opt(link("Email", &record.email, LinkKind::Mail));
    block.extend_opt(link("Phone", &record.phone, LinkKind::Tel));
    block.extend_opt(link("Second Phone", &record.second_phone, LinkKind::Tel));
    block.extend_opt(link("LinkedIn", &record.network_url, LinkKind::External));
    block.non_empty()
}

// ── Company page ─────────────────────────────────────────────────────────

fn company_header(record: &ProfileRecord, options: &ComposeOptions) -> Option<SectionBlock> {
    let name = present_str(&record.company_name);
    let letter = name
        .and_then(|n| n.chars().next())
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_else(|| UNKNOWN_INITIALS.to_string());

    let mut block = SectionBlock::new(SectionKind::CompanyHeader, None);
    block.push(avatar(
        &record.company_logo_url,
        name.unwrap_or("Company logo"),
        letter,
        options,
    ));
    if let Some(name) = name {
        block.push(BlockItem::Heading(name.to_string()));
    }
    if let Some(tagline) = present_str(&record.company_tagline) {
        block.push(BlockItem::Subtitle(tagline.to_string()));
    }
    Some(block)
}

fn company_info(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let mut block = SectionBlock::new(SectionKind::CompanyInfo, Some("Company Information"));
    block.extend_opt(link("Website", &record.company_website, LinkKind::External));
    block.extend_opt(field("Industry", &record.company_industry, Emphasis::Plain));
    block.extend_opt(link("Corporate Phone", &record.corporate_phone, LinkKind::Tel));
    block.extend_opt(field("Address", &record.company_address, Emphasis::Plain));
    block.extend_opt(field("City", &record.company_city, Emphasis::Plain));
    block.extend_opt(field("State", &record.company_state, Emphasis::Plain));
    block.extend_opt(field("Country", &record.company_country, Emphasis::Plain));
    block.non_empty()
}

fn company_about(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    paragraph_block(SectionKind::CompanyAbout, "About the Company", &record.company_about)
}

fn company_brief(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    paragraph_block(SectionKind::CompanyBrief, "Company Brief", &record.company_brief)
}

fn partners(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let entries = record.partners();
    if entries.is_empty() {
        return None;
    }
    let mut block = SectionBlock::new(SectionKind::Partners, Some("Partners"));
    block.push(BlockItem::List(entries));
    Some(block)
}

fn events(record: &ProfileRecord, options: &ComposeOptions) -> Option<SectionBlock> {
    let text = present_str(&record.company_events)?;
    let as_list = match options.events_layout {
        EventsLayout::List => true,
        EventsLayout::Paragraph => false,
        EventsLayout::Auto => record.events_are_list(),
    };

    let mut block = SectionBlock::new(SectionKind::Events, Some("Recent Events"));
    if as_list {
        let entries = record.events();
        if entries.is_empty() {
            return None;
        }
        block.push(BlockItem::List(entries));
    } else {
        block.push(BlockItem::Paragraph(text.to_string()));
    }
    Some(block)
}

fn company_posts(record: &ProfileRecord, _options: &ComposeOptions) -> Option<SectionBlock> {
    let mut block = SectionBlock::new(SectionKind::CompanyPosts, Some("Company Posts"));
    numbered_entries(&mut block, "Post", &record.company_posts, Emphasis::Callout);
    block.non_empty()
}

fn paragraph_block(kind: SectionKind, title: &str, text: &str) -> Option<SectionBlock> {
    let text = present_str(text)?;
    let mut block = SectionBlock::new(kind, Some(title));
    block.push(BlockItem::Paragraph(text.to_string()));
    Some(block)
}
