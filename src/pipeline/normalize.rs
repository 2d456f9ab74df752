//! Record normalisation: map an arbitrary [`RawRecord`] onto [`ProfileRecord`].
//!
//! Every canonical field owns an ordered alias list (display header first,
//! then machine-cased API names). [`resolve`] walks that list and returns the
//! first value passing the presence test; later aliases are never consulted
//! once one matches. Nothing here can fail: unresolvable fields become the
//! empty string and the caller decides whether the record is usable.

use crate::record::{is_present, present_str, present_value, RawRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Placeholder display name for records with no resolvable name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Glyph shown instead of initials when there is no usable name.
pub const UNKNOWN_INITIALS: &str = "?";

/// Raw column holding all experiences in one cell, `" | "` separated.
const AGGREGATE_EXPERIENCE_KEY: &str = "Experiences";

/// Every canonical field of a [`ProfileRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FullName,
    PhotoUrl,
    Title,
    PersonState,
    PersonCountry,
    Summary,
    Headline,
    Education,
    CurrentExperience,
    Experience2,
    Experience3,
    Experience4,
    PersonPost1,
    PersonPost2,
    PersonPost3,
    Email,
    Phone,
    SecondPhone,
    NetworkUrl,
    CompanyName,
    CompanyLogoUrl,
    CompanyWebsite,
    CompanyTagline,
    CompanyAbout,
    CompanyIndustry,
    CompanyBrief,
    CompanyPartners,
    CompanyEvents,
    CompanyPost1,
    CompanyPost2,
    CompanyPost3,
    CorporatePhone,
    CompanyAddress,
    CompanyCity,
    CompanyState,
    CompanyCountry,
}

impl Field {
    /// Source keys in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::FullName => &["Full Name", "fullName", "name"],
            Field::PhotoUrl => &["Contact Photo URL", "contactPhotoUrl", "photoUrl"],
            Field::Title => &["Person Title", "title", "position"],
            Field::PersonState => &["Person State", "personState"],
            Field::PersonCountry => &["Person Country", "personCountry"],
            Field::Summary => &["Summary About The Person", "summary", "linkedinAbout"],
            Field::Headline => &["Person Headline", "headline", "linkedinHeadline"],
            Field::Education => &["Education", "education"],
            Field::CurrentExperience => &["Current Experience", "currentExperience"],
            Field::Experience2 => &["Experience 2", "experience2"],
            Field::Experience3 => &["Experience 3", "experience3"],
            Field::Experience4 => &["Experience 4", "experience4"],
            Field::PersonPost1 => &["Last Post For Person", "lastPostPerson1"],
            Field::PersonPost2 => &["Last Post For Person 2", "lastPostPerson2"],
            Field::PersonPost3 => &["Last Post For Person 3", "lastPostPerson3"],
            Field::Email => &["Person Contact Email", "email", "contactEmail"],
            Field::Phone => &["Contact Phone", "mobile", "contactPhone"],
            Field::SecondPhone => &["Contact Second Phone", "secondPhone", "contactSecondPhone"],
            Field::NetworkUrl => &["Contact LinkedIn", "linkedinUrl", "contactLinkedIn"],
            Field::CompanyName => &["Company Name", "company", "companyName"],
            Field::CompanyLogoUrl => &["Company Logo URL", "companyLogoUrl"],
            Field::CompanyWebsite => &["Company Website", "companyWebsite"],
            Field::CompanyTagline => &["Company Tagline", "companyTagline", "companyHeadline"],
            Field::CompanyAbout => &["Company About", "companyAbout"],
            Field::CompanyIndustry => &["Company Industry", "industry", "companyIndustry"],
            Field::CompanyBrief => &[
                "Company information Brief",
                "companyWebsiteBrief",
                "websiteBrief",
            ],
            Field::CompanyPartners => &["Company Partners", "companyPartners", "partners"],
            Field::CompanyEvents => &["Company Last Events", "companyLastEvents", "lastEvents"],
            Field::CompanyPost1 => &["Company Last Post", "companyLastPost1", "lastPostCompany"],
            Field::CompanyPost2 => &["Company Last Post 2", "companyLastPost2"],
            Field::CompanyPost3 => &["Company Last Post 3", "companyLastPost3"],
            Field::CorporatePhone => &[
                "Contact Corporate Phone",
                "corporatePhone",
                "contactCorporatePhone",
            ],
            Field::CompanyAddress => &["Company Address", "address", "companyAddress"],
            Field::CompanyCity => &["Company City", "city", "companyCity"],
            Field::CompanyState => &["Company State", "state", "companyState"],
            Field::CompanyCountry => &["Company Country", "country", "companyCountry"],
        }
    }
}

/// Value of the first alias of `field` that passes the presence test, else `""`.
pub fn resolve(raw: &RawRecord, field: Field) -> String {
    resolve_keys(raw, field.aliases())
}

/// [`resolve`] over an explicit key list.
pub fn resolve_keys(raw: &RawRecord, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(present_value)
        .unwrap_or_default()
}

/// Canonical, immutable view of one contact and their company.
///
/// Every field is either a trimmed non-empty string or `""` (absent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    // Identity
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: String,
    pub title: String,
    pub person_state: String,
    pub person_country: String,
    pub summary: String,
    pub headline: String,
    pub education: String,

    // Experience: current first, then slots 2..=4
    pub current_experience: String,
    pub additional_experience: [String; 3],

    pub person_posts: [String; 3],

    // Person contact
    pub email: String,
    pub phone: String,
    pub second_phone: String,
    pub network_url: String,

    // Company
    pub company_name: String,
    pub company_logo_url: String,
    pub company_website: String,
    pub company_tagline: String,
    pub company_about: String,
    pub company_industry: String,
    pub company_brief: String,
    pub company_partners: String,
    pub company_events: String,
    pub company_posts: [String; 3],
    pub corporate_phone: String,
    pub company_address: String,
    pub company_city: String,
    pub company_state: String,
    pub company_country: String,
}

impl ProfileRecord {
    /// `true` when a real name was resolved (not the placeholder).
    pub fn has_name(&self) -> bool {
        is_present(&self.full_name)
    }

    /// Name used in headings and filenames; `"Unknown"` when absent.
    pub fn display_name(&self) -> &str {
        if self.has_name() {
            &self.full_name
        } else {
            UNKNOWN_NAME
        }
    }

    /// Up to two uppercase initials for the avatar fallback.
    pub fn initials(&self) -> String {
        initials(self.display_name())
    }

    /// `"state, country"` with absent parts omitted; `""` when both absent.
    pub fn location(&self) -> String {
        join_present(&[&self.person_state, &self.person_country], ", ")
    }

    /// Partners split on `;`.
    pub fn partners(&self) -> Vec<String> {
        split_list(&self.company_partners)
    }

    /// Recent events split on `;`.
    pub fn events(&self) -> Vec<String> {
        split_list(&self.company_events)
    }

    /// `true` when the events source is list-shaped.
    pub fn events_are_list(&self) -> bool {
        self.company_events.contains(';')
    }

    /// Non-empty experiences in fixed order as `(slot, text)`; slot 1 is current.
    pub fn experiences(&self) -> Vec<(usize, &str)> {
        std::iter::once(self.current_experience.as_str())
            .chain(self.additional_experience.iter().map(String::as_str))
            .enumerate()
            .filter(|(_, text)| is_present(text))
            .map(|(i, text)| (i + 1, text))
            .collect()
    }

    /// The single pagination decision: is there anything to put on a company page?
    pub fn has_company_info(&self) -> bool {
        let [p1, p2, p3] = &self.company_posts;
        crate::record::any_present(&[
            &self.company_name,
            &self.company_website,
            &self.company_tagline,
            &self.company_brief,
            &self.company_about,
            &self.company_industry,
            &self.company_address,
            &self.company_city,
            p1,
            p2,
            p3,
            &self.company_partners,
            &self.company_events,
        ])
    }
}

/// Build a [`ProfileRecord`] from a raw record. Never fails.
pub fn normalize(raw: &RawRecord) -> ProfileRecord {
    let full_name = resolve(raw, Field::FullName);
    let (first_name, last_name) = split_name(&full_name);

    let mut current_experience = resolve(raw, Field::CurrentExperience);
    let mut additional_experience = [
        resolve(raw, Field::Experience2),
        resolve(raw, Field::Experience3),
        resolve(raw, Field::Experience4),
    ];
    if !is_present(&current_experience) && additional_experience.iter().all(|e| e.is_empty()) {
        let aggregate = resolve_keys(raw, &[AGGREGATE_EXPERIENCE_KEY]);
        let mut entries = aggregate
            .split(" | ")
            .filter_map(present_str)
            .map(str::to_string);
        if let Some(first) = entries.next() {
            debug!("Filling experience slots from aggregate column");
            current_experience = first;
            for (slot, entry) in additional_experience.iter_mut().zip(entries) {
                *slot = entry;
            }
        }
    }

    ProfileRecord {
        full_name,
        first_name,
        last_name,
        photo_url: resolve(raw, Field::PhotoUrl),
        title: resolve(raw, Field::Title),
        person_state: resolve(raw, Field::PersonState),
        person_country: resolve(raw, Field::PersonCountry),
        summary: resolve(raw, Field::Summary),
        headline: resolve(raw, Field::Headline),
        education: resolve(raw, Field::Education),
        current_experience,
        additional_experience,
        person_posts: [
            resolve(raw, Field::PersonPost1),
            resolve(raw, Field::PersonPost2),
            resolve(raw, Field::PersonPost3),
        ],
        email: resolve(raw, Field::Email),
        phone: resolve(raw, Field::Phone),
        second_phone: resolve(raw, Field::SecondPhone),
        network_url: resolve(raw, Field::NetworkUrl),
        company_name: resolve(raw, Field::CompanyName),
        company_logo_url: resolve(raw, Field::CompanyLogoUrl),
        company_website: resolve(raw, Field::CompanyWebsite),
        company_tagline: resolve(raw, Field::CompanyTagline),
        company_about: resolve(raw, Field::CompanyAbout),
        company_industry: resolve(raw, Field::CompanyIndustry),
        company_brief: resolve(raw, Field::CompanyBrief),
        company_partners: resolve(raw, Field::CompanyPartners),
        company_events: resolve(raw, Field::CompanyEvents),
        company_posts: [
            resolve(raw, Field::CompanyPost1),
            resolve(raw, Field::CompanyPost2),
            resolve(raw, Field::CompanyPost3),
        ],
        corporate_phone: resolve(raw, Field::CorporatePhone),
        company_address: resolve(raw, Field::CompanyAddress),
        company_city: resolve(raw, Field::CompanyCity),
        company_state: resolve(raw, Field::CompanyState),
        company_country: resolve(raw, Field::CompanyCountry),
    }
}

/// Split on the first space into `(first, last)`; no space → empty last.
pub fn split_name(full_name: &str) -> (String, String) {
    match full_name.trim().split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full_name.trim().to_string(), String::new()),
    }
}

/// At most two uppercase characters: first letter of the first and last token.
///
/// Empty names and the `"Unknown"` placeholder give `"?"`.
pub fn initials(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() || name == UNKNOWN_NAME {
        return UNKNOWN_INITIALS.to_string();
    }

    let tokens: Vec<&str> = name.split_whitespace().collect();
    let leading = |token: &str| -> Option<char> {
        token
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
    };

    match tokens.as_slice() {
        [] => UNKNOWN_INITIALS.to_string(),
        [only] => leading(only).map(String::from).unwrap_or_default(),
        [first, .., last] => leading(first).into_iter().chain(leading(last)).collect(),
    }
}

/// Split a `;`-delimited list, trimming entries and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .filter_map(present_str)
        .map(str::to_string)
        .collect()
}

fn join_present(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .filter_map(|p| present_str(p))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn first_present_alias_wins() {
        let r = raw(json!({
            "Full Name": "Jane Doe",
            "fullName": "J. Doe",
            "name": "Janie"
        }));
        assert_eq!(resolve(&r, Field::FullName), "Jane Doe");
    }

    #[test]
    fn absent_alias_falls_through() {
        let r = raw(json!({
            "Full Name": "N/A",
            "fullName": "   ",
            "name": "Janie"
        }));
        assert_eq!(resolve(&r, Field::FullName), "Janie");
    }

    #[test]
    fn unresolvable_field_is_empty() {
        let r = raw(json!({ "unrelated": "x" }));
        assert_eq!(resolve(&r, Field::Title), "");
    }

    #[test]
    fn numbers_are_stringified() {
        let r = raw(json!({ "Contact Phone": 5551234 }));
        assert_eq!(normalize(&r).phone, "5551234");
    }

    #[test]
    fn normalize_is_idempotent() {
        let r = raw(json!({
            "Full Name": "Jane Doe",
            "title": "CEO",
            "company": "Acme",
            "Company Partners": "A; B"
        }));
        assert_eq!(normalize(&r), normalize(&r));
    }

    #[test]
    fn display_name_falls_back_to_placeholder() {
        let p = normalize(&raw(json!({ "Person Title": "CEO" })));
        assert!(!p.has_name());
        assert_eq!(p.display_name(), UNKNOWN_NAME);
        assert_eq!(p.initials(), "?");
    }

    #[test]
    fn split_name_on_first_space() {
        assert_eq!(
            split_name("Mary Ann Smith"),
            ("Mary".to_string(), "Ann Smith".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn initials_rules() {
        assert_eq!(initials("jane doe"), "JD");
        assert_eq!(initials("Mary Ann Smith"), "MS");
        assert_eq!(initials("cher"), "C");
        assert_eq!(initials(""), "?");
        assert_eq!(initials("Unknown"), "?");
    }

    #[test]
    fn only_the_bare_placeholder_hides_initials() {
        assert_eq!(initials("Unknown Contact"), "UC");
        assert_eq!(initials("  Unknown  "), "?");
    }

    #[test]
    fn split_list_trims_and_drops_empties() {
        assert_eq!(
            split_list(" Acme ;; Globex;  ;Initech "),
            vec!["Acme", "Globex", "Initech"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn location_omits_absent_parts() {
        let p = normalize(&raw(json!({ "Person Country": "France" })));
        assert_eq!(p.location(), "France");
        let p = normalize(&raw(json!({ "Person State": "CA", "Person Country": "USA" })));
        assert_eq!(p.location(), "CA, USA");
    }

    #[test]
    fn experiences_skip_gaps_and_keep_order() {
        let p = normalize(&raw(json!({
            "Current Experience": "CEO at Acme",
            "Experience 3": "CTO at Globex",
            "Experience 4": "Engineer at Initech"
        })));
        let slots: Vec<usize> = p.experiences().iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, vec![1, 3, 4]);
    }

    #[test]
    fn aggregate_experiences_fill_empty_slots() {
        let p = normalize(&raw(json!({
            "Experiences": "CEO at Acme | CTO at Globex"
        })));
        assert_eq!(p.current_experience, "CEO at Acme");
        assert_eq!(p.additional_experience[0], "CTO at Globex");
        assert_eq!(p.additional_experience[1], "");
    }

    #[test]
    fn aggregate_experiences_ignored_when_slots_present() {
        let p = normalize(&raw(json!({
            "Experience 2": "Analyst",
            "Experiences": "CEO at Acme | CTO at Globex"
        })));
        assert_eq!(p.current_experience, "");
        assert_eq!(p.additional_experience[0], "Analyst");
    }

    #[test]
    fn company_info_is_an_or_over_the_fixed_set() {
        assert!(!normalize(&raw(json!({ "Full Name": "Jane" }))).has_company_info());
        assert!(normalize(&raw(json!({ "Company Last Post 3": "Hello" }))).has_company_info());
        assert!(normalize(&raw(json!({ "lastEvents": "Expo 2024" }))).has_company_info());
        // Logo, phone, state and country alone do not open a company page.
        assert!(!normalize(&raw(json!({
            "Company Logo URL": "https://x/logo.png",
            "Contact Corporate Phone": "555",
            "Company State": "CA",
            "Company Country": "USA"
        })))
        .has_company_info());
    }
}
