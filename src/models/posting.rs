//! Job posting data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Category;

/// A persisted job posting, one row in the `jobs` table.
///
/// Serialized field names follow the public API shape (`job_title`,
/// `job_type`, ...), which the original service exposed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct JobPosting {
    pub id: i64,

    #[serde(rename = "job_type")]
    pub category: Category,

    #[serde(rename = "job_title")]
    pub title: String,

    pub company_location: String,
    pub salary: String,
    pub posted: String,
    pub skills: String,
    pub eligible_years: String,
    pub apply_url: String,
    pub company_logo: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A posting as extracted from a listing card, before validation.
///
/// Parsing is permissive: fields the card lacks come back empty. Validation
/// into a [`PostingCandidate`] decides whether the record is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPosting {
    pub title: String,
    pub company_location: String,
    pub salary: String,
    pub posted: String,
    pub skills: String,
    pub eligible_years: String,
    pub apply_url: String,
    pub company_logo: String,
}

/// A validated posting ready for upsert, keyed by `(category, apply_url)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingCandidate {
    pub category: Category,
    pub title: String,
    pub company_location: String,
    pub salary: String,
    pub posted: String,
    pub skills: String,
    pub eligible_years: String,
    pub apply_url: String,
    pub company_logo: String,
}

impl PostingCandidate {
    /// Validate a raw record into an upsert candidate.
    ///
    /// A record without an apply link has no identity and is rejected;
    /// a record without a title is noise from a mis-matched selector.
    pub fn from_raw(category: Category, raw: RawPosting) -> Result<Self, ParseIssue> {
        if raw.apply_url.trim().is_empty() {
            return Err(ParseIssue::MissingApplyUrl);
        }
        if raw.title.trim().is_empty() {
            return Err(ParseIssue::MissingTitle);
        }

        let salary = if raw.salary.trim().is_empty() {
            "Not specified".to_string()
        } else {
            raw.salary
        };

        Ok(Self {
            category,
            title: raw.title,
            company_location: raw.company_location,
            salary,
            posted: raw.posted,
            skills: raw.skills,
            eligible_years: raw.eligible_years,
            apply_url: raw.apply_url,
            company_logo: raw.company_logo,
        })
    }
}

/// Why a raw record was dropped during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseIssue {
    MissingApplyUrl,
    MissingTitle,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawPosting {
        RawPosting {
            title: "Backend Engineer".to_string(),
            company_location: "Acme Corp, Bengaluru".to_string(),
            salary: "INR 12-18 LPA".to_string(),
            posted: "2 days ago".to_string(),
            skills: "Rust, SQL, Docker".to_string(),
            eligible_years: "2023, 2024".to_string(),
            apply_url: "https://www.talentd.in/apply/123".to_string(),
            company_logo: "https://cdn.talentd.in/logos/acme.png".to_string(),
        }
    }

    #[test]
    fn valid_raw_becomes_candidate() {
        let candidate = PostingCandidate::from_raw(Category::Regular, sample_raw()).unwrap();
        assert_eq!(candidate.category, Category::Regular);
        assert_eq!(candidate.title, "Backend Engineer");
        assert_eq!(candidate.apply_url, "https://www.talentd.in/apply/123");
    }

    #[test]
    fn missing_apply_url_is_rejected() {
        let mut raw = sample_raw();
        raw.apply_url = "  ".to_string();
        assert_eq!(
            PostingCandidate::from_raw(Category::Regular, raw),
            Err(ParseIssue::MissingApplyUrl)
        );
    }

    #[test]
    fn missing_title_is_rejected() {
        let mut raw = sample_raw();
        raw.title = String::new();
        assert_eq!(
            PostingCandidate::from_raw(Category::Freshers, raw),
            Err(ParseIssue::MissingTitle)
        );
    }

    #[test]
    fn empty_salary_defaults_to_not_specified() {
        let mut raw = sample_raw();
        raw.salary = String::new();
        let candidate = PostingCandidate::from_raw(Category::Internships, raw).unwrap();
        assert_eq!(candidate.salary, "Not specified");
    }
}
