//! Job feed categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The three job-listing feed partitions on talentd.in.
///
/// Category is part of the natural key: the same apply URL appearing in two
/// feeds is two distinct postings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Category {
    Regular,
    Freshers,
    Internships,
}

impl Category {
    /// All categories, in ingestion order.
    pub const ALL: [Category; 3] = [Category::Regular, Category::Freshers, Category::Internships];

    /// Stable lowercase identifier, as stored and as accepted in `job_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Regular => "regular",
            Category::Freshers => "freshers",
            Category::Internships => "internships",
        }
    }

    /// Path of the category's feed relative to the site base URL.
    pub fn feed_path(&self) -> &'static str {
        match self {
            Category::Regular => "jobs",
            Category::Freshers => "jobs/freshers",
            Category::Internships => "jobs/internships",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regular" => Ok(Category::Regular),
            "freshers" => Ok(Category::Freshers),
            "internships" => Ok(Category::Internships),
            other => Err(AppError::bad_request(format!(
                "invalid job type '{other}', expected regular, freshers or internships"
            ))),
        }
    }
}
