//! The admin edit form and its mapping to stored records.

use serde::{Deserialize, Serialize};

use super::skills;
use crate::datastore::models::{default_rating, string_or_number};
use crate::datastore::{Availability, DeveloperProfile, DeveloperRecord};
use crate::error::FlowError;

const DEFAULT_LOCATION: &str = "Mogadishu, Somalia";

/// Form-shaped developer input: skills as one delimited string, numbers as
/// the raw text the user typed (JSON numbers are accepted too).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeveloperForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub bio: String,
    pub skills: String,
    pub photo_url: String,
    pub github_url: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub availability_status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub experience_years: String,
    #[serde(deserialize_with = "string_or_number")]
    pub hourly_rate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub projects_completed: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rating: String,
}

impl Default for DeveloperForm {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            location: DEFAULT_LOCATION.to_string(),
            bio: String::new(),
            skills: String::new(),
            photo_url: String::new(),
            github_url: String::new(),
            linkedin_url: String::new(),
            portfolio_url: String::new(),
            availability_status: Availability::default().to_string(),
            experience_years: "0".to_string(),
            hourly_rate: "0".to_string(),
            projects_completed: "0".to_string(),
            rating: default_rating().to_string(),
        }
    }
}

impl DeveloperForm {
    /// Pre-fill the form from a stored profile.
    pub fn from_profile(profile: &DeveloperProfile) -> Self {
        let r = &profile.record;
        Self {
            full_name: r.full_name.clone(),
            email: r.email.clone().unwrap_or_default(),
            phone: r.phone.clone().unwrap_or_default(),
            location: r.location.clone().unwrap_or_default(),
            bio: r.bio.clone().unwrap_or_default(),
            skills: skills::join_for_edit(&r.skills),
            photo_url: r.photo_url.clone().unwrap_or_default(),
            github_url: r.github_url.clone().unwrap_or_default(),
            linkedin_url: r.linkedin_url.clone().unwrap_or_default(),
            portfolio_url: r.portfolio_url.clone().unwrap_or_default(),
            availability_status: r.availability_status.to_string(),
            experience_years: r.experience_years.to_string(),
            hourly_rate: r.hourly_rate.to_string(),
            projects_completed: r.projects_completed.to_string(),
            rating: r.rating.to_string(),
        }
    }

    /// Shape the form into the stored record. Full name is the only
    /// required field.
    pub fn into_record(self) -> Result<DeveloperRecord, FlowError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(FlowError::validation("Full name is required"));
        }

        Ok(DeveloperRecord {
            full_name: full_name.to_string(),
            email: optional(&self.email),
            phone: optional(&self.phone),
            location: optional(&self.location),
            bio: optional(&self.bio),
            skills: skills::parse_from_edit(&self.skills),
            photo_url: optional(&self.photo_url),
            github_url: optional(&self.github_url),
            linkedin_url: optional(&self.linkedin_url),
            portfolio_url: optional(&self.portfolio_url),
            availability_status: Availability::from(self.availability_status.as_str()),
            experience_years: parse_int_field(&self.experience_years),
            hourly_rate: parse_int_field(&self.hourly_rate),
            projects_completed: parse_int_field(&self.projects_completed),
            rating: parse_rating(&self.rating),
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Longest numeric prefix of `input`: optional sign, digits, and (when
/// `fraction` is set) a decimal part.
fn numeric_prefix(input: &str, fraction: bool) -> &str {
    let bytes = input.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if fraction && end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    &input[..end]
}

/// Integer form fields: leading integer of the trimmed text, else 0.
pub fn parse_int_field(input: &str) -> i64 {
    numeric_prefix(input.trim(), false).parse().unwrap_or(0)
}

/// Rating: leading decimal number of the trimmed text, else 5.0. An
/// explicit zero stays zero.
pub fn parse_rating(input: &str) -> f64 {
    numeric_prefix(input.trim(), true)
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .unwrap_or_else(default_rating)
}
