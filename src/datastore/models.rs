//! Row types for the three tables the site touches.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A row of `admin_users`. Read-only from this application's side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct AdminCredential {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "admin".to_string()
}

/// Developer availability, stored in lowercase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Available,
    Busy,
    Unavailable,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Busy => write!(f, "busy"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            "unavailable" => Ok(Self::Unavailable),
            _ => Err(format!("Unknown availability: {}", s)),
        }
    }
}

impl From<&str> for Availability {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// A row of `developers` as the service returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeveloperProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub record: DeveloperRecord,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The writable columns of a `developers` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeveloperRecord {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    /// Either a URL or an embedded `data:image/...` payload
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability_status: Availability,
    #[serde(default, deserialize_with = "lenient_int")]
    pub experience_years: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub hourly_rate: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub projects_completed: i64,
    #[serde(default = "default_rating", deserialize_with = "lenient_rating")]
    pub rating: f64,
}

pub(crate) fn default_rating() -> f64 {
    5.0
}

/// A row of `contacts`. Insert-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Accept ids (and form numbers) sent either as JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D>(deserializer: D) -> Result<Availability, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| Availability::from(s.as_str()))
        .unwrap_or_default())
}

/// Column values as the hosted table may hand them back.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Str(String),
}

impl RawNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            RawNumber::Int(i) => Some(*i as f64),
            RawNumber::Float(f) => Some(*f),
            RawNumber::Str(s) => s.trim().parse().ok(),
        }
        .filter(|v: &f64| v.is_finite())
    }
}

/// Integer columns: null or unreadable becomes 0, fractions are truncated.
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Int(i)) => i,
        Some(raw) => raw.as_f64().map(|v| v.trunc() as i64).unwrap_or(0),
        None => 0,
    })
}

/// Rating column: null or unreadable becomes the default rating.
fn lenient_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawNumber>::deserialize(deserializer)?
        .and_then(|raw| raw.as_f64())
        .unwrap_or_else(default_rating))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_availability_parsing() {
        assert_eq!("busy".parse::<Availability>().unwrap(), Availability::Busy);
        assert_eq!(" Unavailable ".parse::<Availability>().unwrap(), Availability::Unavailable);
        assert!("on-vacation".parse::<Availability>().is_err());
        assert_eq!(Availability::from("on-vacation"), Availability::Available);
        assert_eq!(Availability::Busy.to_string(), "busy");
    }

    #[test]
    fn test_profile_from_service_row() {
        let row = json!({
            "id": 42,
            "full_name": "Amina Yusuf",
            "email": "amina@example.com",
            "skills": ["React", "Go"],
            "availability_status": "busy",
            "experience_years": 6,
            "hourly_rate": 40,
            "projects_completed": 31,
            "rating": 4.8,
            "created_at": "2024-05-01T10:00:00+00:00"
        });

        let profile: DeveloperProfile = serde_json::from_value(row).unwrap();
        assert_eq!(profile.id, "42");
        assert_eq!(profile.record.full_name, "Amina Yusuf");
        assert_eq!(profile.record.skills, vec!["React", "Go"]);
        assert_eq!(profile.record.availability_status, Availability::Busy);
        assert_eq!(profile.record.phone, None);
        assert_eq!(profile.created_at.as_deref(), Some("2024-05-01T10:00:00+00:00"));
    }

    #[test]
    fn test_profile_tolerates_null_columns() {
        let row = json!({
            "id": "b3c1",
            "full_name": "Omar Ali",
            "skills": null,
            "availability_status": null
        });

        let profile: DeveloperProfile = serde_json::from_value(row).unwrap();
        assert!(profile.record.skills.is_empty());
        assert_eq!(profile.record.availability_status, Availability::Available);
        assert_eq!(profile.record.rating, 5.0);
    }

    #[test]
    fn test_numeric_columns_tolerate_nulls_and_fractions() {
        let rows = json!([
            {
                "id": "n-1",
                "full_name": "Nasra",
                "experience_years": null,
                "hourly_rate": 25.5,
                "projects_completed": "14",
                "rating": null
            },
            {
                "id": "n-2",
                "full_name": "Bashir",
                "experience_years": 9,
                "hourly_rate": 60,
                "projects_completed": 40,
                "rating": 4
            }
        ]);

        let profiles: Vec<DeveloperProfile> = serde_json::from_value(rows).unwrap();
        assert_eq!(profiles.len(), 2);

        let first = &profiles[0].record;
        assert_eq!(first.experience_years, 0);
        assert_eq!(first.hourly_rate, 25);
        assert_eq!(first.projects_completed, 14);
        assert_eq!(first.rating, 5.0);

        let second = &profiles[1].record;
        assert_eq!(second.experience_years, 9);
        assert_eq!(second.hourly_rate, 60);
        assert_eq!(second.rating, 4.0);
    }

    #[test]
    fn test_admin_credential_defaults() {
        let row = json!({
            "id": "u-1",
            "email": "admin@example.com",
            "password_hash": "$argon2id$...",
            "is_active": true
        });

        let admin: AdminCredential = serde_json::from_value(row).unwrap();
        assert_eq!(admin.role, "admin");
        assert!(admin.full_name.is_none());
    }
}
