//! Structured resume and job template types, and their model-input text.

use serde::{Deserialize, Deserializer, Serialize};

use crate::text::strip_markdown;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    /// Years spent in the role.
    pub years: f32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Beginner / Intermediate / Expert, free-form.
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// A candidate resume as submitted by callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub candidate_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub experience: Vec<Experience>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<Skill>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub certifications: Vec<String>,
}

impl Resume {
    /// Flattens the resume into the text the embedding model sees.
    ///
    /// Only summary, experience and skills contribute; each section is a
    /// line and empty sections are left out.
    pub fn to_text(&self) -> String {
        let mut parts = Vec::new();

        if let Some(summary) = non_blank(self.summary.as_deref()) {
            parts.push(format!("Summary: {summary}"));
        }

        let experience: Vec<String> = self
            .experience
            .iter()
            .map(|e| {
                [Some(e.title.as_str()), Some(e.company.as_str()), e.description.as_deref()]
                    .into_iter()
                    .filter_map(non_blank)
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .filter(|s| !s.is_empty())
            .collect();
        if !experience.is_empty() {
            parts.push(format!("Experience: {}", experience.join(" || ")));
        }

        let skills: Vec<&str> = self
            .skills
            .iter()
            .filter_map(|s| non_blank(Some(s.name.as_str())))
            .collect();
        if !skills.is_empty() {
            parts.push(format!("Skills: {}", skills.join(", ")));
        }

        parts.join("\n")
    }
}

/// A job description template used by multi-job ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTemplate {
    /// Jobs without an id are skipped by multi-job ranking.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
}

impl JobTemplate {
    /// Title, description, summary and a skills line, separated by blank
    /// lines. Markdown in the description is flattened.
    pub fn to_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(title) = non_blank(self.title.as_deref()) {
            parts.push(title.to_string());
        }
        if let Some(description) = non_blank(self.description.as_deref()) {
            parts.push(strip_markdown(description).trim().to_string());
        }
        if let Some(summary) = non_blank(self.summary.as_deref()) {
            parts.push(summary.to_string());
        }

        let skills: Vec<&str> = self
            .skills
            .iter()
            .filter_map(|s| non_blank(Some(s.as_str())))
            .collect();
        if !skills.is_empty() {
            parts.push(format!("Skills: {}", skills.join(", ")));
        }

        parts.retain(|p| !p.is_empty());
        parts.join("\n\n")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
