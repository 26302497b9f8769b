//! Declarative schemas for the four resume sections the interviewer can fill.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::interview::schema::{DomainSchema, FieldSpec, HeaderStyle, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Experience,
    Education,
    Achievement,
    Skills,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Experience,
        Domain::Education,
        Domain::Achievement,
        Domain::Skills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Experience => "experience",
            Domain::Education => "education",
            Domain::Achievement => "achievement",
            Domain::Skills => "skills",
        }
    }

    /// Builds the schema for this domain under the given retry policy.
    pub fn schema(self, retries: RetryPolicy) -> DomainSchema {
        match self {
            Domain::Experience => DomainSchema::new(
                self,
                "experience",
                "your professional experience",
                "Let's talk about one of your professional experiences. \
                 What was your job title for the role you'd like to add?",
                HeaderStyle::At {
                    primary: "title",
                    secondary: "organization_name",
                },
                EXPERIENCE_FIELDS,
                retries,
            ),
            Domain::Education => DomainSchema::new(
                self,
                "education",
                "your education",
                "Let's talk about your education. \
                 What's the name of the school, college, or university you'd like to add?",
                HeaderStyle::At {
                    primary: "degree_or_course",
                    secondary: "institution_name",
                },
                EDUCATION_FIELDS,
                retries,
            ),
            Domain::Achievement => DomainSchema::new(
                self,
                "achievement",
                "your achievements",
                "Let's add an achievement. What type of achievement is it? \
                 (e.g., Certification, Competition, Award)",
                HeaderStyle::From {
                    primary: "achievement_title",
                    secondary: "organization_name",
                },
                ACHIEVEMENT_FIELDS,
                retries,
            ),
            Domain::Skills => DomainSchema::new(
                self,
                "skill group",
                "your skills",
                "Let's capture one of your skill areas. \
                 What's the main domain, for example Frontend Development, AI/ML, or UI/UX?",
                HeaderStyle::Single {
                    primary: "skill_domain",
                },
                SKILLS_FIELDS,
                retries,
            ),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("unknown interview domain '{s}'"))
    }
}

static EXPERIENCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", "Your job title (e.g., 'Software Engineer')")
        .aka(&["job title", "position"])
        .acks(&["Great title.", "Got it, thanks.", "Perfect, noted."]),
    FieldSpec::required("organization_name", "The name of the company or organization")
        .aka(&["company", "organization", "employer"])
        .acks(&["Understood.", "Got it.", "Thanks for confirming.", "Noted."]),
    FieldSpec::required("type", "The type of employment (e.g., 'Full-time', 'Internship')")
        .aka(&["employment type"])
        .acks(&["Good to know.", "Got it, that helps frame it.", "Understood the context."]),
    FieldSpec::required("timeline", "When you worked there (start and end dates)")
        .aka(&["dates", "duration"])
        .acks(&["Got the timeframe.", "Thank you for the dates.", "Noted the duration."]),
    FieldSpec::optional(
        "what_you_did",
        "A high-level summary of what you accomplished or were responsible for",
    )
    .aka(&["summary"])
    .acks(&["That sounds like important work.", "I see, thank you for that summary."]),
    FieldSpec::optional(
        "how_you_did_it",
        "The methodologies or processes you followed (e.g., 'Agile', 'Scrum')",
    )
    .aka(&["methodology", "process"])
    .acks(&["Good approach.", "That's a solid methodology.", "Makes sense."]),
    FieldSpec::optional(
        "domain_or_field",
        "The industry or domain (e.g., 'FinTech', 'E-commerce', 'Healthcare')",
    )
    .aka(&["industry", "domain"])
    .acks(&["Interesting field.", "Understood the industry."]),
    FieldSpec::optional(
        "tools_and_technologies",
        "Languages, frameworks, software, or tools you used",
    )
    .list()
    .aka(&["tools", "technologies", "tech stack"])
    .acks(&["Nice tech stack.", "Good choice of tools.", "Solid toolset."]),
    FieldSpec::required(
        "role_and_responsibilities",
        "A more detailed list of your specific duties",
    )
    .list()
    .aka(&["responsibilities", "role"])
    .acks(&["That's a clear set of responsibilities.", "Appreciate the detail."]),
    FieldSpec::optional(
        "outcomes_or_achievements",
        "Key results, impacts, or metrics you achieved (e.g., 'Increased sales by 10%')",
    )
    .list()
    .aka(&["outcomes", "achievements", "results"])
    .acks(&["Impressive results!", "That's a great achievement.", "Excellent outcome."]),
    FieldSpec::optional(
        "skills_gained",
        "Specific hard or soft skills you learned or honed in this role",
    )
    .list()
    .aka(&["skills"])
    .acks(&["Those are valuable skills.", "Great takeaways from the role."]),
];

static EDUCATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "institution_name",
        "Name of the school, college, or university",
    )
    .aka(&["institution", "school", "college", "university"]),
    FieldSpec::required(
        "degree_or_course",
        "Degree, program, or course name (e.g., B.Tech in Computer Science)",
    )
    .aka(&["degree", "program"]),
    FieldSpec::required(
        "field_of_study",
        "Major or specialization (e.g., Computer Science)",
    )
    .aka(&["major", "specialization"]),
    FieldSpec::optional(
        "education_level",
        "Level of education (e.g., High School, Undergraduate, Postgraduate)",
    )
    .aka(&["level"]),
    FieldSpec::required(
        "timeline",
        "Duration (start month/year to end month/year or 'Present')",
    )
    .aka(&["dates", "duration"]),
    FieldSpec::optional(
        "grade_or_cgpa",
        "Final grade, CGPA, or percentage (e.g., 3.8/4.0, 85%)",
    )
    .aka(&["grade", "gpa", "cgpa"]),
    FieldSpec::optional("location", "City and country of the institution"),
    FieldSpec::optional(
        "projects_or_research",
        "Any academic projects, dissertations, or research work",
    )
    .list()
    .aka(&["projects", "research"]),
    FieldSpec::optional(
        "activities_and_societies",
        "Clubs, events, or societies participated in",
    )
    .list()
    .aka(&["activities", "societies", "clubs"]),
    FieldSpec::optional(
        "certificates_or_courses",
        "Related certifications or short courses completed",
    )
    .list()
    .aka(&["certificates", "courses"]),
    FieldSpec::optional("key_learnings", "Main concepts, areas, or skills learned")
        .list()
        .aka(&["learnings"]),
    FieldSpec::optional(
        "achievements_or_awards",
        "Notable recognitions, honors, or awards (e.g., Dean's List)",
    )
    .list()
    .aka(&["awards", "honors"]),
];

static ACHIEVEMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "achievement_type",
        "Category of the achievement (e.g., Certification, Competition, Award)",
    )
    .aka(&["type", "category"]),
    FieldSpec::required(
        "achievement_title",
        "Name or title of the achievement (e.g., Winner - Smart India Hackathon 2024)",
    )
    .aka(&["title", "name"]),
    FieldSpec::optional(
        "achievement_domain",
        "Field or area (e.g., AI/ML, Web Development)",
    )
    .aka(&["domain", "area"]),
    FieldSpec::required(
        "organization_name",
        "Name of the conducting body (e.g., Google, NPTEL)",
    )
    .aka(&["organization", "organizer", "issuer"]),
    FieldSpec::required(
        "timeline",
        "Month and year of the achievement (e.g., March 2024)",
    )
    .aka(&["date", "when"]),
    FieldSpec::optional(
        "role_in_achievement",
        "Role played (e.g., Team Leader, Participant)",
    )
    .aka(&["role"]),
    FieldSpec::required(
        "outcome_or_result",
        "Result or recognition (e.g., Completed, Winner, Finalist)",
    )
    .aka(&["outcome", "result"]),
    FieldSpec::optional(
        "skills_demonstrated",
        "Key skills or technologies used (e.g., Python, Leadership)",
    )
    .list()
    .aka(&["skills"]),
    FieldSpec::optional("description", "Short summary of what the achievement was about")
        .aka(&["summary"]),
    FieldSpec::optional(
        "certificate_link",
        "URL to the certificate or proof (optional)",
    )
    .aka(&["link", "certificate", "url"]),
];

static SKILLS_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "skill_domain",
        "Main area of expertise (e.g., Frontend Development, AI/ML, Backend, UI/UX)",
    )
    .aka(&["domain", "area"]),
    FieldSpec::required(
        "skills_list",
        "Specific skills within this domain (e.g., React, JavaScript, HTML, CSS)",
    )
    .list()
    .aka(&["skills"]),
    FieldSpec::required(
        "proficiency_level",
        "Overall expertise in this domain (e.g., Beginner, Intermediate, Advanced, Expert)",
    )
    .aka(&["proficiency", "level"]),
    FieldSpec::optional(
        "how_skills_were_used",
        "Where and how these skills were applied",
    )
    .aka(&["usage", "how used"]),
    FieldSpec::optional(
        "projects_using_this_skill",
        "Project titles where these skills were used",
    )
    .list()
    .aka(&["projects"]),
    FieldSpec::optional(
        "experience_type",
        "Context in which the skills were gained (e.g., Academic Project, Internship, Self-learning)",
    )
    .aka(&["context"]),
    FieldSpec::optional("confidence_rating", "Self-assessed confidence level (1-10)")
        .aka(&["confidence", "rating"]),
    FieldSpec::optional(
        "tools_or_frameworks",
        "Supporting libraries or tools (e.g., VS Code, GitHub, Redux, Figma)",
    )
    .list()
    .aka(&["tools", "frameworks"]),
    FieldSpec::optional(
        "certifications_or_proof",
        "Proof or certificate links (e.g., https://coursera.org/react-cert)",
    )
    .list()
    .aka(&["certifications", "proof"]),
    FieldSpec::optional(
        "key_achievements_using_this_skill",
        "Results achieved with these skills (e.g., Built 3 production-ready web apps)",
    )
    .list()
    .aka(&["achievements"]),
    FieldSpec::optional(
        "learning_sources",
        "Where the skill was learned (e.g., Coursera, College Course, YouTube)",
    )
    .list()
    .aka(&["sources"]),
    FieldSpec::optional(
        "practical_application_example",
        "A brief example of a problem solved with these skills",
    )
    .aka(&["example"]),
];
