//! Role catalog: one prompt template per kind of analysis.
//!
//! Every call to the analysis service is made on behalf of a [`Role`]. A role
//! fixes the system instruction (the reviewer persona) and the template the
//! request text is rendered from. The six specialized roles run against a
//! whole-codebase document, [`Role::FileAnalysis`] runs once per file and
//! [`Role::Synthesis`] produces the consolidated report.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Kind of analysis requested from the service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Architecture,
    Quality,
    Documentation,
    Business,
    Legal,
    AiPipeline,
    FileAnalysis,
    Synthesis,
}

impl Role {
    /// The whole-document analyses, in the order they run.
    pub const SPECIALIZED: [Role; 6] = [
        Role::Architecture,
        Role::Quality,
        Role::Documentation,
        Role::Business,
        Role::Legal,
        Role::AiPipeline,
    ];

    /// Short human-readable name.
    pub fn title(self) -> &'static str {
        match self {
            Role::Architecture => "Architecture",
            Role::Quality => "Quality and Testing",
            Role::Documentation => "Documentation",
            Role::Business => "Business Viability",
            Role::Legal => "Legal and Compliance",
            Role::AiPipeline => "AI Pipeline Optimization",
            Role::FileAnalysis => "File Analysis",
            Role::Synthesis => "Consolidated Report",
        }
    }

    /// Markdown heading placed above this role's output.
    pub fn heading(self) -> String {
        format!("# {} Analysis", self.title())
    }

    /// Persona sent as the system instruction.
    pub fn system_instruction(self) -> &'static str {
        match self {
            Role::Architecture | Role::FileAnalysis | Role::Synthesis => {
                "You are a senior software architect with more than ten years of experience in \
                 distributed systems, external API integrations and SaaS architectures. You know \
                 patterns such as Repository, Factory and Observer and rate-limiting strategies \
                 for third-party APIs."
            }
            Role::Quality => {
                "You are a quality engineer specialized in test automation, static analysis and \
                 CI/CD pipelines, with experience testing API integrations and mocking external \
                 services."
            }
            Role::Documentation => {
                "You are a senior technical writer for open-source and SaaS projects who writes \
                 documentation that works for junior developers and senior architects alike."
            }
            Role::Business => {
                "You are a strategic product manager with eight years launching automation and \
                 digital marketing products, experienced in MVP definition, pricing and B2B user \
                 journeys."
            }
            Role::Legal => {
                "You are a technology lawyer focused on third-party API terms, data protection \
                 (LGPD/GDPR) and the legal risks of automation."
            }
            Role::AiPipeline => {
                "You are an AI engineer specialized in NLP and LLM integrations, prompt \
                 optimization, retrieval-augmented generation and inference cost control."
            }
        }
    }

    /// Render the request text for this role.
    ///
    /// `subject` names what is analyzed (a relative path for
    /// [`Role::FileAnalysis`]); `body` is the material itself.
    pub fn prompt(self, subject: &str, body: &str) -> String {
        match self {
            Role::Architecture => specialized(
                "Provide a deep architectural analysis",
                &[
                    "CURRENT ARCHITECTURE: describe the architectural pattern in use",
                    "INTEGRATIONS: assess the integrations with external APIs",
                    "DATA FLOW: map the data flow end to end",
                    "SCALABILITY: identify bottlenecks and points of failure",
                    "DESIGN PATTERNS: list the patterns used and the ones missing",
                    "SUGGESTED REFACTORINGS: propose concrete, prioritized improvements",
                ],
                "Be specific and technical in your recommendations.",
                body,
            ),
            Role::Quality => specialized(
                "Provide a code quality assessment",
                &[
                    "TEST COVERAGE: assess unit, integration and end-to-end tests",
                    "CODE QUALITY: analyze complexity, duplication and code smells",
                    "SECURITY: identify vulnerabilities and risks",
                    "CI/CD PIPELINE: assess deployment practices",
                    "MONITORING: analyze logging and observability",
                    "TEST PLAN: suggest a complete testing strategy",
                ],
                "Give an overall quality score from 0 to 100.",
                body,
            ),
            Role::Documentation => specialized(
                "Audit the documentation",
                &[
                    "USER DOCUMENTATION: clarity for end users",
                    "TECHNICAL DOCUMENTATION: material for developers",
                    "API DOCS: documentation of endpoints and interfaces",
                    "ONBOARDING: ease of setup for new developers",
                    "EXAMPLES: quality of the practical examples",
                    "MAINTENANCE: how documentation is kept up to date",
                ],
                "Give a completeness score from 0 to 100.",
                body,
            ),
            Role::Business => specialized(
                "Assess the commercial viability",
                &[
                    "MARKET READINESS: maturity for a SaaS launch",
                    "COMPETITIVE ANALYSIS: comparison with existing solutions",
                    "VALUE PROPOSITION: unique differentiators",
                    "USER JOURNEY: the ideal user journey",
                    "MONETIZATION: suggested pricing models",
                    "GO-TO-MARKET: launch strategy",
                ],
                "Give a market readiness score from 0 to 100.",
                body,
            ),
            Role::Legal => specialized(
                "Assess the legal aspects",
                &[
                    "API COMPLIANCE: conformance with third-party API terms",
                    "DATA PRIVACY: LGPD/GDPR conformance",
                    "AUTOMATION RISKS: legal risks of automation",
                    "TERMS OF SERVICE: an adequate usage policy",
                    "LIABILITY: responsibilities and exposure",
                    "COMPLIANCE STRATEGY: a plan to reach conformance",
                ],
                "Give a compliance score from 0 to 100.",
                body,
            ),
            Role::AiPipeline => specialized(
                "Assess the artificial intelligence components",
                &[
                    "LLM INTEGRATION: how language models are used",
                    "PROMPT ENGINEERING: quality of the prompts",
                    "PERFORMANCE: latency and cost of AI APIs",
                    "PERSONALIZATION: personalization strategies",
                    "MODEL SELECTION: fitness of the chosen models",
                    "AI STRATEGY: roadmap of AI improvements",
                ],
                "Give an AI optimization score from 0 to 100.",
                body,
            ),
            Role::FileAnalysis => format!(
                "FILE ANALYSIS: {subject}\n\n\
                 Read the file content below carefully and write a report focused on:\n\
                 - The file's responsibility within the project\n\
                 - Coupling points and external dependencies\n\
                 - Complexity and refactoring suggestions\n\
                 - Security risks or bad practices\n\
                 - Test recommendations (unit/integration)\n\n\
                 Answer in markdown with: a 1-3 line summary, critical points and \
                 recommendations, test suggestions, and one quick win.\n\n\
                 File content:\n```\n{body}\n```"
            ),
            Role::Synthesis => format!(
                "Consolidate the following material about {subject} into a final, \
                 professional report.\n\n\
                 MATERIAL:\n{body}\n\n\
                 Structure the report as:\n\n\
                 ## EXECUTIVE SUMMARY\n\
                 - Overall project score (0-100)\n\
                 - Main strengths and weaknesses\n\
                 - Go/no-go recommendation\n\n\
                 ## FOR JUNIOR DEVELOPERS\n\
                 - Simple explanation of the architecture\n\
                 - Technical concepts with analogies\n\
                 - Clear steps to contribute\n\n\
                 ## FOR SENIOR DEVELOPERS\n\
                 - Deep technical analysis\n\
                 - Detailed flows\n\
                 - Critical architectural decisions and trade-offs\n\n\
                 ## STRATEGIC ROADMAP\n\
                 - Phase 1: critical fixes (0-3 months)\n\
                 - Phase 2: structural improvements (3-6 months)\n\
                 - Phase 3: expansion and optimization (6-12 months)\n\n\
                 ## QUICK WINS\n\
                 - High-impact, low-effort actions\n\n\
                 ## CRITICAL RISKS\n\
                 - Top 5 prioritized risks with mitigation plans\n\n\
                 Use clear, professional markdown with tables where useful."
            ),
        }
    }
}

fn specialized(task: &str, points: &[&str], closing: &str, body: &str) -> String {
    let mut prompt = format!("{task} of the following codebase report.\n\nCODEBASE REPORT:\n{body}\n\nCover:\n\n");
    for (i, point) in points.iter().enumerate() {
        prompt.push_str(&format!("{}. {point}\n", i + 1));
    }
    prompt.push('\n');
    prompt.push_str(closing);
    prompt
}
