//! Prompt composition.
//!
//! A [`Mode`] selects one of four fixed persona templates. Modes are parsed
//! from strings once, at the caller's edge; [`PromptComposer::compose`]
//! itself cannot fail.
//!
//! Templates recognise seven placeholders:
//!
//! | Placeholder | Filled from |
//! |---|---|
//! | `{persona}` | `persona.name` |
//! | `{full_name}` | `persona.full_name` |
//! | `{profile}` | `persona.profile` |
//! | `{highlights}` | `persona.highlights` |
//! | `{context}` | retrieved context block |
//! | `{chat_history}` | rendered conversation memory |
//! | `{question}` | the user's question |
//!
//! Substitution is a single left-to-right pass: text inserted for one
//! placeholder is never scanned again, so braces inside a question or a
//! retrieved chunk come through verbatim.

use std::fmt;
use std::str::FromStr;

use crate::config::PersonaConfig;
use crate::error::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Interview,
    Storytelling,
    FastFacts,
    HumbleBrag,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Interview,
        Mode::Storytelling,
        Mode::FastFacts,
        Mode::HumbleBrag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Interview => "interview",
            Mode::Storytelling => "storytelling",
            Mode::FastFacts => "fast_facts",
            Mode::HumbleBrag => "humble_brag",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Interview => "Interview Mode",
            Mode::Storytelling => "Personal Storytelling",
            Mode::FastFacts => "Fast Facts",
            Mode::HumbleBrag => "Confident Mode",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Interview => "Professional, concise answers",
            Mode::Storytelling => "Detailed, narrative responses",
            Mode::FastFacts => "Quick bullet points",
            Mode::HumbleBrag => "Self-promotional tone",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Mode::Interview => INTERVIEW,
            Mode::Storytelling => STORYTELLING,
            Mode::FastFacts => FAST_FACTS,
            Mode::HumbleBrag => HUMBLE_BRAG,
        }
    }
}

impl FromStr for Mode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RagError::InvalidMode(s.to_string()))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SHARED_TAIL: &str = "Context from my documents: {context}
Previous conversation: {chat_history}
Question: {question}
";

const INTERVIEW: &str = "You are {full_name}, {profile}.

PERSONALITY: Respond as ME - confident, articulate, and professional but approachable. I speak naturally
about my technical expertise and experiences.

RESPONSE STYLE for Interview Mode:
- Concise, professional, and informative
- Focus on achievements and technical skills
- Structure answers logically
- Show enthusiasm for technology and learning
- Always speak in first person

KEY HIGHLIGHTS to weave in naturally:
{highlights}

{tail}
Respond as {persona} in a professional interview setting:
";

const STORYTELLING: &str = "You are {full_name}, sharing your journey and experiences in a more personal, narrative way.

PERSONALITY: I'm reflective and thoughtful, sharing the story behind my technical growth,
challenges I've overcome, and lessons learned.

RESPONSE STYLE for Storytelling Mode:
- Longer, more reflective answers
- Include personal anecdotes and learning moments
- Show the journey, not just the destination
- Narrative tone with emotional depth
- Connect experiences to broader themes

{tail}
Tell my story as {persona} with depth and reflection:
";

const FAST_FACTS: &str = "You are {full_name}, providing quick, digestible information about my background and skills.

RESPONSE STYLE for Fast Facts Mode:
- Bullet points and structured lists
- TL;DR format
- Key information upfront
- Easy to scan and digest
- Still personal and authentic

{tail}
Provide a fast facts response as {persona}:
";

const HUMBLE_BRAG: &str = "You are {full_name}, confidently highlighting your achievements and potential.

RESPONSE STYLE for Humble Brag Mode:
- Confident and self-promotional (while staying truthful)
- Emphasize achievements and unique strengths
- Show ambition and capability
- Professional confidence
- Back claims with concrete examples

{tail}
Respond as {persona} with confident self-promotion:
";

/// Fills persona templates. Pure: no I/O, no state beyond the persona.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    persona: PersonaConfig,
}

impl PromptComposer {
    pub fn new(persona: PersonaConfig) -> Self {
        Self { persona }
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn compose(&self, mode: Mode, context: &str, chat_history: &str, question: &str) -> String {
        let template = mode.template().replacen("{tail}", SHARED_TAIL, 1);
        render(&template, |name| match name {
            "persona" => Some(self.persona.name.as_str()),
            "full_name" => Some(self.persona.full_name.as_str()),
            "profile" => Some(self.persona.profile.as_str()),
            "highlights" => Some(self.persona.highlights.as_str()),
            "context" => Some(context),
            "chat_history" => Some(chat_history),
            "question" => Some(question),
            _ => None,
        })
    }

    /// Like [`compose`](Self::compose), but takes the mode by name.
    pub fn compose_named(
        &self,
        mode: &str,
        context: &str,
        chat_history: &str,
        question: &str,
    ) -> Result<String, RagError> {
        let mode: Mode = mode.parse()?;
        Ok(self.compose(mode, context, chat_history, question))
    }
}

/// Replace `{name}` placeholders known to `lookup`; anything else,
/// including unmatched braces, is copied through.
fn render<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match lookup(&after[..close]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
