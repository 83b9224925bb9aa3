//! TOML configuration.
//!
//! Every section except `[corpus]` and `[index]` is optional; missing
//! fields fall back to the defaults below. API keys are never read from
//! this file, only from the environment.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

fn default_include_globs() -> Vec<String> {
    vec!["*.pdf".to_string(), "*.txt".to_string(), "*.md".to_string()]
}
fn default_min_content_chars() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            history_turns: default_history_turns(),
        }
    }
}

fn default_k() -> usize {
    4
}
fn default_history_turns() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub static_text: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            url: None,
            timeout_secs: default_generation_timeout_secs(),
            static_text: None,
        }
    }
}

fn default_generation_provider() -> String {
    "gemini".to_string()
}
fn default_generation_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}
fn default_generation_timeout_secs() -> u64 {
    60
}

/// Who the assistant speaks as.
#[derive(Debug, Deserialize, Clone)]
pub struct PersonaConfig {
    /// Short name used as the assistant's label in rendered history.
    #[serde(default = "default_persona_name")]
    pub name: String,
    #[serde(default = "default_persona_full_name")]
    pub full_name: String,
    /// One or two sentences of background, spoken in first person.
    #[serde(default = "default_persona_profile")]
    pub profile: String,
    /// Skills, projects and values to weave into interview answers.
    #[serde(default = "default_persona_highlights")]
    pub highlights: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            full_name: default_persona_full_name(),
            profile: default_persona_profile(),
            highlights: default_persona_highlights(),
        }
    }
}

fn default_persona_name() -> String {
    "Yanga".to_string()
}
fn default_persona_full_name() -> String {
    "Yanga Rubushe".to_string()
}
fn default_persona_profile() -> String {
    "a BSc graduate in Computer Science and Statistics, currently pursuing Honours at UWC, \
     and an ALX Software Engineering graduate specializing in backend development"
        .to_string()
}
fn default_persona_highlights() -> String {
    "- Technical Skills: Java, Python, R, SAS, Machine Learning, AI, TypeScript, Node.js, SQL, NoSQL, Git, Docker, RESTful APIs\n\
     - Projects: NexGen Learn (AI-powered learning platform), CineNex (Netflix clone)\n\
     - Values: Resilience, curiosity, continuous learning\n\
     - Education: BSc Computer Science & Statistics, Honours student, ALX graduate"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: default_typing_delay_ms(),
        }
    }
}

fn default_typing_delay_ms() -> u64 {
    3
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.corpus.min_content_chars == 0 {
        bail!("corpus.min_content_chars must be > 0");
    }
    if config.corpus.include_globs.is_empty() {
        bail!("corpus.include_globs must list at least one pattern");
    }
    let corpus_dir = lexical_absolute(&config.corpus.dir);
    let index_dir = lexical_absolute(&config.index.dir);
    if corpus_dir.starts_with(&index_dir) {
        bail!(
            "index.dir ({}) must not be or contain corpus.dir ({})",
            config.index.dir.display(),
            config.corpus.dir.display()
        );
    }

    if config.retrieval.k == 0 {
        bail!("retrieval.k must be >= 1");
    }
    if config.retrieval.history_turns == 0 {
        bail!("retrieval.history_turns must be >= 1");
    }

    let emb = &config.embedding;
    if emb.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    match emb.provider.as_str() {
        "local" | "hash" => {}
        "openai" | "ollama" => {
            if emb.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    emb.provider
                );
            }
            if emb.dims.is_none() || emb.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    emb.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be local, openai, ollama, or hash.",
            other
        ),
    }
    if emb.dims == Some(0) {
        bail!("embedding.dims must be > 0");
    }

    match config.generation.provider.as_str() {
        "gemini" | "ollama" | "disabled" => {}
        "static" => {
            if config.generation.static_text.is_none() {
                bail!("generation.static_text must be set when provider is 'static'");
            }
        }
        other => bail!(
            "Unknown generation provider: '{}'. Must be gemini, ollama, static, or disabled.",
            other
        ),
    }

    Ok(())
}

/// Absolute form of `path` with `.` and `..` resolved, without touching
/// the filesystem.
fn lexical_absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[corpus]
dir = "./data"

[index]
dir = "./db"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(cfg.corpus.min_content_chars, 50);
        assert_eq!(cfg.corpus.include_globs.len(), 3);
        assert_eq!(cfg.embedding.provider, "local");
        assert_eq!(cfg.retrieval.k, 4);
        assert_eq!(cfg.retrieval.history_turns, 6);
        assert_eq!(cfg.generation.provider, "gemini");
        assert_eq!(cfg.generation.model, "gemini-2.0-flash-exp");
        assert_eq!(cfg.persona.name, "Yanga");
        assert_eq!(cfg.chat.typing_delay_ms, 3);
    }

    #[test]
    fn missing_corpus_is_rejected() {
        let err = parse_config("[index]\ndir = \"./db\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("corpus"));
    }

    #[test]
    fn unknown_embedding_provider_is_rejected() {
        let toml = format!("{}\n[embedding]\nprovider = \"magic\"\n", MINIMAL);
        let err = parse_config(&toml).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn remote_embedding_requires_model_and_dims() {
        let toml = format!("{}\n[embedding]\nprovider = \"openai\"\n", MINIMAL);
        assert!(parse_config(&toml).is_err());

        let toml = format!(
            "{}\n[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 1536\n",
            MINIMAL
        );
        assert!(parse_config(&toml).is_ok());
    }

    #[test]
    fn static_generation_requires_text() {
        let toml = format!("{}\n[generation]\nprovider = \"static\"\n", MINIMAL);
        assert!(parse_config(&toml).is_err());

        let toml = format!(
            "{}\n[generation]\nprovider = \"static\"\nstatic_text = \"hi\"\n",
            MINIMAL
        );
        assert!(parse_config(&toml).is_ok());
    }

    #[test]
    fn zero_k_is_rejected() {
        let toml = format!("{}\n[retrieval]\nk = 0\n", MINIMAL);
        assert!(parse_config(&toml).is_err());
    }

    #[test]
    fn index_dir_must_not_hold_corpus() {
        for (corpus, index) in [
            ("./data", "./data"),
            ("./data", "data/"),
            ("./data", "."),
            ("/srv/codex/corpus", "/srv/codex"),
            ("./data", "./db/../data"),
        ] {
            let toml = format!("[corpus]\ndir = \"{}\"\n\n[index]\ndir = \"{}\"\n", corpus, index);
            let err = parse_config(&toml).unwrap_err();
            assert!(err.to_string().contains("index.dir"), "{} / {}", corpus, index);
        }

        let toml = "[corpus]\ndir = \"./data\"\n\n[index]\ndir = \"./data/db\"\n";
        assert!(parse_config(toml).is_ok());
        let toml = "[corpus]\ndir = \"./data\"\n\n[index]\ndir = \"./database\"\n";
        assert!(parse_config(toml).is_ok());
    }

    #[test]
    fn example_config_parses() {
        let cfg = parse_config(include_str!("../config/codex.example.toml")).unwrap();
        assert_eq!(cfg.embedding.model.as_deref(), Some("all-minilm-l6-v2"));
        assert!(cfg.persona.highlights.starts_with("- Technical Skills:"));
    }
}
