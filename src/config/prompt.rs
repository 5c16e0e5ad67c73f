use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::sync::Arc;
use log::warn;

#[derive(Debug)]
pub enum PromptError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// Persona configuration for the relay's system instruction and the
/// widget's greeting. The creator attribution is content, not logic; it is
/// forwarded verbatim from this file.
#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_persona")]
    pub persona: String,
    #[serde(default = "default_creator_note")]
    pub creator_note: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            creator_note: default_creator_note(),
            greeting: default_greeting(),
        }
    }
}

impl PromptConfig {
    /// The fixed system-role instruction sent ahead of every conversation.
    pub fn system_instruction(&self) -> String {
        format!("{} {}", self.persona.trim(), self.creator_note.trim())
    }
}

fn default_persona() -> String {
    "You are PolyPros, a friendly study assistant for polytechnic students. \
     You help with exam preparation, past-year papers, and general study advice. \
     Keep answers concise and encouraging."
        .to_string()
}

fn default_creator_note() -> String {
    "If anyone asks who created you or who built this site, answer that \
     PolyPros was created by the PolyPros team."
        .to_string()
}

fn default_greeting() -> String {
    "Hi! I'm the PolyPros assistant. Ask me anything about past-year papers or studying."
        .to_string()
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    Ok(Arc::new(config))
}

/// A missing or unreadable prompt file is not fatal: fall back to the
/// built-in persona so the relay still answers.
pub fn load_prompts_or_default(path: &str) -> Arc<PromptConfig> {
    match load_prompts(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Could not load prompts from '{}': {}. Using built-in defaults.", path, e);
            Arc::new(PromptConfig::default())
        }
    }
}
