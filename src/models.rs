use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known OpenAI / Azure OpenAI deployments.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deployment {
    CodeDavinci002,
    TextDavinci003,
    Gpt35Turbo0301,
    Gpt35Turbo,
    Gpt35Turbo0301Azure,
    Gpt4_0314,
    Gpt4_32k_0314,
}

impl Deployment {
    pub const ALL: [Deployment; 7] = [
        Deployment::CodeDavinci002,
        Deployment::TextDavinci003,
        Deployment::Gpt35Turbo0301,
        Deployment::Gpt35Turbo,
        Deployment::Gpt35Turbo0301Azure,
        Deployment::Gpt4_0314,
        Deployment::Gpt4_32k_0314,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Deployment::CodeDavinci002 => "code-davinci-002",
            Deployment::TextDavinci003 => "text-davinci-003",
            Deployment::Gpt35Turbo0301 => "gpt-3.5-turbo-0301",
            Deployment::Gpt35Turbo => "gpt-3.5-turbo",
            Deployment::Gpt35Turbo0301Azure => "gpt-35-turbo-0301",
            Deployment::Gpt4_0314 => "gpt-4-0314",
            Deployment::Gpt4_32k_0314 => "gpt-4-32k-0314",
        }
    }

    /// Context window size in tokens.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Deployment::CodeDavinci002 => 8001,
            Deployment::TextDavinci003 => 4097,
            Deployment::Gpt35Turbo0301 | Deployment::Gpt35Turbo | Deployment::Gpt35Turbo0301Azure => 4096,
            Deployment::Gpt4_0314 | Deployment::Gpt4_32k_0314 => 8192,
        }
    }

    pub fn is_chat(&self) -> bool {
        !matches!(self, Deployment::CodeDavinci002 | Deployment::TextDavinci003)
    }

    pub fn from_name(name: &str) -> Result<Self> {
        if let Some(d) = Self::ALL.iter().find(|d| d.as_str() == name) {
            return Ok(*d);
        }
        let known: Vec<&str> = Self::ALL.iter().map(|d| d.as_str()).collect();
        bail!(
            "unknown deployment '{}', please choose one of these options: {}",
            name,
            known.join(", ")
        )
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Deployment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// A file the model proposes to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFile {
    #[serde(rename = "fileName")]
    pub name: String,
    #[serde(rename = "filePath")]
    pub path: String,
    #[serde(rename = "fileContent")]
    pub content: String,
}

impl AppFile {
    /// Decode a model reply into file descriptors.
    ///
    /// The reply must be a JSON array of `{fileName, filePath, fileContent}`
    /// objects. A single surrounding markdown code fence is tolerated.
    pub fn parse_list(text: &str) -> Result<Vec<AppFile>> {
        let cleaned = strip_code_fence(text);
        serde_json::from_str::<Vec<AppFile>>(&cleaned)
            .map_err(|e| anyhow!("couldn't parse OpenAI response: {}", e))
    }
}

/// Remove a leading ```lang line and a trailing ``` line, if both are present.
fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    let mut lines: Vec<&str> = trimmed.lines().collect();
    let fenced = lines.len() >= 2
        && lines.first().is_some_and(|l| l.trim_start().starts_with("```"))
        && lines.last().is_some_and(|l| l.trim() == "```");
    if !fenced {
        return trimmed.to_string();
    }
    lines.remove(0);
    lines.pop();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_table() {
        let expected = [
            ("code-davinci-002", 8001, false),
            ("text-davinci-003", 4097, false),
            ("gpt-3.5-turbo-0301", 4096, true),
            ("gpt-3.5-turbo", 4096, true),
            ("gpt-35-turbo-0301", 4096, true),
            ("gpt-4-0314", 8192, true),
            ("gpt-4-32k-0314", 8192, true),
        ];
        for (d, (name, max, chat)) in Deployment::ALL.iter().zip(expected) {
            assert_eq!(d.to_string(), name);
            assert_eq!(d.max_tokens(), max);
            assert_eq!(d.is_chat(), chat);
        }
    }

    #[test]
    fn deployment_name_round_trip() {
        for d in Deployment::ALL {
            assert_eq!(Deployment::from_name(d.as_str()).unwrap(), d);
            assert_eq!(d.as_str().parse::<Deployment>().unwrap(), d);
        }
    }

    #[test]
    fn unknown_deployment_lists_options() {
        let err = Deployment::from_name("gpt-5").unwrap_err().to_string();
        assert!(err.contains("unknown deployment 'gpt-5'"));
        assert!(err.contains("gpt-4-32k-0314"));
        assert!(Deployment::from_name("").is_err());
        assert!(Deployment::from_name("GPT-4-0314").is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let m = Message::new(Role::Assistant, "hi");
        assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"role":"assistant","content":"hi"}"#);
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn parses_single_file() {
        let files = AppFile::parse_list(r#"[{"fileName":"main.tf","filePath":"./","fileContent":"X"}]"#).unwrap();
        assert_eq!(
            files,
            vec![AppFile { name: "main.tf".into(), path: "./".into(), content: "X".into() }]
        );
    }

    #[test]
    fn parses_fenced_reply() {
        let text = "```json\n[{\"fileName\":\"a.txt\",\"filePath\":\"./docs/\",\"fileContent\":\"```\\nnested\\n```\"}]\n```\n";
        let files = AppFile::parse_list(text).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "./docs/");
        assert_eq!(files[0].content, "```\nnested\n```");
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(AppFile::parse_list("[]").unwrap().is_empty());
    }

    #[test]
    fn prose_is_a_parse_error() {
        let err = AppFile::parse_list("Sure! Here are your files: [").unwrap_err().to_string();
        assert!(err.starts_with("couldn't parse OpenAI response: "));
        assert!(err.contains("expected value"));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let err = AppFile::parse_list(r#"[{"fileName":"main.tf","filePath":"./"}]"#).unwrap_err().to_string();
        assert!(err.contains("missing field `fileContent`"));
    }
}
