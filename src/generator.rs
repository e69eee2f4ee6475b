use crate::io::write_app_files;
use crate::llm::AiClient;
use crate::models::AppFile;
use crate::render::write_proposal;
use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Apply,
    DontApply,
    /// Extra instructions to send as the next prompt.
    AddToQuery(String),
}

impl Decision {
    /// `None` for a blank line; the caller asks again.
    pub fn parse(input: &str) -> Option<Self> {
        let answer = input.trim();
        if answer.is_empty() {
            return None;
        }
        Some(match answer.to_lowercase().as_str() {
            "a" | "apply" | "y" | "yes" => Decision::Apply,
            "d" | "don't apply" | "dont apply" | "n" | "no" => Decision::DontApply,
            _ => Decision::AddToQuery(answer.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(Vec<PathBuf>),
    Discarded,
}

pub struct Generator {
    client: Box<dyn AiClient>,
    skip_confirmation: bool,
    output_dir: PathBuf,
}

impl Generator {
    pub fn new(client: Box<dyn AiClient>, skip_confirmation: bool, output_dir: PathBuf) -> Self {
        Self { client, skip_confirmation, output_dir }
    }

    /// Query, show, decide; loop while the user refines, then write on apply.
    pub async fn run<R: BufRead, W: Write>(&mut self, prompt: &str, input: &mut R, out: &mut W) -> Result<Outcome> {
        if prompt.trim().is_empty() {
            bail!("empty prompt; provide text, e.g. application-ai \"Create a static html page\"");
        }
        let mut prompt = prompt.to_string();
        loop {
            let reply = self.client.query(&prompt).await?;
            let files = AppFile::parse_list(&reply)?;
            write_proposal(out, &files)?;

            match self.decide(input, out)? {
                Decision::Apply => {
                    let written = write_app_files(&self.output_dir, &files).await?;
                    return Ok(Outcome::Applied(written));
                }
                Decision::DontApply => return Ok(Outcome::Discarded),
                Decision::AddToQuery(more) => {
                    tracing::info!("refining query");
                    prompt = more;
                }
            }
        }
    }

    fn decide<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W) -> Result<Decision> {
        if self.skip_confirmation {
            return Ok(Decision::Apply);
        }
        loop {
            write!(out, "Would you like to apply this? [a]pply / [d]on't apply / or type text to add to the query: ")?;
            out.flush().ok();
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(Decision::DontApply);
            }
            if let Some(decision) = Decision::parse(&line) {
                return Ok(decision);
            }
        }
    }
}
