use crate::models::{AppFile, Deployment};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize json: {}", e),
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ErrorOut<'a> {
    pub code: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'a str>,
}

pub fn print_json_error(code: &str, message: &str, hint: Option<&str>) {
    let err = ErrorOut { code, message, hint };
    print_json(&err);
}

pub fn write_proposal<W: Write>(out: &mut W, files: &[AppFile]) -> std::io::Result<()> {
    writeln!(
        out,
        "These are the files that would be created. Do you want to apply them? or add something to the query?"
    )?;
    for (index, file) in files.iter().enumerate() {
        writeln!(out, "{}. File: {}{}:", index + 1, file.path, file.name)?;
        writeln!(out, "{}", file.content)?;
        writeln!(out)?;
    }
    Ok(())
}

#[derive(Serialize, Debug, Clone)]
pub struct OutcomeOut {
    pub applied: bool,
    pub files: Vec<String>,
}

pub fn render_outcome(json: bool, written: Option<&[PathBuf]>) {
    let files: Vec<String> = written
        .unwrap_or_default()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    if json {
        print_json(&OutcomeOut { applied: written.is_some(), files });
        return;
    }
    match written {
        Some(_) => {
            for f in &files {
                println!("created {}", f);
            }
        }
        None => println!("no files written"),
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct DeploymentOut {
    pub name: &'static str,
    pub max_tokens: u32,
    pub chat: bool,
}

pub fn render_deployments(json: bool) {
    let rows: Vec<DeploymentOut> = Deployment::ALL
        .iter()
        .map(|d| DeploymentOut { name: d.as_str(), max_tokens: d.max_tokens(), chat: d.is_chat() })
        .collect();
    if json {
        print_json(&rows);
        return;
    }
    println!("{:<20} {:>10}  {}", "DEPLOYMENT", "MAX TOKENS", "CHAT");
    for r in rows {
        println!("{:<20} {:>10}  {}", r.name, r.max_tokens, if r.chat { "yes" } else { "no" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_lists_files_in_order() {
        let files = vec![
            AppFile { name: "index.html".into(), path: "./".into(), content: "<html/>".into() },
            AppFile { name: "app.js".into(), path: "./js/".into(), content: "let x;".into() },
        ];
        let mut buf = Vec::new();
        write_proposal(&mut buf, &files).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("1. File: ./index.html:\n<html/>\n\n"));
        assert!(text.contains("2. File: ./js/app.js:\nlet x;\n"));
        assert!(text.find("1. File").unwrap() < text.find("2. File").unwrap());
    }
}
