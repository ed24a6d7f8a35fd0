//! Ignore-list management.

use std::io::Write;

use anyhow::{Context, Result};
use cw_core::DEFAULT_IGNORED;
use cw_store::IgnoreFile;

use crate::Config;

fn ignore_file(config: &Config) -> IgnoreFile {
    IgnoreFile::new(config.data().ignore())
}

pub fn add<W: Write>(writer: &mut W, config: &Config, name: &str) -> Result<()> {
    let file = ignore_file(config);
    if name.trim().is_empty() {
        anyhow::bail!("name cannot be empty");
    }
    let added = file
        .add(name)
        .with_context(|| format!("failed to update {}", file.path().display()))?;
    if added {
        writeln!(writer, "Ignoring {}", name.trim())?;
    } else {
        writeln!(writer, "{} is already ignored", name.trim())?;
    }
    Ok(())
}

pub fn remove<W: Write>(writer: &mut W, config: &Config, name: &str) -> Result<()> {
    let file = ignore_file(config);
    let removed = file
        .remove(name)
        .with_context(|| format!("failed to update {}", file.path().display()))?;
    if removed {
        writeln!(writer, "No longer ignoring {}", name.trim())?;
    } else if DEFAULT_IGNORED.contains(&name.trim().to_lowercase().as_str()) {
        writeln!(writer, "{} is built in and cannot be removed", name.trim())?;
    } else {
        writeln!(writer, "{} was not in {}", name.trim(), file.path().display())?;
    }
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let file = ignore_file(config);
    let from_file = file
        .load()
        .with_context(|| format!("failed to read {}", file.path().display()))?;

    writeln!(writer, "Built in: {}", DEFAULT_IGNORED.join(", "))?;
    if !config.ignored_users.is_empty() {
        writeln!(writer, "Config: {}", config.ignored_users.join(", "))?;
    }
    if from_file.is_empty() {
        writeln!(writer, "{}: (empty)", file.path().display())?;
    } else {
        let names: Vec<&str> = from_file.iter().map(String::as_str).collect();
        writeln!(writer, "{}: {}", file.path().display(), names.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn config(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            ignored_users: vec!["RaidBot".to_string()],
            ..Config::default()
        }
    }

    fn output(buf: Vec<u8>, dir: &std::path::Path) -> String {
        String::from_utf8(buf)
            .unwrap()
            .replace(&dir.display().to_string(), "[TEMP]")
    }

    #[test]
    fn add_remove_and_list() {
        let temp = tempfile::tempdir().unwrap();
        let config = config(temp.path());

        let mut buf = Vec::new();
        add(&mut buf, &config, "QuizBot").unwrap();
        add(&mut buf, &config, "quizbot").unwrap();
        list(&mut buf, &config).unwrap();
        remove(&mut buf, &config, "QUIZBOT").unwrap();
        remove(&mut buf, &config, "Nightbot").unwrap();
        list(&mut buf, &config).unwrap();

        assert_snapshot!(output(buf, temp.path()), @r"
        Ignoring QuizBot
        quizbot is already ignored
        Built in: nightbot, streamelements, moobot, streamlabs, fossabot, wizebot, soundalerts, commanderroot
        Config: RaidBot
        [TEMP]/ignore.json: QuizBot
        No longer ignoring QUIZBOT
        Nightbot is built in and cannot be removed
        Built in: nightbot, streamelements, moobot, streamlabs, fossabot, wizebot, soundalerts, commanderroot
        Config: RaidBot
        [TEMP]/ignore.json: (empty)
        ");
    }

    #[test]
    fn empty_name_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        assert!(add(&mut Vec::new(), &config(temp.path()), "  ").is_err());
    }
}
