use crate::cli_args::Cli;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use log;
use std::io;
use std::path::{Path, PathBuf};
use treeprompt_core::{self as core, Config, GenerationClient, GenerationRequest};

pub fn handle_generate_command(cli: &Cli) -> Result<()> {
    let project_root = Config::determine_project_root(cli.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::debug!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(&project_root, cli).context("Failed to load configuration")?;

    // The prompt is read before any traversal or network activity.
    let prompt_path = resolve_prompt_path(&config, cli.generation.prompt_file.as_ref())?;
    let prompt = core::read_prompt_file(&prompt_path)
        .with_context(|| format!("Could not read prompt file ({})", prompt_path.display()))?;
    log::info!("Model: {}", config.generation.model);
    log::info!("Prompt file location: {}", prompt_path.display());
    log::info!("Prompt read. Collecting project files.");

    let document = collect_document(&project_root, &config);
    log::info!("Files collected. Querying the model.");

    let full_prompt = core::compose_prompt(&prompt, &document);
    if cli.generation.dry_run {
        log::info!("Dry run: printing composed prompt ({} bytes).", full_prompt.len());
        return output::write_to_stdout(&full_prompt);
    }

    let client = GenerationClient::new(&config.generation.endpoint)
        .context("Failed to create generation client")?;
    let request = GenerationRequest::streaming(config.generation.model.clone(), full_prompt);
    let stdout = io::stdout();
    let mut sink = stdout.lock();
    let summary = client
        .generate(&request, &mut sink)
        .context("Generation request failed")?;
    log::debug!(
        "Generation complete: {:?}, {} chunks",
        summary.termination,
        summary.chunks
    );
    Ok(())
}

fn resolve_prompt_path(config: &Config, cli_prompt_file: Option<&PathBuf>) -> Result<PathBuf> {
    match cli_prompt_file {
        Some(path) => Ok(PathBuf::from(
            shellexpand::tilde(&path.to_string_lossy()).as_ref(),
        )),
        None => config
            .effective_prompt_file()
            .context("Failed to determine default prompt file"),
    }
}

fn collect_document(project_root: &Path, config: &Config) -> String {
    let outcome = core::collect(project_root, &config.collect_options());
    if let Some(e) = &outcome.walk_error {
        log::error!(
            "Directory walk stopped early, continuing with {} collected files: {}",
            outcome.document.len(),
            e
        );
    }
    let unreadable = outcome
        .document
        .records()
        .iter()
        .filter(|r| r.outcome.is_unreadable())
        .count();
    if unreadable > 0 {
        log::debug!("{} files could not be read and were left empty", unreadable);
    }
    outcome.document.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_prompt_file_overrides_config() {
        let mut config = Config::default();
        config.generation.prompt_file = Some(PathBuf::from("/from/config.md"));
        let cli_path = PathBuf::from("/from/flag.md");
        assert_eq!(
            resolve_prompt_path(&config, Some(&cli_path)).unwrap(),
            cli_path
        );
        assert_eq!(
            resolve_prompt_path(&config, None).unwrap(),
            PathBuf::from("/from/config.md")
        );
    }
}
