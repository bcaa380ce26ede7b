use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Specify the directory to scan (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .xtools/treeprompt/treeprompt.toml).",
        value_name = "CONTEXT_FILE",
        conflicts_with = "disable_context_file",
        help_heading = "Project Setup"
    )]
    pub context_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "context_file",
        help_heading = "Project Setup"
    )]
    pub disable_context_file: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CollectOpts {
    #[arg(
        long,
        help = "Rules file name under the project root (default: .gitignore).",
        value_name = "NAME",
        help_heading = "Collection"
    )]
    pub rules_file: Option<String>,

    #[arg(
        long,
        help = "Write absolute paths in FileName headers.",
        help_heading = "Collection"
    )]
    pub absolute_paths: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerationOpts {
    #[arg(
        short,
        long,
        help = "Model to use for generation (default: gpt-oss).",
        value_name = "MODEL",
        help_heading = "Generation"
    )]
    pub model: Option<String>,

    #[arg(
        short,
        long = "promptfile",
        help = "Prompt file placed before the collected code (default: Prompt.md next to the executable).",
        value_name = "PATH",
        help_heading = "Generation"
    )]
    pub prompt_file: Option<PathBuf>,

    #[arg(
        long,
        help = "Generation endpoint URL (default: http://localhost:11434/api/generate).",
        value_name = "URL",
        help_heading = "Generation"
    )]
    pub endpoint: Option<String>,

    #[arg(
        long,
        help = "Print the composed prompt instead of sending it.",
        help_heading = "Generation"
    )]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Send a project's source tree to a local model and stream the answer.",
    long_about = "treeprompt collects every file under the project root that is not matched by \n.gitignore, prepends a prompt file, and streams the model's answer to stdout.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  treeprompt -m gpt-oss > README.md\n  treeprompt -p ./prompts/review.md --project-root ~/src/app\n  treeprompt --dry-run | wc -c"
)]
pub struct Cli {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub collect: CollectOpts,
    #[clap(flatten)]
    pub generation: GenerationOpts,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}
