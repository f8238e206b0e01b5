//! `exam-grade`: grade an essay answer against a template file offline

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use exam_grading::{normalize_keywords, GradingConfig};
use exam_scoring::{Analysis, Reference};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Template file: the authored fields of an answer template
#[derive(Debug, Deserialize)]
struct TemplateFile {
    content: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    minimum_match_percentage: Option<f64>,
}

fn cli() -> Command {
    Command::new("exam-grade")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Essay auto-grading against an answer template")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Grading configuration (TOML)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("grade")
                .about("Score an answer against a template")
                .arg(
                    Arg::new("template")
                        .long("template")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Template JSON: content, keywords, minimum_match_percentage"),
                )
                .arg(
                    Arg::new("answer")
                        .long("answer")
                        .required(true)
                        .help("Answer text, or @path to read it from a file"),
                )
                .arg(
                    Arg::new("max-points")
                        .long("max-points")
                        .default_value("10")
                        .value_parser(value_parser!(u32))
                        .help("Points available for the question"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let config = load_config(matches.get_one::<PathBuf>("config"))?;

    match matches.subcommand() {
        Some(("grade", args)) => grade(&config, args),
        Some(("config", _)) => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<GradingConfig> {
    let Some(path) = path else {
        return Ok(GradingConfig::default());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = GradingConfig::from_toml_str(&source)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn grade(config: &GradingConfig, args: &ArgMatches) -> Result<()> {
    let template_path = args
        .get_one::<PathBuf>("template")
        .context("--template is required")?;
    let answer_arg = args
        .get_one::<String>("answer")
        .context("--answer is required")?;
    let max_points = *args.get_one::<u32>("max-points").context("--max-points")?;
    if max_points == 0 {
        bail!("--max-points must be at least 1");
    }

    let template = read_template(template_path)?;
    let answer = read_answer(answer_arg)?;
    let analysis = analyze(config, &template, &answer, max_points)?;

    tracing::info!(
        "Scored {}/{} against {}",
        analysis.score,
        analysis.max_points,
        template_path.display()
    );

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render(&analysis));
    }
    Ok(())
}

fn read_template(path: &Path) -> Result<TemplateFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading template {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing template {}", path.display()))
}

fn read_answer(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading answer {path}")),
        None => Ok(arg.to_string()),
    }
}

fn analyze(
    config: &GradingConfig,
    template: &TemplateFile,
    answer: &str,
    max_points: u32,
) -> Result<Analysis> {
    let minimum = template
        .minimum_match_percentage
        .unwrap_or(config.scoring.default_minimum_match_percentage);
    if !(0.0..=100.0).contains(&minimum) {
        bail!("minimum_match_percentage {minimum} outside [0, 100]");
    }

    let keywords = normalize_keywords(&template.keywords);
    let policy = config.scoring.policy()?;
    Ok(policy.analyze(
        answer,
        &Reference::new(&template.content, &keywords),
        minimum,
        max_points,
    ))
}

fn render(analysis: &Analysis) -> String {
    format!(
        "Score:              {}/{}\n\
         Match:              {:.1}%\n\
         Keywords:           {}/{} ({:.1}%)\n\
         Content similarity: {:.1}%\n",
        analysis.score,
        analysis.max_points,
        analysis.match_percentage,
        analysis.keywords_matched,
        analysis.total_keywords,
        analysis.keyword_percentage,
        analysis.content_similarity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template() -> TemplateFile {
        serde_json::from_str(
            r#"{
                "content": "REST endpoints should be idempotent so clients can retry requests safely",
                "keywords": ["REST", "idempotent", "rest"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn grade_args_parse() {
        let m = cli()
            .try_get_matches_from([
                "exam-grade", "grade", "--template", "t.json", "--answer", "@a.txt", "--json",
            ])
            .unwrap();
        let (name, args) = m.subcommand().unwrap();
        assert_eq!(name, "grade");
        assert_eq!(args.get_one::<u32>("max-points"), Some(&10));
        assert!(args.get_flag("json"));
    }

    #[test]
    fn analysis_uses_configured_defaults() {
        let analysis = analyze(
            &GradingConfig::default(),
            &template(),
            "REST APIs should be idempotent for safety.",
            10,
        )
        .unwrap();

        assert_eq!(analysis.total_keywords, 2);
        assert_eq!(analysis.keywords_matched, 2);
        assert_eq!(analysis.score, 8);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut t = template();
        t.minimum_match_percentage = Some(150.0);
        assert!(analyze(&GradingConfig::default(), &t, "REST", 10).is_err());
    }

    #[test]
    fn inline_answer_is_used_verbatim() {
        assert_eq!(read_answer("plain text").unwrap(), "plain text");
    }

    #[test]
    fn render_lists_breakdown() {
        let analysis = analyze(&GradingConfig::default(), &template(), "", 10).unwrap();
        let text = render(&analysis);
        assert!(text.starts_with("Score:              0/10\n"));
        assert!(text.contains("Keywords:           0/2"));
    }
}
