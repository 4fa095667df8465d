//! career-match: skill-gap analysis and job matching CLI

use anyhow::Context;
use career_match::cli::{validate_fixture_path, Cli, Commands, ConfigAction};
use career_match::config::Config;
use career_match::embedding::HashEmbedder;
use career_match::matching::profile::{JobId, ProfileId};
use career_match::matching::MatchEngine;
use career_match::source::InMemorySource;
use career_match::taxonomy::{Resolution, TaxonomySnapshot};
use clap::Parser;
use colored::Colorize;
use log::{error, info};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("command failed: {:#}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Rank {
            profiles,
            roles,
            profile,
            k,
            json,
        } => {
            let engine = build_engine(&config, &profiles, &roles).await?;
            let profile_id = ProfileId(profile);
            let ranking = engine
                .rank_jobs(&profile_id, k)
                .await
                .with_context(|| format!("ranking jobs for '{}'", profile_id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&ranking)?);
                return Ok(());
            }

            println!(
                "{}",
                format!("Top {} matches for {}", ranking.len(), profile_id).bold()
            );
            for (rank, scored) in ranking.iter().enumerate() {
                println!(
                    "{:>3}. {}  score {}  (similarity {:.2}, gap {:.2}, experience {:.2})",
                    rank + 1,
                    scored.job.to_string().cyan(),
                    format!("{:.3}", scored.score).green().bold(),
                    scored.breakdown.similarity,
                    scored.breakdown.gap_penalty,
                    scored.breakdown.experience_alignment,
                );
            }
            if ranking.is_empty() {
                println!("{}", "no indexed jobs matched this profile".yellow());
            }
        }

        Commands::Gap {
            profiles,
            roles,
            profile,
            role,
            json,
        } => {
            let engine = build_engine(&config, &profiles, &roles).await?;
            let report = engine
                .compute_gap_report(&ProfileId(profile), &JobId(role))
                .await
                .context("computing gap report")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!(
                "{}",
                format!("Skill gaps: {} vs {}", report.profile, report.role).bold()
            );
            for entry in &report.entries {
                let current = entry
                    .current_level
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let severity = if entry.severity > 0.0 {
                    format!("{:.3}", entry.severity).red()
                } else {
                    "satisfied".green()
                };
                println!(
                    "  {:<20} required {}  current {}  severity {}",
                    entry.skill.to_string(),
                    entry.required_level,
                    current,
                    severity,
                );
            }
            if !report.unresolved_mentions.is_empty() {
                println!(
                    "{} {}",
                    "unresolved mentions:".yellow(),
                    report.unresolved_mentions.join(", ")
                );
            }
        }

        Commands::Resolve { mentions } => {
            let taxonomy =
                TaxonomySnapshot::with_default_catalog(config.taxonomy.fuzzy_threshold)?;
            for mention in &mentions {
                match taxonomy.resolve(mention) {
                    Resolution::Resolved(id) => {
                        let skill = taxonomy.get(&id).expect("resolved ids exist");
                        println!(
                            "{:<24} -> {} ({})",
                            mention,
                            id.to_string().green(),
                            skill.name
                        );
                    }
                    Resolution::Unresolved => {
                        println!("{:<24} -> {}", mention, "unresolved".red());
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let rendered = toml::to_string_pretty(&config)
                    .context("serializing configuration")?;
                println!("{}", rendered);
            }
            ConfigAction::Reset => {
                let defaults = Config::default();
                defaults.save().context("writing default configuration")?;
                println!("configuration reset to defaults");
            }
        },
    }

    Ok(())
}

async fn build_engine(
    config: &Config,
    profiles_path: &PathBuf,
    roles_path: &PathBuf,
) -> anyhow::Result<MatchEngine> {
    validate_fixture_path(profiles_path)
        .map_err(|e| anyhow::anyhow!("profiles fixture: {}", e))?;
    validate_fixture_path(roles_path)
        .map_err(|e| anyhow::anyhow!("roles fixture: {}", e))?;

    let taxonomy = TaxonomySnapshot::with_default_catalog(config.taxonomy.fuzzy_threshold)?;
    let source = Arc::new(InMemorySource::new());
    source
        .load_profiles_json(profiles_path, &taxonomy)
        .with_context(|| format!("loading profiles from {}", profiles_path.display()))?;
    source
        .load_roles_json(roles_path)
        .with_context(|| format!("loading roles from {}", roles_path.display()))?;

    let provider = Arc::new(HashEmbedder::new(config.provider.dimension));
    let engine = MatchEngine::new(
        config,
        taxonomy,
        provider,
        Arc::clone(&source) as Arc<dyn career_match::source::ProfileSource>,
        source as Arc<dyn career_match::source::RoleSource>,
    )?;

    let indexed = engine.sync_jobs().await.context("indexing job corpus")?;
    info!("engine ready with {} indexed jobs", indexed);
    Ok(engine)
}
