mod cli;

use bpc::blueprint::Blueprint;
use bpc::config::ExpandConfig;
use bpc::expand::ExpandedBlueprint;
use bpc::reader::HclModuleReader;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("BPC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Expand(expand_cli) => expand(expand_cli),
        cli::Command::Create(create_cli) => create(create_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn load(
    blueprint: &std::path::Path,
    overrides: cli::OverrideArgs,
) -> anyhow::Result<ExpandedBlueprint> {
    let blueprint = Blueprint::load(blueprint)?;

    let mut config = ExpandConfig::default()
        .with_cli_variables(overrides.vars)
        .with_backend_config(overrides.backend_config);
    config.validation_level = overrides.validation_level;

    Ok(blueprint.expand(&config, &HclModuleReader)?)
}

pub fn expand(cli: cli::ExpandCommand) -> anyhow::Result<()> {
    let expanded = load(&cli.blueprint, cli.overrides)?;

    match cli.output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &expanded)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &expanded)?,
    };

    Ok(())
}

pub fn create(cli: cli::CreateCommand) -> anyhow::Result<()> {
    let expanded = load(&cli.blueprint, cli.overrides)?;

    let deploy_dir = cli.out.join(expanded.name());
    anyhow::ensure!(
        !deploy_dir.exists(),
        "deployment directory {} already exists",
        deploy_dir.display()
    );

    bpc::writer::write_deployment(&expanded, &deploy_dir, &mut std::io::stdout())?;
    Ok(())
}
