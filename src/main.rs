use anyhow::{Context, Result};
use clap::Parser;
use signstream::app::{load_classifier, run_server};
use signstream::assets::SignAssetMap;
use signstream::cli::{Cli, Commands, ConfigAction, ServeArgs};
use signstream::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    signstream::logging::init(
        signstream::logging::level_for(cli.verbose, cli.quiet),
        cli.log_json,
    );

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            serve(config, ServeArgs::default()).await?;
        }
        Some(Commands::Serve(args)) => {
            let config = load_config(cli.config.as_deref())?;
            serve(config, args).await?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Labels) => {
            let config = load_config(cli.config.as_deref())?;
            let classifier = load_classifier(&config.model)?;
            for (index, label) in classifier.labels().iter() {
                println!("{index:>4}  {label}");
            }
        }
        Some(Commands::Assets { text }) => {
            let config = load_config(cli.config.as_deref())?;
            let assets = SignAssetMap::load(&config.assets.mapping)?;
            println!("{}", assets.resolve(&text));
        }
    }

    Ok(())
}

/// Load configuration from a custom path, or the default path falling back to defaults.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path).with_context(|| format!("loading config {}", path.display()))?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)
            .with_context(|| format!("loading config {}", default_path.display()))?
    };

    Ok(config.with_env_overrides())
}

/// Apply `serve` flags and run the server.
async fn serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(pause_ms) = args.pause {
        config.segmentation.pause_ms = pause_ms;
    }
    if args.no_tts {
        config.tts.enabled = false;
    }
    config.validate()?;

    run_server(&config).await
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&std::path::Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(std::path::Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
