mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

use stripbot_core::Config;
use stripbot_server::{build_context, scheduler, start};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "stripbot=trace,stripbot_server=trace,stripbot_db=debug,stripbot_core=debug,tower_http=debug".to_string()
        } else {
            "stripbot=debug,stripbot_server=debug,stripbot_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            config.server.host = host;
            config.server.port = port;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start(config))?;
            Ok(())
        }
        Commands::Fetch { days } => {
            let config = Config::load_or_default(cli.config.as_deref());
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch_once(config, days))
        }
        Commands::Post => {
            let config = Config::load_or_default(cli.config.as_deref());
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(post_once(config))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("stripbot {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn fetch_once(config: Config, days: u32) -> Result<()> {
    let ctx = build_context(config)?;
    let stored = scheduler::fetch_new_comics(&ctx, days).await?;
    println!("Stored {} new comics ({} days checked)", stored, days);
    Ok(())
}

async fn post_once(config: Config) -> Result<()> {
    let ctx = build_context(config)?;
    match scheduler::create_post(&ctx).await? {
        Some(post) => {
            println!("Posted {} -> {}", post.strip_date, post.bluesky_uri);
        }
        None => {
            println!("No unposted comics available");
        }
    }
    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Comic: {} ({} days back)", config.comic.slug, config.comic.days_back);
    println!("  Records backend: {:?}", config.records.backend);
    println!("  Storage backend: {:?}", config.storage.backend);
    println!("  Scheduler enabled: {}", config.scheduler.enabled);

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        for w in &warnings {
            println!("  warning: {}", w);
        }
    }

    Ok(())
}
