use clap::Parser;
use inlet_server::cli::{Cli, Commands};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    inlet_core::o11y::init_global_from_env()?;
    let cli = Cli::parse();

    let cmd = cli.command.unwrap_or(Commands::Serve {
        host: "0.0.0.0".to_string(),
        port: 8000,
        data_dir: ".inlet_dev".into(),
    });

    match cmd {
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            let state = inlet_server::dev_backends::build_state(data_dir).await?;
            inlet_server::server::serve(addr, state).await?;
        }
        Commands::Migrate { db_path, data_dir } => {
            let mut cfg = inlet_core::InletConfig::from_env()?;
            cfg.data_dir = data_dir;
            if let Some(path) = db_path {
                cfg.db_path = Some(path);
            }

            let store_path = cfg.store_path();
            let pool = inlet_core::db::connect(&store_path).await?;
            inlet_core::records::sqlite::SqliteRecordStore::new(pool.clone()).await?;
            inlet_core::schema::sqlite::SqliteSchemaStore::new(pool).await?;
            tracing::info!(path = %store_path.display(), "store migrations applied");
        }
        Commands::Config => {
            // Keep this intentionally simple: print relevant env + inferred settings.
            fn redact(s: &str) -> String {
                if s.len() <= 8 {
                    return "***".to_string();
                }
                format!("{}***{}", &s[..4], &s[s.len() - 4..])
            }

            let cfg = serde_json::json!({
                "INLET_DATA_DIR": std::env::var("INLET_DATA_DIR").ok(),
                "INLET_DB_PATH": std::env::var("INLET_DB_PATH").ok(),
                "INLET_PLATFORM_BASE_URL": std::env::var("INLET_PLATFORM_BASE_URL").ok(),
                "INLET_PLATFORM_API_KEY": std::env::var("INLET_PLATFORM_API_KEY").ok().map(|v| redact(&v)),
                "INLET_IMPORT_MAX_PAGES": std::env::var("INLET_IMPORT_MAX_PAGES").ok(),
                "INLET_LIST_PAGE_SIZE": std::env::var("INLET_LIST_PAGE_SIZE").ok(),
            });
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        Commands::Check => {
            let cfg = inlet_core::InletConfig::from_env()?;

            // Store.
            match inlet_core::db::connect(cfg.store_path()).await {
                Ok(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
                    Ok(_) => println!("store: ok"),
                    Err(e) => println!("store: error ({e})"),
                },
                Err(e) => println!("store: error ({e})"),
            }

            // Integration platform: report configuration only; its API is
            // customer-scoped, so there is no tenant-free probe.
            println!(
                "platform: {} ({})",
                cfg.platform
                    .api_key
                    .as_deref()
                    .map(|_| "configured")
                    .unwrap_or("not configured"),
                cfg.platform.base_url
            );
        }
    }

    Ok(())
}
