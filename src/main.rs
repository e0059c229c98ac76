use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orgnocal::client::OrgnocalClient;
use orgnocal::config::AppConfig;
use orgnocal::db::{Database, TaskFilter};
use orgnocal::{api, models::DbId, tree_render};

#[derive(Parser)]
#[command(name = "orgnocal")]
#[command(about = "Project and task tracking with layered task hierarchies")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Orgnocal server
    Serve {
        /// Port for HTTP API (overrides ORGNOCAL_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind (overrides ORGNOCAL_HOST)
        #[arg(long)]
        host: Option<String>,
    },
    /// Check server status
    Status,
    /// Print the layered task hierarchy of a project
    Tree {
        #[arg(short, long)]
        project: DbId,

        /// Nested generations to show under each task
        #[arg(short, long)]
        depth: Option<usize>,
    },
    /// Search tasks, projects, orgs and users
    Search { query: String },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "orgnocal=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port, host }) => serve(port, host).await?,
        None => serve(None, None).await?,
        Some(Commands::Status) => {
            let client = OrgnocalClient::from_env();
            match client.health().await {
                Ok(body) => println!("Orgnocal server is up: {body}"),
                Err(e) => {
                    println!("Orgnocal server is not reachable: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Tree { project, depth }) => {
            let client = OrgnocalClient::from_env();
            let layers = client.list_layers(project, depth).await?;
            let filter = TaskFilter {
                project_id: Some(project),
                ..Default::default()
            };
            let unlayered: Vec<_> = client
                .list_tasks(&filter, depth)
                .await?
                .tasks
                .into_iter()
                .filter(|node| {
                    node.task.task_layer_id.is_none() && node.task.parent_task_id.is_none()
                })
                .collect();
            print!("{}", tree_render::render_hierarchy(&layers, &unlayered));
        }
        Some(Commands::Search { query }) => {
            let client = OrgnocalClient::from_env();
            let results = client.search(&query).await?;
            if results.is_empty() {
                println!("No results for {query:?}");
            }
            for project in &results.projects {
                println!("project #{}  {}", project.id, project.name);
            }
            for task in &results.tasks {
                println!("task    #{}  {}", task.id, task.title);
            }
            for org in &results.orgs {
                println!("org     #{}  {}", org.id, org.org_name);
            }
            for user in &results.users {
                println!("user    #{}  {}", user.user_id, user.username);
            }
        }
    }

    Ok(())
}

async fn serve(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }

    let db = match &config.db_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    if let Some(limiter) = config.security.rate_limiter.clone() {
        let period = limiter.window();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
            loop {
                interval.tick().await;
                limiter.cleanup();
            }
        });
    }

    let addr = config.bind_addr();
    let app = api::create_router_with_config(db, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Orgnocal server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
