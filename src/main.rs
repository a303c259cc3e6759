use dak::application::{Dashboard, DepartmentAccess, DocumentAccess};
use dak::config::{AppConfig, Backend};
use dak::infrastructure::{
    AuthClient, AuthUser, DepartmentStore, DocumentStore, RestStore, SqliteStore,
};
use env_logger::Env;
use log::{error, info, warn};
use std::error::Error;
use std::sync::Arc;

#[derive(Clone, Copy)]
enum Command {
    Dashboard,
    Documents,
    Departments,
}

impl Command {
    fn parse(arg: Option<&str>) -> Result<Self, String> {
        match arg {
            None | Some("dashboard") => Ok(Command::Dashboard),
            Some("documents") => Ok(Command::Documents),
            Some("departments") => Ok(Command::Departments),
            Some(other) => Err(format!(
                "Unknown command: {} (expected dashboard, documents or departments)",
                other
            )),
        }
    }
}

/// Open the configured database, falling back to an in-memory one.
fn open_sqlite(path: &str) -> Result<SqliteStore, Box<dyn Error>> {
    match SqliteStore::new(path) {
        Ok(store) => Ok(store),
        Err(e) => {
            warn!("Cannot open {} ({}), using in-memory database", path, e);
            Ok(SqliteStore::new_in_memory()?)
        }
    }
}

async fn run<S>(
    command: Command,
    store: Arc<S>,
    user: Option<AuthUser>,
) -> Result<String, Box<dyn Error>>
where
    S: DocumentStore + DepartmentStore,
{
    match command {
        Command::Dashboard | Command::Documents => {
            let access = DocumentAccess::new(store, user);
            if !access.mount().await {
                return Err("Not signed in: set DAK_EMAIL and DAK_PASSWORD".into());
            }

            let state = access.snapshot().await;
            if let Some(message) = state.error {
                return Err(message.into());
            }

            match command {
                Command::Dashboard => {
                    let dashboard = Dashboard::build(&state.items, &chrono::Local::now());
                    Ok(serde_json::to_string_pretty(&dashboard)?)
                }
                _ => Ok(serde_json::to_string_pretty(&state.items)?),
            }
        }
        Command::Departments => {
            let access = DepartmentAccess::new(store);
            access.fetch().await?;
            Ok(serde_json::to_string_pretty(&access.departments().await)?)
        }
    }
}

async fn execute(command: Command, config: AppConfig) -> Result<String, Box<dyn Error>> {
    match config.backend {
        Backend::Rest { url, api_key } => {
            info!("Using remote store at {}", url);
            let store = RestStore::new(&url, &api_key);

            match &config.credentials {
                Some(creds) => {
                    let session = AuthClient::new(&url, &api_key)
                        .sign_in(&creds.email, &creds.password)
                        .await?;
                    let store = store.with_session(&session);
                    run(command, Arc::new(store), Some(session.user)).await
                }
                None => run(command, Arc::new(store), None).await,
            }
        }
        Backend::Sqlite { path } => {
            let store = open_sqlite(&path)?;
            info!(
                "Database initialized with {} documents",
                store.count_documents()?
            );

            // A local database has no identity provider; act as its operator.
            let operator = AuthUser {
                id: "local".to_string(),
                email: None,
            };
            run(command, Arc::new(store), Some(operator)).await
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let arg = std::env::args().nth(1);
    let result = match Command::parse(arg.as_deref()) {
        Ok(command) => match AppConfig::from_env() {
            Ok(config) => execute(command, config).await,
            Err(e) => Err(e.into()),
        },
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
