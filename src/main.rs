mod api;
mod app;
mod cache;
mod config;
mod error;
mod event;
mod forms;
mod logging;
mod paginator;
mod query;
mod store;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{HttpTransport, Page, Resource, Session, TokenProvider};
use crate::cache::Filters;
use crate::config::Config;
use crate::forms::RecordForm;
use crate::paginator::Paginator;
use crate::store::ResourceStore;

#[derive(Parser, Debug)]
#[command(name = "market-admin")]
#[command(about = "Admin client for the marketplace backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/market-admin/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print one page of a resource
  List {
    resource: Resource,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Page size (default: page_size from config)
    #[arg(short, long)]
    limit: Option<u32>,
    /// Extra query parameter, e.g. --filter industry=cbd
    #[arg(short, long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
  },
  /// Print a single record as JSON
  Show { resource: Resource, id: String },
  /// Create a record from a JSON form
  Create {
    resource: Resource,
    #[arg(long)]
    json: String,
  },
  /// Update a record from a JSON form
  Update {
    resource: Resource,
    id: String,
    #[arg(long)]
    json: String,
  },
  /// Delete a record
  Delete { resource: Resource, id: String },
  /// Log in with the configured email and MARKET_ADMIN_PASSWORD
  Login,
  /// Drop cached pages of a resource
  ClearCache { resource: Resource },
  /// Browse resources in the terminal
  Browse { resource: Option<Resource> },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    .filter(|(k, _)| !k.is_empty())
    .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

/// Log in if there is no token yet and credentials are available.
async fn ensure_session(config: &Config, session: &Session, store: &ResourceStore) -> Result<()> {
  if session.token().is_some() {
    return Ok(());
  }
  let (Some(email), Ok(password)) = (config.email.as_deref(), Config::get_password()) else {
    return Ok(());
  };
  session.login(store.transport(), email, &password).await?;
  Ok(())
}

fn print_page(resource: Resource, page: &Page) {
  let paginator = Paginator::from_meta(&page.meta);
  println!(
    "{} {} ({} items)",
    resource,
    paginator.label(),
    page.meta.total_items
  );
  for record in &page.records {
    println!(
      "{:<26} {:<40} {}",
      record.id,
      record.label(),
      record.created_at.as_deref().unwrap_or("")
    );
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Logging is best effort; the CLI still works without a log file
  let _log_guard = logging::init().ok();

  let config = Config::load(args.config.as_deref())?;

  let session = Arc::new(Session::new(Config::get_api_token()));
  let transport = Arc::new(HttpTransport::new(&config.backend)?);
  let store = ResourceStore::from_config(&config, transport, session.clone());

  match args.command.unwrap_or(Command::Browse { resource: None }) {
    Command::List {
      resource,
      page,
      limit,
      filters,
    } => {
      ensure_session(&config, &session, &store).await?;
      let filters: Filters = filters.into_iter().collect();
      let limit = limit.unwrap_or(config.page_size);
      let page = store.fetch_page(resource, page, limit, &filters).await?;
      print_page(resource, &page);
    }
    Command::Show { resource, id } => {
      ensure_session(&config, &session, &store).await?;
      let record = store.fetch_record(resource, &id).await?;
      println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Command::Create { resource, json } => {
      ensure_session(&config, &session, &store).await?;
      let value = serde_json::from_str(&json).map_err(|e| eyre!("Invalid JSON: {}", e))?;
      let form = RecordForm::from_json(resource, value)?;
      let record = store.create_record(resource, form).await?;
      println!("Created {} {}", resource, record.id);
    }
    Command::Update { resource, id, json } => {
      ensure_session(&config, &session, &store).await?;
      let value = serde_json::from_str(&json).map_err(|e| eyre!("Invalid JSON: {}", e))?;
      let form = RecordForm::from_json(resource, value)?;
      let record = store.update_record(resource, &id, form).await?;
      println!("Updated {} {}", resource, record.id);
    }
    Command::Delete { resource, id } => {
      ensure_session(&config, &session, &store).await?;
      store.delete_record(resource, &id).await?;
      println!("Deleted {} {}", resource, id);
    }
    Command::Login => {
      let email = config
        .email
        .as_deref()
        .ok_or_else(|| eyre!("No email configured. Set `email` in the config file."))?;
      let password = Config::get_password()?;
      let user = session.login(store.transport(), email, &password).await?;
      println!(
        "Logged in as {} ({})",
        user.full_name.as_deref().unwrap_or(&user.email),
        user.email
      );
      println!("export MARKET_ADMIN_TOKEN={}", user.token);
    }
    Command::ClearCache { resource } => {
      store.clear_resource(resource)?;
      println!("Cleared cached {} pages", resource);
    }
    Command::Browse { resource } => {
      ensure_session(&config, &session, &store).await?;
      let email = session.user().map(|u| u.email).or(config.email.clone());
      let resource = resource.unwrap_or(Resource::Categories);
      let mut app = app::App::new(config, store, resource, email);
      app.run().await?;
    }
  }

  Ok(())
}
