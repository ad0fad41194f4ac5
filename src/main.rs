use clap::Parser;
use color_eyre::Result;
use custlist::api::CustomerClient;
use custlist::app::App;
use custlist::cache::{ListingCache, NoopStorage, SqliteStorage};
use custlist::config::Config;
use custlist::store::PagedCustomerStore;
use custlist::ui::views::CustomerListView;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "custlist")]
#[command(about = "A terminal customer browser with offline paging cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/custlist/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Customers per page request
  #[arg(long)]
  page_size: Option<u32>,

  /// Don't read or write the local listing cache
  #[arg(long)]
  no_cache: bool,
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("custlist");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::never(&log_dir, "custlist.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("CUSTLIST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging()?;

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(page_size) = args.page_size.filter(|size| *size > 0) {
    config.api.page_size = page_size;
  }
  if args.no_cache {
    config.cache.enabled = false;
  }

  let client = CustomerClient::new(&config.api, config.token_provider())?;
  info!(endpoint = %client.endpoint(), page_size = config.api.page_size, "starting");

  let cache: Box<dyn ListingCache> = if config.cache.enabled {
    let path = config.cache_path()?;
    info!(path = %path.display(), "using listing cache");
    Box::new(SqliteStorage::open(&path)?)
  } else {
    Box::new(NoopStorage)
  };

  let store = PagedCustomerStore::new(Arc::new(client), cache, config.store_options());
  let root = CustomerListView::new(store);

  let mut app = App::new(Box::new(root), config.title.clone(), &config.api.base_url);
  app.run().await?;

  Ok(())
}
