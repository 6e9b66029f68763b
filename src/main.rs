use birthday_greeter::cli;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = match cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        // --help, --version and malformed known subcommands
        Err(e) => e.exit(),
    };

    // Load environment variables
    dotenv().ok();

    // Initialize logging; RUST_LOG takes precedence over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    cli.execute().await
}
