use cephkit::cli::{run, Cli};
use cephkit::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args(std::env::args_os());

    if let Err(error) = init_logging(cli.json_logs) {
        eprintln!("Failed to initialize logging: {error:#}");
    }
    tracing::debug!("cephkit {} (built {})", cephkit::VERSION, cephkit::BUILD_DATE);

    if let Err(error) = run(cli).await {
        tracing::error!("{error:#}");
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
