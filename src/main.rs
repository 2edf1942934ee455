use wpsync_cli::format_error;

#[tokio::main]
async fn main() {
    if let Err(e) = wpsync_cli::run().await {
        eprintln!("{}", format_error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}
