#[tokio::main]
async fn main() {
    if let Err(e) = mathmate::cli::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
