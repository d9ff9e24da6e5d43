#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = grademe_rust::run().await {
        eprintln!("grademe-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
