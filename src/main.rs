#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = cursa_rust::run().await {
        eprintln!("cursa-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
