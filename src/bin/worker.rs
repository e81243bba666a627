#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = cursa_rust::run_worker().await {
        eprintln!("cursa-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
