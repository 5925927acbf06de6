use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    rosterbot_cli::cli::app::run().await
}
