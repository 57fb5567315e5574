#[tokio::main]
async fn main() -> anyhow::Result<()> {
    medibot_server::start().await
}
