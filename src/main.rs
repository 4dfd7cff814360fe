#[tokio::main]
async fn main() -> anyhow::Result<()> {
    presence_engine::server::run().await
}
