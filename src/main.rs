//! Game Group server binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gamegroup_server::server::run().await
}
