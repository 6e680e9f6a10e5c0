use invitations_core::models::migrations::CREATE_MIGRATION_TABLE;
use tokio_postgres::Client;

use super::migration_01;

pub async fn run_migration_up(client: &mut Client) -> Result<(), anyhow::Error> {
    client.batch_execute(CREATE_MIGRATION_TABLE).await?;
    migration_01::run_migration(client).await
}

pub async fn run_migration_down(client: &mut Client) -> Result<(), anyhow::Error> {
    migration_01::run_migration_down(client).await
}
