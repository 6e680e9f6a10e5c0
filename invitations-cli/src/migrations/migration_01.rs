use chrono::Utc;
use invitations_core::models::migrations::{self, Migration, MigrationCriteria};
use tokio_postgres::{Client, Transaction};
use tracing::{error, info};
use uuid::Uuid;

const NAME: &str = "migration_01";
const SEQ_ORDER: i32 = 1;

const UP: &str = "
create table if not exists invitations (
  id uuid not null primary key,
  email varchar(254) not null unique,
  accepted boolean not null default false,
  created timestamptz not null default current_timestamp,
  key varchar(64) not null unique,
  sent timestamptz,
  inviter_id uuid
);";

const DOWN: &str = "
drop table if exists invitations;";

pub async fn run_migration_up(client: &Transaction<'_>) -> Result<(), anyhow::Error> {
    client.batch_execute(UP).await?;
    Ok(())
}

pub async fn run_migration_down(client: &mut Client) -> Result<(), anyhow::Error> {
    let trans = client.transaction().await?;
    trans.batch_execute(DOWN).await?;
    trans
        .execute("delete from migrations where seq_order = $1", &[&SEQ_ORDER])
        .await?;
    trans.commit().await?;
    info!("{} down ran without error", NAME);
    Ok(())
}

pub async fn run_migration(client: &mut Client) -> Result<(), anyhow::Error> {
    let trans = client.transaction().await?;
    let applied = migrations::find_one(&trans)(vec![MigrationCriteria::SeqOrderEq(SEQ_ORDER)]).await?;
    if applied.is_some() {
        info!("{} already applied", NAME);
        return Ok(());
    }
    if let Err(e) = run_migration_up(&trans).await {
        error!(error = %e, "{} up failed, rolling back", NAME);
        trans.rollback().await?;
        return Err(e);
    }
    let new_migration = Migration {
        id: Uuid::new_v4(),
        name: NAME.to_string(),
        seq_order: SEQ_ORDER,
        up: UP.to_string(),
        down: DOWN.to_string(),
        applied_on: Utc::now(),
    };
    migrations::create(&trans)(new_migration).await?;
    trans.commit().await?;
    info!("{} ran without error", NAME);
    Ok(())
}
