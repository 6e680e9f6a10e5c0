use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio_postgres::GenericClient;
use uuid::Uuid;

use crate::postgres_common::core::{entity, insert, select, QueryCondition};

use super::common::field_names_without_id;

pub const MIGRATION_TABLE: &str = "migrations";

pub const CREATE_MIGRATION_TABLE: &str = "
create table if not exists migrations (
  id uuid not null primary key,
  name varchar(255) not null,
  seq_order integer not null unique,
  up text not null,
  down text not null,
  applied_on timestamptz not null default current_timestamp
);";

entity! {
  #[derive(Debug, Clone)]
  pub struct Migration {
    pub id : Uuid,
    pub name: String,
    pub seq_order: i32,
    pub up: String,
    pub down: String,
    pub applied_on: DateTime<Utc>,
  }
}

pub fn find_one<'a, C>(
    client: &'a C,
) -> impl FnOnce(Vec<MigrationCriteria>) -> BoxFuture<'a, Result<Option<Migration>, anyhow::Error>>
where
    C: GenericClient + Sync,
{
    move |crit: Vec<MigrationCriteria>| {
        Box::pin(async move {
            let cond: Vec<QueryCondition> = crit.iter().map(|x| x.to_query_condition()).collect();
            select(client, MIGRATION_TABLE, &cond, Migration::from_row).await
        })
    }
}

pub fn create<'a, C>(
    client: &'a C,
) -> impl FnOnce(Migration) -> BoxFuture<'a, Result<(), anyhow::Error>>
where
    C: GenericClient + Sync,
{
    move |migration: Migration| {
        Box::pin(async move {
            let fields = field_names_without_id(Migration::field_names());
            insert(
                client,
                MIGRATION_TABLE,
                "id",
                fields.as_slice(),
                &migration.id,
                &migration.to_params(),
            )
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::Migration;

    #[test]
    pub fn test_params_skip_id() {
        let m = Migration {
            id: Uuid::new_v4(),
            name: "migration_01".to_string(),
            seq_order: 1,
            up: "".to_string(),
            down: "".to_string(),
            applied_on: Utc::now(),
        };
        assert_eq!(
            &["id", "name", "seq_order", "up", "down", "applied_on"],
            Migration::field_names()
        );
        assert_eq!(5, m.to_params().len());
    }
}
