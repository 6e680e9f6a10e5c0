use anyhow::Error;
use tokio_postgres::{types::ToSql, GenericClient, Row};
use tracing::debug;

pub fn create_insert_sql(table: &str, id_field: &str, fields: &[String]) -> String {
    let fields_sql: String = fields
        .iter()
        .fold(id_field.to_string(), |acc, x| format!("{}, {}", acc, x));
    let field_range = 2..fields.len() + 2;
    let field_params = field_range.fold("$1".to_string(), |acc, x| format!("{}, ${}", acc, x));
    format!(
        "insert into {} ({}) values ({})",
        table, fields_sql, field_params
    )
}

/// Builds `update <table> set a = $1 , b = $2 where id = $3`.
///
/// The id parameter always comes last, after every field parameter.
pub fn create_update_sql(table: &str, id_field: &str, fields: &[String]) -> String {
    let (fields_sql, _) = fields.iter().fold((String::new(), 1), |(q, i), x| {
        if q.is_empty() {
            (format!("{} = ${}", x, i), i + 1)
        } else {
            (format!("{} , {} = ${}", q, x, i), i + 1)
        }
    });
    format!(
        "update {} set {} where {} = ${}",
        table,
        fields_sql,
        id_field,
        fields.len() + 1
    )
}

pub async fn insert<C>(
    client: &C,
    table: &str,
    id_field: &str,
    fields: &[String],
    id_param: &(dyn ToSql + Sync),
    params: &[&(dyn ToSql + Sync)],
) -> Result<(), Error>
where
    C: GenericClient + Sync,
{
    let insert_sql = create_insert_sql(table, id_field, fields);
    debug!(sql = %insert_sql, "insert");
    let stmt = client.prepare(&insert_sql).await?;
    let all_params = [&[id_param][..], params].concat();
    client.execute(&stmt, all_params.as_slice()).await?;
    Ok(())
}

pub async fn update<C>(
    client: &C,
    table: &str,
    id_field: &str,
    fields: &[String],
    id_param: &(dyn ToSql + Sync),
    params: &[&(dyn ToSql + Sync)],
) -> Result<u64, Error>
where
    C: GenericClient + Sync,
{
    let update_sql = create_update_sql(table, id_field, fields);
    debug!(sql = %update_sql, "update");
    let stmt = client.prepare(&update_sql).await?;
    let all_params = [params, &[id_param][..]].concat();
    let affected = client.execute(&stmt, all_params.as_slice()).await?;
    Ok(affected)
}

pub type Field = String;
pub type Value = dyn ToSql + Sync;

pub enum QueryCondition<'a> {
    Eq(Field, &'a Value),
    Neq(Field, &'a Value),
    Gt(Field, &'a Value),
    Gte(Field, &'a Value),
    Lt(Field, &'a Value),
    Lte(Field, &'a Value),
    In(Field, &'a Value),
    Nin(Field, &'a Value),
    Like(Field, &'a Value),
    NLike(Field, &'a Value),
}

impl<'a> QueryCondition<'a> {
    pub fn param(&self) -> &'a Value {
        match self {
            QueryCondition::Eq(_, p)
            | QueryCondition::Neq(_, p)
            | QueryCondition::Gt(_, p)
            | QueryCondition::Gte(_, p)
            | QueryCondition::Lt(_, p)
            | QueryCondition::Lte(_, p)
            | QueryCondition::In(_, p)
            | QueryCondition::Nin(_, p)
            | QueryCondition::Like(_, p)
            | QueryCondition::NLike(_, p) => *p,
        }
    }
}

pub fn query_cond_to_string(q_cond: &QueryCondition, n: usize) -> String {
    match q_cond {
        QueryCondition::Eq(f, _) => format!("{} = ${}", f, n),
        QueryCondition::Neq(f, _) => format!("{} != ${}", f, n),
        QueryCondition::Gt(f, _) => format!("{} > ${}", f, n),
        QueryCondition::Gte(f, _) => format!("{} >= ${}", f, n),
        QueryCondition::Lt(f, _) => format!("{} < ${}", f, n),
        QueryCondition::Lte(f, _) => format!("{} <= ${}", f, n),
        QueryCondition::In(f, _) => format!("{} = any(${})", f, n),
        QueryCondition::Nin(f, _) => format!("{} != all(${})", f, n),
        QueryCondition::Like(f, _) => format!("{} like ${}", f, n),
        QueryCondition::NLike(f, _) => format!("{} not like ${}", f, n),
    }
}

pub fn generate_select<'a>(
    table: &str,
    query_conditions: &[QueryCondition<'a>],
) -> (String, Vec<&'a Value>) {
    let base_query = format!("select * from {}", table);
    if query_conditions.is_empty() {
        (base_query, vec![])
    } else {
        let (where_part, _) = query_conditions
            .iter()
            .fold((String::new(), 1), |(q, i), x| {
                (format!("{} and {}", q, query_cond_to_string(x, i)), i + 1)
            });
        let query_with_where = format!("{} where 1 = 1{}", base_query, where_part);
        let params = query_conditions.iter().map(|x| x.param()).collect();
        (query_with_where, params)
    }
}

pub async fn select_all<'a, C, F, A>(
    client: &C,
    table: &str,
    query_conditions: &[QueryCondition<'a>],
    map_row: F,
) -> Result<Vec<A>, Error>
where
    C: GenericClient + Sync,
    F: Fn(Row) -> A + Send + 'static,
{
    let (query, params) = generate_select(table, query_conditions);
    debug!(sql = %query, "select all");
    let stmt = client.prepare(&query).await?;
    let rows = client.query(&stmt, params.as_slice()).await?;
    Ok(rows.into_iter().map(map_row).collect())
}

pub async fn select<'a, C, F, A>(
    client: &C,
    table: &str,
    query_conditions: &[QueryCondition<'a>],
    from_row: F,
) -> Result<Option<A>, Error>
where
    C: GenericClient + Sync,
    F: Fn(Row) -> A + Send + 'static,
{
    let (query, params) = generate_select(table, query_conditions);
    debug!(sql = %query, "select");
    let stmt = client.prepare(&query).await?;
    let row_opt = client.query_opt(&stmt, params.as_slice()).await?;
    Ok(row_opt.map(from_row))
}

macro_rules! entity {
    (
        $(#[$struct_meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field_name:ident : $field_type:ty
            ),*$(,)+
    }) => {

        $(#[$struct_meta])*
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name : $field_type,
            )*
        }

        paste::paste! {
            #[derive(Debug)]
            pub enum [<$name Criteria>] {
                $([<$field_name:camel Eq>]($field_type)),*,
                $([<$field_name:camel Neq >]($field_type)),*,
                $([<$field_name:camel Gt>]($field_type)),*,
                $([<$field_name:camel Gte>]($field_type)),*,
                $([<$field_name:camel Lt>]($field_type)),*,
                $([<$field_name:camel Lte>]($field_type)),*,
                $([<$field_name:camel In>](Vec<$field_type>)),*,
                $([<$field_name:camel Nin>](Vec<$field_type>)),*,
                $([<$field_name:camel Like>]($field_type)),*,
                $([<$field_name:camel NLike>]($field_type)),*,
            }

            impl [<$name Criteria>] {
                pub fn to_query_condition(&self) -> $crate::postgres_common::core::QueryCondition<'_> {
                    use $crate::postgres_common::core::QueryCondition;
                    match self {
                        $([<$name Criteria>]::[<$field_name:camel Eq>](x) => QueryCondition::Eq(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel Neq>](x) => QueryCondition::Neq(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel Gt>](x) => QueryCondition::Gt(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel Gte>](x) => QueryCondition::Gte(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel Lt>](x) => QueryCondition::Lt(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel Lte>](x) => QueryCondition::Lte(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel In>](x) => QueryCondition::In(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel Nin>](x) => QueryCondition::Nin(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel Like>](x) => QueryCondition::Like(stringify!($field_name).to_string(), x)),*,
                        $([<$name Criteria>]::[<$field_name:camel NLike>](x) => QueryCondition::NLike(stringify!($field_name).to_string(), x)),*,
                    }
                }
            }
        }

        impl $name {
            pub fn field_names() -> &'static [&'static str] {
                static NAMES: &[&str] = &[$(stringify!($field_name)),*];
                NAMES
            }

            pub fn from_row(row: tokio_postgres::Row) -> $name {
                $(let $field_name: $field_type = row.get(stringify!($field_name));)*
                $name {
                    $($field_name),*
                }
            }

            /// Every field but the leading id, in declaration order.
            pub fn to_params(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
                let all: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = vec![
                    $(&self.$field_name as &(dyn tokio_postgres::types::ToSql + Sync)),*
                ];
                all.into_iter().skip(1).collect()
            }
        }
    }
}

pub(crate) use entity;

#[cfg(test)]
mod tests {
    use super::{create_insert_sql, create_update_sql, generate_select, QueryCondition};

    fn fields() -> Vec<String> {
        vec!["email".to_string(), "key".to_string(), "sent".to_string()]
    }

    #[test]
    pub fn test_insert_sql_puts_id_first() {
        let sql = create_insert_sql("invitations", "id", &fields());
        assert_eq!(
            "insert into invitations (id, email, key, sent) values ($1, $2, $3, $4)",
            sql
        );
    }

    #[test]
    pub fn test_update_sql_puts_id_last() {
        let sql = create_update_sql("invitations", "id", &fields());
        assert_eq!(
            "update invitations set email = $1 , key = $2 , sent = $3 where id = $4",
            sql
        );
    }

    #[test]
    pub fn test_select_without_conditions() {
        let conds: Vec<QueryCondition> = vec![];
        let (sql, params) = generate_select("invitations", &conds);
        assert_eq!("select * from invitations", sql);
        assert!(params.is_empty());
    }

    #[test]
    pub fn test_select_numbers_conditions_in_order() {
        let email = "a@b.com".to_string();
        let accepted = false;
        let conds = vec![
            QueryCondition::Eq("email".to_string(), &email),
            QueryCondition::Neq("accepted".to_string(), &accepted),
            QueryCondition::Lt("created".to_string(), &accepted),
        ];
        let (sql, params) = generate_select("invitations", &conds);
        assert_eq!(
            "select * from invitations where 1 = 1 and email = $1 and accepted != $2 and created < $3",
            sql
        );
        assert_eq!(3, params.len());
    }
}
