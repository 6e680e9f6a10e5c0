use std::{collections::HashMap, future::Future};

use validator::ValidationErrors;

/// Validate, map, reject duplicates, then insert. Returns the inserted item.
pub async fn create<T, DTO, E, FA, FB>(
    validate: impl FnOnce(&DTO) -> Result<(), E>,
    find_unique: impl FnOnce(&T) -> FA,
    insert: impl FnOnce(T) -> FB,
    mapper: impl FnOnce(&DTO) -> T,
    dto: &DTO,
    e: E,
) -> Result<T, E>
where
    T: Clone,
    FA: Future<Output = Result<Option<T>, E>>,
    FB: Future<Output = Result<(), E>>,
{
    validate(dto)?;
    let item = mapper(dto);
    let maybe_existing = find_unique(&item).await?;
    match maybe_existing {
        Some(_) => Err(e),
        None => {
            insert(item.clone()).await?;
            Ok(item)
        }
    }
}

pub fn hash_map_from_validation_errors(e: ValidationErrors) -> HashMap<String, String> {
    e.field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let msg = errs.iter().fold(String::new(), |acc, x| {
                let m = match &x.message {
                    Some(m) => m.to_string(),
                    None => x.code.to_string(),
                };
                if acc.is_empty() {
                    m
                } else {
                    format!("{}, {}", acc, m)
                }
            });
            (field.to_string(), msg)
        })
        .collect()
}

pub fn hash_map_to_string(hash_map: &HashMap<String, String>) -> String {
    let mut entries: Vec<_> = hash_map.iter().collect();
    entries.sort();
    entries.into_iter().fold(String::new(), |acc, (k, v)| {
        let new_msg = format!("{}: {}", k, v);
        if acc.is_empty() {
            new_msg
        } else {
            format!("{}, {}", acc, new_msg)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use futures::executor::block_on;

    use super::{create, hash_map_to_string};

    #[derive(Clone, Debug, PartialEq)]
    struct Item(String);

    #[test]
    pub fn test_create_rejects_existing() {
        let mut inserted = 0;
        let res = block_on(create(
            |_: &String| Ok(()),
            |i: &Item| {
                let found = Some(i.clone());
                async move { Ok(found) }
            },
            |_: Item| {
                inserted += 1;
                async { Ok(()) }
            },
            |dto: &String| Item(dto.clone()),
            &"x".to_string(),
            "exists",
        ));
        assert_eq!(Err("exists"), res);
        assert_eq!(0, inserted);
    }

    #[test]
    pub fn test_create_skips_lookup_on_invalid() {
        let mut looked_up = 0;
        let res = block_on(create(
            |_: &String| Err("invalid"),
            |_: &Item| {
                looked_up += 1;
                async { Ok(None) }
            },
            |_: Item| async { Ok(()) },
            |dto: &String| Item(dto.clone()),
            &"x".to_string(),
            "exists",
        ));
        assert_eq!(Err("invalid"), res);
        assert_eq!(0, looked_up);
    }

    #[test]
    pub fn test_hash_map_to_string_is_sorted() {
        let mut m = HashMap::new();
        m.insert("email".to_string(), "invalid_email".to_string());
        m.insert("aaa".to_string(), "x".to_string());
        assert_eq!("aaa: x, email: invalid_email", hash_map_to_string(&m));
    }
}
