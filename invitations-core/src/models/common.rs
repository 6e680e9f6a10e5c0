pub fn field_names_without_id(fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .filter(|x| **x != "id")
        .map(|x| x.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::field_names_without_id;

    #[test]
    pub fn test_id_is_dropped() {
        let fields = field_names_without_id(&["id", "email", "key"]);
        assert_eq!(vec!["email".to_string(), "key".to_string()], fields);
    }
}
