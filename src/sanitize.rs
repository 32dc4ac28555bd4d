//! Inbound parameter sanitation: characters reserved by the query layer are
//! stripped before anything reaches the composer. Values are only ever bound
//! as parameters, so this is a boundary hardening step, not the escape hatch.

use std::collections::HashMap;

const RESERVED_CHARS: &[char] = &['$', ';', '\'', '"', '\\'];

pub fn clean_str(s: &str) -> String {
    s.chars().filter(|c| !RESERVED_CHARS.contains(c)).collect()
}

/// Strip reserved characters from both keys and values of a parameter map.
pub fn clean_params(params: HashMap<String, String>) -> HashMap<String, String> {
    params
        .into_iter()
        .map(|(k, v)| (clean_str(&k), clean_str(&v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_characters_are_stripped() {
        assert_eq!(clean_str("pri$ce"), "price");
        assert_eq!(clean_str("ea'sy\";--"), "easy--");
        assert_eq!(clean_str("plain"), "plain");
    }

    #[test]
    fn both_keys_and_values_are_cleaned() {
        let mut params = HashMap::new();
        params.insert("na$me".to_string(), "Sea; Explorer".to_string());
        let cleaned = clean_params(params);
        assert_eq!(cleaned.get("name").map(String::as_str), Some("Sea Explorer"));
    }
}
