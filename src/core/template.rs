//! Placeholder substitution for Apache conf/wsgi templates.
//!
//! Templates shipped in the site repository use `<key>` markers
//! (e.g. `<servername>`); rendering replaces each marker with the
//! configured value. No escaping, no conditionals.

use std::collections::HashMap;

pub struct TemplateVars;

impl TemplateVars {
    pub const PROJECT: &'static str = "project";
    pub const ENVIRONMENT: &'static str = "environment";
    pub const SERVER_NAME: &'static str = "servername";
    pub const HOME: &'static str = "home";
    pub const CERTIFICATE_FILE: &'static str = "certificate-file";
}

pub fn render_map(template: &str, variables: &HashMap<String, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("<{}>", key);
        result = result.replace(&placeholder, value);
    }

    result
}

/// Check whether a template still carries a marker for the given key.
pub fn is_present(template: &str, key: &str) -> bool {
    template.contains(&format!("<{}>", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_replaces_all_occurrences() {
        let rendered = render_map(
            "ServerName <servername>\nServerAlias www.<servername>",
            &vars(&[("servername", "example.org")]),
        );
        assert_eq!(rendered, "ServerName example.org\nServerAlias www.example.org");
    }

    #[test]
    fn render_leaves_unknown_markers() {
        let rendered = render_map("<project> <unknown>", &vars(&[("project", "site")]));
        assert_eq!(rendered, "site <unknown>");
        assert!(is_present(&rendered, "unknown"));
    }
}
