use std::collections::HashMap;
use std::sync::OnceLock;

/// Global localization state
static LOCALIZER: OnceLock<Localizer> = OnceLock::new();

/// Initialize the global localizer. Safe to call more than once.
pub fn init() {
    localizer();
}

fn localizer() -> &'static Localizer {
    LOCALIZER.get_or_init(Localizer::new)
}

/// Get a localized message by key
pub fn t(key: &str) -> String {
    localizer().get(key)
}

/// Get a localized message by key with `{$name}` placeholders filled in
pub fn t_with_args(key: &str, args: &[(&str, &dyn std::fmt::Display)]) -> String {
    localizer().get_with_args(key, args)
}

#[derive(Debug)]
pub struct Localizer {
    messages: HashMap<String, String>,
}

impl Localizer {
    fn new() -> Self {
        Self::for_language(&Self::detect_language())
    }

    fn for_language(language: &str) -> Self {
        Self {
            messages: Self::load_messages(language),
        }
    }

    fn detect_language() -> String {
        let lang_vars = ["LC_ALL", "LC_MESSAGES", "LANG"];

        for var in &lang_vars {
            if let Ok(value) = std::env::var(var) {
                // "nb_NO.UTF-8" -> "nb"
                let locale = value.split('.').next().unwrap_or(&value);
                let lang_code = locale
                    .split(['_', '-'])
                    .next()
                    .unwrap_or(locale)
                    .to_lowercase();

                match lang_code.as_str() {
                    "nb" | "no" | "nor" | "nn" => return "nb".to_string(),
                    "en" => return "en".to_string(),
                    _ => continue,
                }
            }
        }

        "en".to_string()
    }

    fn load_messages(language: &str) -> HashMap<String, String> {
        let content = match language {
            "nb" => include_str!("../locales/nb.ftl"),
            _ => include_str!("../locales/en.ftl"),
        };

        // Simple `key = value` lines
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once(" = "))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect()
    }

    fn get(&self, key: &str) -> String {
        self.messages.get(key).cloned().unwrap_or_else(|| {
            tracing::warn!("Missing translation key: {key}");
            format!("MISSING: {key}")
        })
    }

    fn get_with_args(&self, key: &str, args: &[(&str, &dyn std::fmt::Display)]) -> String {
        let mut message = self.get(key);

        for (var_name, value) in args {
            let placeholder = format!("{{${var_name}}}");
            message = message.replace(&placeholder, &format!("{value}"));
        }

        message
    }
}

#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::t($key)
    };
}

#[macro_export]
macro_rules! t_args {
    ($key:expr, $($name:expr => $value:expr),*) => {{
        let args: &[(&str, &dyn std::fmt::Display)] = &[
            $(
                ($name, &$value),
            )*
        ];
        $crate::i18n::t_with_args($key, args)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_localization() {
        let localizer = Localizer::for_language("en");
        assert_eq!(localizer.get("cli-help-options"), "Options:");
    }

    #[test]
    fn test_placeholders_are_filled() {
        let localizer = Localizer::for_language("en");
        let args: &[(&str, &dyn std::fmt::Display)] = &[("test", &"combinational/x")];
        assert_eq!(
            localizer.get_with_args("error-test-not-found", args),
            "Error: test 'combinational/x' not found"
        );
    }

    #[test]
    fn test_locales_have_the_same_keys() {
        let en = Localizer::for_language("en");
        let nb = Localizer::for_language("nb");
        let mut en_keys: Vec<&String> = en.messages.keys().collect();
        let mut nb_keys: Vec<&String> = nb.messages.keys().collect();
        en_keys.sort();
        nb_keys.sort();
        assert_eq!(en_keys, nb_keys);
    }

    #[test]
    fn test_language_detection() {
        let _lang = Localizer::detect_language();
    }
}
