use std::time::Duration;

// Defaults for the WebDriver session
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 800);
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30); // Timeout for creating a session

// Chrome browser arguments
pub fn chrome_arguments(headless: bool) -> Vec<String> {
    vec![
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-notifications",
        "--disable-infobars",
        "--disable-popup-blocking",
        "--disable-background-networking",
        "--disable-breakpad",
        "--disable-features=TranslateUI",
        "--mute-audio",
        if headless { "--headless=new" } else { "" }
    ].into_iter()
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

// Chrome content settings preferences
pub fn chrome_preferences() -> serde_json::Map<String, serde_json::Value> {
    let mut prefs = serde_json::Map::new();
    prefs.insert("profile.default_content_setting_values.images".to_string(), 2.into()); // 2 = block, titles and links only
    prefs.insert("profile.managed_default_content_settings.javascript".to_string(), 1.into()); // 1 = allow
    prefs.insert("profile.managed_default_content_settings.popups".to_string(), 2.into()); // 2 = block
    prefs.insert("profile.managed_default_content_settings.geolocation".to_string(), 2.into()); // 2 = block
    prefs.insert("profile.managed_default_content_settings.notifications".to_string(), 2.into()); // 2 = block
    prefs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_flag() {
        assert!(chrome_arguments(true).contains(&"--headless=new".to_string()));
        let headed = chrome_arguments(false);
        assert!(!headed.iter().any(|arg| arg.starts_with("--headless")));
        assert!(!headed.iter().any(|arg| arg.is_empty()));
    }

    #[test]
    fn test_preferences_allow_javascript() {
        let prefs = chrome_preferences();
        assert_eq!(
            prefs.get("profile.managed_default_content_settings.javascript"),
            Some(&serde_json::Value::from(1))
        );
    }
}
