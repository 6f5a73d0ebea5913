//! `tierline config`: Print configuration.

use tierline_config::AppConfig;

pub fn run(default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if default {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = AppConfig::load()?;
    print!("{}", render(&config)?);
    Ok(())
}

/// Serialize with the API key masked.
fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("***".into());
    }
    toml::to_string_pretty(&shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_masked() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());

        let out = render(&config).unwrap();
        assert!(!out.contains("sk-secret"));
        assert!(out.contains("***"));
    }

    #[test]
    fn rendered_config_parses_back() {
        let out = render(&AppConfig::default()).unwrap();
        let parsed = AppConfig::from_toml(&out).unwrap();
        assert_eq!(parsed.gateway.port, AppConfig::default().gateway.port);
    }
}
