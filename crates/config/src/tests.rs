use crate::{AppConfig, CatalogApiConfig, CategoryMatching};
use figment::Jail;
use secrecy::{ExposeSecret, Secret};

const DEFAULT_TOML: &str = r#"
    app_name = "basket-template"

    [catalog_api]
    base_url = "http://localhost:8080/api"
"#;

#[test]
fn test_defaults_are_applied() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", DEFAULT_TOML)?;

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert_eq!(config.app_name, "basket-template");
        assert!(config.is_development());
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.validation.match_mode, CategoryMatching::MinimumOnly);
        assert_eq!(config.catalog_api.timeout_secs, 10);
        assert_eq!(config.catalog_api.retry.max_attempts, 3);
        assert!(config.catalog_api.api_token.is_none());
        Ok(())
    });
}

#[test]
fn test_environment_file_and_variables_override() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", DEFAULT_TOML)?;
        jail.create_file(
            "production.toml",
            r#"
                app_env = "production"

                [validation]
                match_mode = "strict"
            "#,
        )?;
        jail.set_env("APP_ENV", "production");
        jail.set_env("GIFTBOX_CATALOG_API__BASE_URL", "https://shop.example/api");
        jail.set_env("GIFTBOX_CATALOG_API__API_TOKEN", "s3cr3t");
        jail.set_env("GIFTBOX_CATALOG_API__RETRY__MAX_ATTEMPTS", "5");

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert!(config.is_production());
        assert_eq!(config.validation.match_mode, CategoryMatching::Strict);
        assert_eq!(config.catalog_api.base_url, "https://shop.example/api");
        assert_eq!(config.catalog_api.retry.max_attempts, 5);
        let token = config
            .catalog_api
            .api_token
            .as_ref()
            .map(|t| t.expose_secret().clone());
        assert_eq!(token.as_deref(), Some("s3cr3t"));
        Ok(())
    });
}

#[test]
fn test_missing_catalog_section_fails() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", r#"app_name = "basket-template""#)?;
        assert!(AppConfig::load(".").is_err());
        Ok(())
    });
}

#[test]
fn test_api_token_redaction() {
    let config = CatalogApiConfig {
        base_url: "http://localhost".to_string(),
        api_token: Some(Secret::new("super-secret-token".to_string())),
        timeout_secs: 5,
        retry: Default::default(),
    };
    let debug_output = format!("{:?}", config);
    assert!(!debug_output.contains("super-secret-token"));
    assert!(debug_output.contains("REDACTED"));
}
