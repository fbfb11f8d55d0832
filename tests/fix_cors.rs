use cloudstore_migrate::cli::fix_cors;
use cloudstore_migrate::contract::{
    CorsError, DriverCapabilities, MockStorageDriver, StorageDriver,
};
use cloudstore_migrate::driver::{DriverConfig, HttpBlobDriver};

#[tokio::test]
async fn drivers_without_advanced_rules_are_reported_not_fatal() {
    let mut driver = MockStorageDriver::new();
    driver.expect_capabilities().returning(|| DriverCapabilities {
        driver_name: "basic-blob".to_string(),
        supports_advanced_rules: false,
    });
    // The provider API must never be touched for such drivers.
    driver.expect_configure_cors().never();

    let origins = vec!["https://example.org".to_string()];
    fix_cors(&driver, &origins).await.expect("not fatal");
}

#[tokio::test]
async fn supported_drivers_get_the_rules_applied_with_get_only() {
    let mut driver = MockStorageDriver::new();
    driver.expect_capabilities().returning(|| DriverCapabilities {
        driver_name: "azure-blob".to_string(),
        supports_advanced_rules: true,
    });
    driver
        .expect_configure_cors()
        .withf(|origins, methods| {
            origins.len() == 1
                && origins[0] == "https://example.org"
                && methods.len() == 1
                && methods[0] == "GET"
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let origins = vec!["https://example.org".to_string()];
    fix_cors(&driver, &origins).await.expect("rules applied");
}

#[tokio::test]
async fn http_driver_short_circuits_before_any_provider_call() {
    // Endpoint is deliberately unroutable: Unsupported must come back from
    // the capability check, not from a failed request.
    let driver = HttpBlobDriver::new(DriverConfig {
        name: "basic-blob".to_string(),
        endpoint: "http://127.0.0.1:1".to_string(),
        container: "resources".to_string(),
        access_key: None,
        advanced_rules: false,
    });

    let origins = vec!["https://example.org".to_string()];
    let methods = vec!["GET".to_string()];
    let err = driver
        .configure_cors(&origins, &methods)
        .await
        .expect_err("unsupported driver");
    assert!(matches!(err, CorsError::Unsupported { driver } if driver == "basic-blob"));
}
