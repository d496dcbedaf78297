use reqwest::Client;

const DISABLE_SYSTEM_PROXY_ENV: &str = "CIRRUS_DISABLE_SYSTEM_PROXY";

/// Shared reqwest client constructor for the completion client and backends.
pub fn build_http_client() -> Client {
    if should_disable_system_proxy() {
        Client::builder().no_proxy().build().unwrap_or_default()
    } else {
        Client::new()
    }
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}
