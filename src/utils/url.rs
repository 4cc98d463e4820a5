//! Endpoint URL construction, tolerant of trailing/leading slashes so a
//! user-supplied base URL never produces a double slash.

pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}
