/// CORS for the browser chat client, which calls the gateway cross-origin.
pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type", "Accept", "Origin", "User-Agent", "Referer"])
        .allow_methods(vec!["POST", "GET", "OPTIONS"])
}
