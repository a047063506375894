use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let viewer_assets = Router::new()
        .fallback_service(
            ServeDir::new(&state.static_dir)
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_bundle_cache_control));

    let api = Router::new()
        .route("/api/district-status", get(routes::api::get_district_status))
        .route("/api/update-status", post(routes::api::update_status))
        .route("/api/health", get(routes::api::health))
        .layer(CompressionLayer::new());

    Router::new()
        .route("/api/events", get(routes::sse::status_events))
        .merge(api)
        .fallback_service(viewer_assets)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn set_bundle_cache_control(request: Request, next: Next) -> Response {
    let immutable = is_fingerprinted_bundle(request.uri().path());
    let mut response = next.run(request).await;

    if immutable && response.status().is_success() {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        );
    }
    response
}

/// Bundler output such as `smartcenter-client-1f2e3d4c5b6a7980_bg.wasm` carries
/// a content hash in its name and can be cached forever.
fn is_fingerprinted_bundle(path: &str) -> bool {
    let path = Path::new(path);
    let is_bundle_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "wasm" | "js" | "css"));
    if !is_bundle_ext {
        return false;
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| {
            stem.split(['-', '_', '.'])
                .any(|part| part.len() >= 16 && part.chars().all(|c| c.is_ascii_hexdigit()))
        })
}

#[cfg(test)]
mod tests {
    use super::is_fingerprinted_bundle;

    #[test]
    fn hashed_bundles_are_fingerprinted() {
        assert!(is_fingerprinted_bundle(
            "/smartcenter-client-1f2e3d4c5b6a7980_bg.wasm"
        ));
        assert!(is_fingerprinted_bundle("/index-00aa11bb22cc33dd.css"));
    }

    #[test]
    fn plain_assets_are_not_fingerprinted() {
        assert!(!is_fingerprinted_bundle("/index.html"));
        assert!(!is_fingerprinted_bundle("/main.js"));
        assert!(!is_fingerprinted_bundle("/data/1f2e3d4c5b6a7980.geojson"));
    }
}
