use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use log::{info, warn};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use crate::advertisements::AdService;
use crate::auth::ADMIN_HEADER;
use crate::config::AppConfig;
use crate::handlers::{advertisements, listings, requests, system};
use crate::listings::ListingService;
use crate::models::ListingKind;
use crate::requests::RequestService;
use crate::store::Store;
use crate::uploads::PUBLIC_PREFIX;

const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub requests: RequestService,
    pub houses: ListingService,
    pub lands: ListingService,
    pub ads: AdService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        Self {
            requests: RequestService::new(&store),
            houses: ListingService::new(&store, ListingKind::House),
            lands: ListingService::new(&store, ListingKind::Land),
            ads: AdService::new(&store),
            config: Arc::new(config),
            store,
        }
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    info!("{} {}", request.method(), request.uri());
    next.run(request).await
}

fn cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(ADMIN_HEADER),
        ])
        .allow_credentials(true)
}

fn listing_routes(service: ListingService) -> Router<AppState> {
    Router::new()
        .route("/", get(listings::list).post(listings::create))
        .route("/:id/status", put(listings::set_status))
        .with_state(service)
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(system::health))
        .route("/backup", get(system::backup))
        .route("/requests", get(requests::list).post(requests::submit))
        .route("/requests/stats/counts", get(requests::stats))
        .route("/requests/:id", get(requests::view).delete(requests::delete))
        .route("/requests/:id/status", put(requests::transition))
        .nest("/houses", listing_routes(state.houses.clone()))
        .nest("/lands", listing_routes(state.lands.clone()))
        .route(
            "/advertisements",
            get(advertisements::list).post(advertisements::create),
        )
        .route(
            "/advertisements/:id",
            get(advertisements::view).delete(advertisements::delete),
        )
        .route("/advertisements/:id/click", post(advertisements::click))
        .route("/advertisements/:id/status", put(advertisements::set_status))
        .fallback(system::not_found);

    Router::new()
        .nest("/api", api)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&state.config.uploads_dir))
        .layer(middleware::from_fn(log_request))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(cors(&state.config))
        .with_state(state)
}
