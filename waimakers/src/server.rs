use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use serde::Deserialize;
use serde_json::{json, Value};

use common::{Article, Config, ServerConfig};

use crate::aggregator::NewsAggregator;
use crate::dashboard::{Dashboard, DashboardState};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub aggregator: Arc<NewsAggregator>,
    /// Article cap for fetches triggered over HTTP
    pub max_articles: usize,
}

type ApiResult = Result<Json<Value>, (Status, Json<Value>)>;

fn missing_field(name: &str) -> (Status, Json<Value>) {
    (
        Status::BadRequest,
        Json(json!({ "error": format!("Missing '{}' field", name) })),
    )
}

#[derive(Deserialize)]
struct UserBody {
    name: Option<String>,
}

#[derive(Deserialize)]
struct PodcastBody {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ArticlesBody {
    articles: Option<Vec<Article>>,
}

#[derive(Deserialize)]
struct ArticleBody {
    article: Option<Article>,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/api/state")]
async fn get_state(state: &State<AppState>) -> Json<DashboardState> {
    Json(state.dashboard.snapshot().await)
}

#[post("/api/user", data = "<body>")]
async fn set_user(state: &State<AppState>, body: Json<UserBody>) -> ApiResult {
    let name = body.into_inner().name.ok_or_else(|| missing_field("name"))?;
    let user_name = state.dashboard.set_user_name(name).await;
    Ok(Json(json!({ "success": true, "user_name": user_name })))
}

#[post("/api/podcast", data = "<body>")]
async fn set_podcast(state: &State<AppState>, body: Json<PodcastBody>) -> ApiResult {
    let url = body.into_inner().url.ok_or_else(|| missing_field("url"))?;
    let podcast_link = state.dashboard.set_podcast_link(url).await;
    Ok(Json(json!({ "success": true, "podcast_link": podcast_link })))
}

#[post("/api/articles", data = "<body>")]
async fn load_articles(state: &State<AppState>, body: Json<ArticlesBody>) -> ApiResult {
    let articles = body.into_inner().articles.ok_or_else(|| missing_field("articles"))?;
    let count = state.dashboard.load_articles(articles).await;
    Ok(Json(json!({ "success": true, "count": count })))
}

#[post("/api/article", data = "<body>")]
async fn add_article(state: &State<AppState>, body: Json<ArticleBody>) -> ApiResult {
    let article = body.into_inner().article.ok_or_else(|| missing_field("article"))?;
    let count = state.dashboard.add_article(article).await;
    Ok(Json(json!({ "success": true, "count": count })))
}

#[post("/api/clear")]
async fn clear(state: &State<AppState>) -> Json<Value> {
    state.dashboard.clear().await;
    Json(json!({ "success": true }))
}

/// Starts an aggregation run in the background; the dashboard picks up the result
/// when it completes.
#[post("/api/fetch")]
async fn trigger_fetch(state: &State<AppState>) -> Json<Value> {
    let aggregator = state.aggregator.clone();
    let dashboard = state.dashboard.clone();
    let max_articles = state.max_articles;

    tokio::spawn(async move {
        tracing::info!(max_articles, "manual fetch: triggered");
        let result = aggregator.fetch_all(max_articles).await;
        let count = dashboard.apply_fetch(result).await;
        tracing::info!(count, "manual fetch: dashboard updated");
    });

    Json(json!({ "success": true, "message": "Fetching news..." }))
}

/// CORS preflight for any path.
#[options("/<_..>")]
async fn preflight() -> Status {
    Status::Ok
}

#[catch(400)]
fn bad_request() -> (Status, Json<Value>) {
    (Status::BadRequest, Json(json!({ "error": "Invalid JSON" })))
}

#[catch(404)]
fn not_found() -> (Status, Json<Value>) {
    (Status::NotFound, Json(json!({ "error": "Unknown endpoint" })))
}

#[catch(422)]
fn unprocessable() -> (Status, Json<Value>) {
    (
        Status::UnprocessableEntity,
        Json(json!({ "error": "Invalid request body" })),
    )
}

/// Adds permissive CORS headers to every response.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "GET, POST, OPTIONS"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
    }
}

/// Builds the Rocket instance with managed state, API routes, catchers and,
/// when the directory exists, the static dashboard files.
pub fn build_rocket(state: AppState, server: &ServerConfig) -> Rocket<Build> {
    let fig = rocket::Config::figment()
        .merge(("address", server.bind.clone()))
        .merge(("port", server.port));

    let rocket = rocket::custom(fig)
        .manage(state)
        .attach(Cors)
        .mount(
            "/",
            routes![
                health,
                get_state,
                set_user,
                set_podcast,
                load_articles,
                add_article,
                clear,
                trigger_fetch,
                preflight,
            ],
        )
        .register("/", catchers![bad_request, not_found, unprocessable]);

    if Path::new(&server.static_dir).is_dir() {
        rocket.mount("/", FileServer::from(&server.static_dir))
    } else {
        tracing::warn!(static_dir = %server.static_dir, "static directory not found; serving API only");
        rocket
    }
}

/// Build and launch the dashboard server.
///
/// This function blocks until the Rocket server shuts down and returns an error if
/// Rocket fails to start.
pub async fn launch_rocket(
    config: &Config,
    dashboard: Dashboard,
    aggregator: Arc<NewsAggregator>,
) -> Result<()> {
    let state = AppState {
        dashboard,
        aggregator,
        max_articles: config.fetcher.max_articles,
    };

    tracing::info!(
        bind = %config.server.bind,
        port = config.server.port,
        "Starting Rocket HTTP server"
    );
    build_rocket(state, &config.server)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
