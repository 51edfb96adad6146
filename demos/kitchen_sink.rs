//! Every piece wired together: negotiation with JSON and HTML renderers,
//! path normalization, named routes, resources and scopes.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example kitchen_sink
//!
//! Try:
//!   curl -i http://localhost:3000/
//!   curl -i -H 'accept: text/html' http://localhost:3000/
//!   curl -i http://localhost:3000/api/articles          # 301 → /api/articles/
//!   curl -i 'http://localhost:3000/api//articles/7/?format=text/html'
//!   curl -i -X POST http://localhost:3000/api/articles/ -d '{"title":"hi"}'

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tsu_utils::middleware::{NormalizePath, Trace};
use tsu_utils::negotiation::renderer::{self, RenderContext};
use tsu_utils::negotiation::{JsonRenderer, NegotiationConfig, RendererRegistry};
use tsu_utils::{App, Error, Negotiable, Request, Resource, Router, Server, Settings, negotiation};

#[derive(Serialize)]
struct Article {
    id: u32,
    title: String,
}

#[derive(Deserialize)]
struct NewArticle {
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env();

    let articles = Resource::new("ArticleList")
        .get(list_articles)
        .post(create_article);

    let router = Router::new()
        .named(Method::GET, "/", index, "index")
        .scope("/api/", Some("api"), |s| {
            s.resource("/articles/", articles)
                .route(Method::GET, "/articles/{id}/", show_article)
        });

    let renderers = RendererRegistry::new()
        .with("application/json", JsonRenderer::pretty())
        .with("text/html", renderer::from_sync_fn(render_html));

    let config = NegotiationConfig::default()
        .with_settings(&settings.negotiation)
        .accept_query_param("format")
        .renderers(renderers);

    let app = App::new(router)
        .wrap(Trace)
        .wrap(NormalizePath::from_settings(&settings.path_norm));
    let app = negotiation::setup(app, config)?;

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /
async fn index(req: Request) -> Negotiable {
    let representation = req.selected_media_type().unwrap_or("unknown").to_owned();
    Negotiable::new(json!({
        "message": "Let's negotiate",
        "representation": representation,
    }))
}

// GET /api/articles/
async fn list_articles(_req: Request) -> Result<Negotiable, Error> {
    Negotiable::serialize(&[
        Article { id: 1, title: "Accept headers".to_owned() },
        Article { id: 2, title: "Trailing slashes".to_owned() },
    ])
}

// POST /api/articles/
async fn create_article(req: Request) -> Result<Negotiable, Error> {
    let new: NewArticle = match serde_json::from_slice(req.body()) {
        Ok(new) => new,
        Err(_) => return Ok(Negotiable::empty().with_status(StatusCode::BAD_REQUEST)),
    };
    let article = Article { id: 3, title: new.title };
    Ok(Negotiable::serialize(&article)?.with_status(StatusCode::CREATED))
}

// GET /api/articles/{id}/
async fn show_article(req: Request) -> Negotiable {
    match req.param("id").and_then(|id| id.parse::<u32>().ok()) {
        Some(id) => Negotiable::new(json!({ "id": id, "title": format!("Article {id}") })),
        None => Negotiable::empty().with_status(StatusCode::NOT_FOUND),
    }
}

fn render_html(data: Value, cx: &RenderContext) -> Result<String, Error> {
    let body = serde_json::to_string_pretty(&data)?;
    Ok(format!(
        "<!doctype html><title>{path}</title><pre>{body}</pre>",
        path = cx.path,
    ))
}
