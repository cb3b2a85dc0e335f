//! HTTP transport: the same three commands behind POST routes.
//!
//! All handlers funnel into one shared [`Dispatcher`] behind a mutex, so
//! commands stay serialised exactly as on the line transport. Every response
//! carries the CORS headers the editor front-end expects.

use std::sync::Mutex;

use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer};
use tracing::{debug, info};

use crate::config::HttpConfig;
use crate::dispatch::Dispatcher;
use crate::error::{IoContext, Result};

/// Run the HTTP server until it is shut down, then close the database
/// handles.
pub async fn serve(dispatcher: Dispatcher, config: HttpConfig) -> Result<()> {
    let data = web::Data::new(Mutex::new(dispatcher));
    let state = data.clone();
    let origin = config.allowed_origin.clone();

    info!("listening on http://{}", config.bind);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(cors_headers(&origin))
            .configure(routes)
    })
    .workers(config.workers)
    .bind(&config.bind)
    .io_context(|| format!("Failed to bind to {}", config.bind))?
    .run()
    .await
    .io_context(|| "HTTP server failed".into())?;

    // All worker apps are gone once `run` returns, so the dispatcher can be
    // reclaimed for the ordered shutdown.
    if let Ok(mutex) = std::sync::Arc::try_unwrap(state.into_inner()) {
        let dispatcher = mutex.into_inner().unwrap_or_else(|p| p.into_inner());
        dispatcher.close()?;
    } else {
        debug!("dispatcher still referenced at shutdown, skipping checkpoint");
    }
    Ok(())
}

fn routes(cfg: &mut web::ServiceConfig) {
    // Preflights are answered per resource; a matched path with an unmatched
    // method would otherwise short-circuit to 405 before the default service.
    for path in ["/query", "/import", "/export"] {
        cfg.service(
            web::resource(path)
                .route(web::post().to(command))
                .route(preflight_route()),
        );
    }
    cfg.default_service(preflight_route());
}

fn preflight_route() -> actix_web::Route {
    web::route()
        .method(actix_web::http::Method::OPTIONS)
        .to(preflight)
}

/// The headers the browser front-end needs on every response, including
/// failures and preflights.
fn cors_headers(origin: &str) -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Credentials", "true"))
        .add(("Access-Control-Allow-Origin", origin))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add((
            "Access-Control-Allow-Headers",
            "X-Requested-With, Content-type",
        ))
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn command(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<Mutex<Dispatcher>>,
) -> HttpResponse {
    let path = req.path().to_owned();
    // The whole command runs under the lock on the blocking pool; rusqlite
    // handles must not be shared across threads concurrently.
    let outcome = web::block(move || {
        let mut dispatcher = state.lock().unwrap_or_else(|p| p.into_inner());
        dispatcher.dispatch(&path, &body)
    })
    .await;

    match outcome {
        Ok(Ok(payload)) => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .body(payload),
        Ok(Err(err)) => HttpResponse::BadRequest()
            .content_type("text/plain; charset=utf-8")
            .body(err.to_string()),
        Err(err) => HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use sqlink_codec::{decode, encode, Value};
    use sqlink_db::BridgeDb;

    fn test_state() -> (tempfile::TempDir, web::Data<Mutex<Dispatcher>>) {
        let dir = tempfile::tempdir().unwrap();
        let db = BridgeDb::open(dir.path().join("test.db"), None).unwrap();
        let dispatcher = Dispatcher::new(db, dir.path().to_path_buf());
        (dir, web::Data::new(Mutex::new(dispatcher)))
    }

    fn query_body(query: &str, mode: &str) -> Vec<u8> {
        encode(&Value::Map(vec![
            ("query".to_owned(), query.into()),
            ("params".to_owned(), Value::Array(vec![])),
            ("mode".to_owned(), mode.into()),
        ]))
        .unwrap()
    }

    fn assert_cors(resp: &actix_web::dev::ServiceResponse) {
        let headers = resp.headers();
        assert_eq!(
            headers.get("Access-Control-Allow-Origin").unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get("Access-Control-Allow-Credentials").unwrap(),
            "true"
        );
        assert_eq!(
            headers.get("Access-Control-Allow-Methods").unwrap(),
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers.get("Access-Control-Allow-Headers").unwrap(),
            "X-Requested-With, Content-type"
        );
    }

    #[actix_web::test]
    async fn query_answers_200_with_encoded_payload() {
        let (_dir, state) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .wrap(cors_headers("http://localhost:5173"))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_payload(query_body("SELECT 1", "read"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_cors(&resp);

        let payload = test::read_body(resp).await;
        assert_eq!(
            decode(&payload).unwrap(),
            Value::Map(vec![
                ("columns".into(), Value::Array(vec!["1".into()])),
                (
                    "records".into(),
                    Value::Array(vec![Value::Map(vec![("1".into(), Value::Int(1))])])
                ),
            ])
        );
    }

    #[actix_web::test]
    async fn failure_answers_400_with_cors_headers() {
        let (_dir, state) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .wrap(cors_headers("http://localhost:5173"))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_payload(query_body("SELECT * FROM missing", "read"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        assert_cors(&resp);

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Query: SELECT * FROM missing"));
    }

    #[actix_web::test]
    async fn preflight_answers_200_anywhere() {
        let (_dir, state) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .wrap(cors_headers("http://localhost:5173"))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::with_uri("/query")
            .method(actix_web::http::Method::OPTIONS)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_cors(&resp);
    }
}
