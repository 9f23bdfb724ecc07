//! HTTP-level tests: the endpoint always answers 200 with a JSON envelope.

use async_graphql::dynamic::{Field, FieldFuture, TypeRef};
use async_graphql::Value;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tonic::transport::Channel;
use tower::ServiceExt;

use graphql_gateway::{
    Connection, CorsConfig, FieldMap, Gateway, GatewayContext, GraphqlHandler,
};

struct HelloHandler;

#[async_trait]
impl GraphqlHandler for HelloHandler {
    async fn connect(&self, _ctx: &GatewayContext) -> anyhow::Result<Connection> {
        Ok(Connection::shared(
            Channel::from_static("http://127.0.0.1:50051").connect_lazy(),
        ))
    }

    fn queries(&self, _channel: Option<&Channel>) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(
            "hello",
            Field::new("hello", TypeRef::named_nn(TypeRef::STRING), |_| {
                FieldFuture::new(async { Ok(Some(Value::from("world"))) })
            }),
        );
        fields
    }

    fn mutations(&self, _channel: Option<&Channel>) -> FieldMap {
        FieldMap::new()
    }
}

fn hello_gateway() -> Gateway {
    Gateway::builder().register(HelloHandler).unwrap().build()
}

async fn send(gateway: Gateway, body: &str) -> (StatusCode, serde_json::Value) {
    let router = gateway.into_router();
    let request = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn success_is_200_with_data() {
    let (status, body) = send(hello_gateway(), r#"{"query": "{ hello }"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["hello"], "world");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn malformed_body_is_still_200() {
    let (status, body) = send(hello_gateway(), "{ this is not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"][0]["extensions"]["code"], "REQUEST_PARSE_ERROR");
}

#[tokio::test]
async fn execution_errors_are_still_200() {
    let (status, body) = send(hello_gateway(), r#"{"query": "{ unknownField }"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn custom_endpoint_path_is_honored() {
    let gateway = Gateway::builder()
        .register(HelloHandler)
        .unwrap()
        .endpoint("/api/graphql")
        .build();
    let router = gateway.into_router();

    let request = Request::builder()
        .method("POST")
        .uri("/api/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"query": "{ hello }"}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_preflight_is_answered_when_configured() {
    let gateway = Gateway::builder()
        .register(HelloHandler)
        .unwrap()
        .cors(CorsConfig::default())
        .build();
    let router = gateway.into_router();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/graphql")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
