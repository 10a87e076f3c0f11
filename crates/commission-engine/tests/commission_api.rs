//! HTTP contract for triggering a commission run and reading the persisted rows back.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use commission_engine::commission::{
    commission_router, CalculatedCommissionRepository, ClosingPeriod, ClosingPeriodId,
    CommissionApi, CommissionFixture, CommissionService, CommissionStores,
    InMemoryCommissionStore, StaticTokenAuthenticator,
};

const TOKEN: &str = "payroll-secret";

fn fixture() -> CommissionFixture {
    serde_json::from_value(json!({
        "closing_periods": [
            { "id": "2025-03", "reference_month": "2025-03-01" }
        ],
        "sales": [
            { "closing_period_id": "2025-03", "salesperson": "a", "mrr": "3000",
              "interval": "Mensal", "sale_type": "Normal",
              "counts_toward_tier": true, "counts_toward_commission": true, "counts_toward_goal": true },
            { "closing_period_id": "2025-03", "salesperson": "b", "mrr": "2000",
              "interval": "Mensal", "sale_type": "Normal",
              "counts_toward_tier": true, "counts_toward_commission": true, "counts_toward_goal": true }
        ],
        "tiers": [
            { "name": "Starter", "min_mrr": "0", "max_mrr": "2499", "commission_percent": "5", "rank": 1 },
            { "name": "Pro", "min_mrr": "2500", "max_mrr": null, "commission_percent": "10", "rank": 2 }
        ],
        "parameters": [
            { "key": "goal_mrr", "value": "4000" },
            { "key": "goal_quantity", "value": "2" },
            { "key": "team_bonus_percent", "value": "10" },
            { "key": "company_bonus_percent", "value": "5" },
            { "key": "headcount", "value": "2" },
            { "key": "one_time_sale_commission_percent", "value": "8" }
        ]
    }))
    .expect("fixture json")
}

fn build_router() -> (Router, InMemoryCommissionStore) {
    let store = InMemoryCommissionStore::from_fixture(fixture());
    store
        .insert_period(ClosingPeriod {
            id: ClosingPeriodId("2025-04".to_string()),
            reference_month: NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"),
            summary: Default::default(),
        })
        .expect("empty period inserted");
    let service = CommissionService::new(CommissionStores::shared(Arc::new(store.clone())), 3);
    let api = CommissionApi {
        service: Arc::new(service),
        auth: Arc::new(StaticTokenAuthenticator::new(vec![TOKEN.to_string()])),
    };
    (commission_router(api), store)
}

fn calculate_request(body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/commissions/calculate")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json")
}

#[tokio::test]
async fn calculate_returns_run_summary() {
    let (router, _) = build_router();

    let response = router
        .oneshot(calculate_request(
            r#"{"closing_period_id":"2025-03"}"#,
            Some(TOKEN),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    let summary = &payload["summary"];
    assert_eq!(summary["closing_period_id"], json!("2025-03"));
    assert_eq!(summary["salespeople"], json!(2));
    assert_eq!(summary["sales_processed"], json!(2));
    assert_eq!(summary["goal_met"], json!(true));
    let total_mrr: Decimal = summary["total_mrr"]
        .as_str()
        .expect("decimal string")
        .parse()
        .expect("decimal");
    assert_eq!(total_mrr, Decimal::from(5_000));
}

#[tokio::test]
async fn calculate_rejects_unauthenticated_callers() {
    let (router, store) = build_router();

    for token in [None, Some("guess")] {
        let response = router
            .clone()
            .oneshot(calculate_request(r#"{"closing_period_id":"2025-03"}"#, token))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let payload = json_body(response).await;
        assert_eq!(payload["success"], json!(false));
    }

    let rows = store
        .commissions_for_period(&ClosingPeriodId("2025-03".to_string()))
        .expect("rows");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn calculate_maps_input_errors_to_client_statuses() {
    let (router, _) = build_router();

    let cases = [
        ("{}", StatusCode::BAD_REQUEST),
        (r#"{"closing_period_id":"  "}"#, StatusCode::BAD_REQUEST),
        ("not json", StatusCode::BAD_REQUEST),
        (r#"{"closing_period_id":"1999-01"}"#, StatusCode::NOT_FOUND),
    ];
    for (body, expected) in cases {
        let response = router
            .clone()
            .oneshot(calculate_request(body, Some(TOKEN)))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), expected, "body {body}");
        let payload = json_body(response).await;
        assert_eq!(payload["success"], json!(false));
        assert!(payload["error"].is_string());
    }
}

#[tokio::test]
async fn empty_period_completes_with_zero_salespeople() {
    let (router, _) = build_router();

    let response = router
        .oneshot(calculate_request(
            r#"{"closing_period_id":"2025-04"}"#,
            Some(TOKEN),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["summary"]["salespeople"], json!(0));
    assert_eq!(payload["summary"]["goal_met"], json!(false));
}

#[tokio::test]
async fn persisted_rows_can_be_read_back() {
    let (router, _) = build_router();

    let response = router
        .clone()
        .oneshot(calculate_request(
            r#"{"closing_period_id":"2025-03"}"#,
            Some(TOKEN),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/commissions/2025-03")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    let rows = payload["commissions"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    let totals: Vec<Decimal> = rows
        .iter()
        .map(|row| {
            row["total"]
                .as_str()
                .expect("decimal string")
                .parse()
                .expect("decimal")
        })
        .collect();
    assert!(totals.contains(&Decimal::from(725)));
    assert!(totals.contains(&Decimal::from(425)));
}

#[tokio::test]
async fn reading_unknown_period_returns_not_found() {
    let (router, _) = build_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/commissions/1999-01")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_for_one_period_both_complete() {
    let (router, store) = build_router();

    let (first, second) = tokio::join!(
        router.clone().oneshot(calculate_request(
            r#"{"closing_period_id":"2025-03"}"#,
            Some(TOKEN),
        )),
        router.clone().oneshot(calculate_request(
            r#"{"closing_period_id":"2025-03"}"#,
            Some(TOKEN),
        )),
    );

    assert_eq!(first.expect("router dispatch").status(), StatusCode::OK);
    assert_eq!(second.expect("router dispatch").status(), StatusCode::OK);
    let rows = store
        .commissions_for_period(&ClosingPeriodId("2025-03".to_string()))
        .expect("rows");
    assert_eq!(rows.len(), 2);
}
