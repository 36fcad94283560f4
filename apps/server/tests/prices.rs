mod common;

use common::*;
use pricecache_market_data::Resolution;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn test_current_price_cache_hit() {
    let app = TestApp::new(MockProvider::default());
    app.cache.set_current(&price("AAPL", dec!(150.00))).await.unwrap();

    let (status, body) = call(&app.router, get("/api/v1/price/current?symbols=AAPL")).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"][0]["symbol"], json!("AAPL"));
    assert_eq!(body["data"][0]["current_price"], json!(150.0));
    assert!(body["timestamp"].is_string());
    assert!(app.provider.current_calls().is_empty());
}

#[tokio::test]
async fn test_current_price_partial_miss_fetches_only_missing() {
    let app = TestApp::new(MockProvider::default().with_quote("GOOGL", dec!(180.50)));
    app.cache.set_current(&price("AAPL", dec!(150.00))).await.unwrap();

    let (status, body) = call(&app.router, get("/api/v1/price/current?symbols=aapl,%20GOOGL")).await;

    assert_eq!(status, 200);
    let mut symbols: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["symbol"].as_str().unwrap().to_string())
        .collect();
    symbols.sort();
    assert_eq!(symbols, vec!["AAPL", "GOOGL"]);
    assert_eq!(app.provider.current_calls(), vec![vec!["GOOGL".to_string()]]);

    let cached = app.cache.get_current(&symbol("GOOGL")).await.unwrap();
    assert_eq!(cached.map(|p| p.current_price), Some(dec!(180.50)));
}

#[tokio::test]
async fn test_unknown_symbol_is_not_found() {
    let app = TestApp::new(MockProvider::default());

    let (status, body) = call(&app.router, get("/api/v1/price/current?symbols=ZZZZ")).await;

    assert_eq!(status, 404);
    assert_eq!(body["success"], json!(false));
    assert_eq!(error_code(&body), "SYMBOL_NOT_FOUND");
}

#[tokio::test]
async fn test_symbol_batch_boundaries() {
    let app = TestApp::new(MockProvider::default());
    let ten: Vec<String> = (0..10).map(|i| format!("S{}", i)).collect();
    for s in &ten {
        app.cache.set_current(&price(s, dec!(1))).await.unwrap();
    }

    let uri = format!("/api/v1/price/current?symbols={}", ten.join(","));
    let (status, body) = call(&app.router, get(&uri)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);

    let uri = format!("/api/v1/price/current?symbols={},S10", ten.join(","));
    let (status, body) = call(&app.router, get(&uri)).await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_INPUT");

    for uri in [
        "/api/v1/price/current",
        "/api/v1/price/current?symbols=",
        "/api/v1/price/current?symbols=%20,%20",
        "/api/v1/price/current?symbols=NOT*VALID",
    ] {
        let (status, body) = call(&app.router, get(uri)).await;
        assert_eq!(status, 400, "{uri}");
        assert_eq!(error_code(&body), "INVALID_INPUT", "{uri}");
    }
    assert!(app.provider.current_calls().is_empty());
}

#[tokio::test]
async fn test_historical_full_coverage_is_served_from_cache() {
    let app = TestApp::new(MockProvider::default());
    app.cache
        .set_historical(&series("AAPL", &[("2025-07-23", dec!(214.10)), ("2025-07-22", dec!(212.50))]))
        .await
        .unwrap();

    let uri = "/api/v1/price/historical?symbol=AAPL&resolution=daily&from=2025-07-20&to=2025-07-23";
    let (status, body) = call(&app.router, get(uri)).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["prices"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["prices"][0]["date"], json!("2025-07-23"));
    assert!(body.get("timestamp").is_none());
    assert!(app.provider.historical_calls().is_empty());
}

#[tokio::test]
async fn test_historical_partial_coverage_refetches_and_overwrites() {
    let fresh = series(
        "AAPL",
        &[
            ("2025-07-25", dec!(217.00)),
            ("2025-07-24", dec!(215.30)),
            ("2025-07-23", dec!(214.10)),
            ("2025-07-22", dec!(212.50)),
            ("2025-07-21", dec!(211.90)),
        ],
    );
    let app = TestApp::new(MockProvider::default().with_series(fresh));
    app.cache
        .set_historical(&series("AAPL", &[("2025-07-23", dec!(214.10))]))
        .await
        .unwrap();

    let uri = "/api/v1/price/historical?symbol=AAPL&resolution=daily&from=2025-07-20&to=2025-07-25";
    let (status, body) = call(&app.router, get(uri)).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["prices"].as_array().unwrap().len(), 5);
    assert_eq!(app.provider.historical_calls(), vec!["AAPL".to_string()]);

    let cached = app
        .cache
        .get_historical(&symbol("AAPL"), Resolution::Daily)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.newest_date(), Some("2025-07-25"));
}

#[tokio::test]
async fn test_historical_holiday_weekend_counts_as_covered() {
    let app = TestApp::new(MockProvider::default());
    app.cache
        .set_historical(&series("AAPL", &[("2025-07-03", dec!(213.55)), ("2025-07-02", dec!(212.44))]))
        .await
        .unwrap();

    // Friday July 4 is a holiday, so the window ending Sunday is complete
    let uri = "/api/v1/price/historical?symbol=AAPL&resolution=daily&from=2025-07-01&to=2025-07-06";
    let (status, body) = call(&app.router, get(uri)).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["prices"].as_array().unwrap().len(), 2);
    assert!(app.provider.historical_calls().is_empty());
}

#[tokio::test]
async fn test_historical_single_date_and_default_resolution() {
    let app = TestApp::new(MockProvider::default());
    app.cache
        .set_historical(&series("IBM", &[("2025-07-23", dec!(250.10)), ("2025-07-22", dec!(248.40))]))
        .await
        .unwrap();

    let (status, body) = call(&app.router, get("/api/v1/price/historical?symbol=ibm&date=2025-07-22")).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["resolution"], json!("daily"));
    let prices = body["data"]["prices"].as_array().unwrap();
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0]["date"], json!("2025-07-22"));
    assert!((prices[0]["price"].as_f64().unwrap() - 248.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_warm_window_is_byte_identical() {
    let app = TestApp::new(MockProvider::default());
    app.cache
        .set_historical(&series("AAPL", &[("2025-07-23", dec!(214.10)), ("2025-07-22", dec!(212.50))]))
        .await
        .unwrap();
    let uri = "/api/v1/price/historical?symbol=AAPL&resolution=daily&from=2025-07-20&to=2025-07-23";

    let first = body_bytes(send(&app.router, get(uri)).await).await;
    let second = body_bytes(send(&app.router, get(uri)).await).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_historical_parameter_validation() {
    let app = TestApp::new(MockProvider::default());
    let base = "/api/v1/price/historical?symbol=AAPL";

    for query in [
        "&resolution=intraday",
        "&resolution=hourly",
        "&date=2999-01-01",
        "&from=2025-07-10&to=2025-07-01",
        "&date=2025-07-01&from=2025-06-01&to=2025-07-01",
        "&date=2025-02-29",
        "&date=2025-02-30",
        "&date=2025-06-31",
        "&date=2025-7-01",
        "&from=2025-07-01",
    ] {
        let (status, body) = call(&app.router, get(&format!("{base}{query}"))).await;
        assert_eq!(status, 400, "{query}");
        assert_eq!(error_code(&body), "INVALID_INPUT", "{query}");
    }

    let (status, _) = call(&app.router, get("/api/v1/price/historical?resolution=daily")).await;
    assert_eq!(status, 400);

    assert!(app.provider.historical_calls().is_empty());
}

#[tokio::test]
async fn test_leap_day_is_accepted() {
    let app = TestApp::new(MockProvider::default());
    app.cache
        .set_historical(&series("AAPL", &[("2024-02-29", dec!(180.75)), ("2024-02-28", dec!(181.42))]))
        .await
        .unwrap();

    let (status, body) = call(&app.router, get("/api/v1/price/historical?symbol=AAPL&date=2024-02-29")).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["prices"][0]["date"], json!("2024-02-29"));
}

#[tokio::test]
async fn test_invalidate_symbol_and_flush() {
    let app = TestApp::new(MockProvider::default());
    app.cache.set_current(&price("AAPL", dec!(150))).await.unwrap();
    app.cache.set_current(&price("MSFT", dec!(420))).await.unwrap();
    app.cache
        .set_historical(&series("AAPL", &[("2025-07-23", dec!(214.10))]))
        .await
        .unwrap();

    let (status, body) = call(&app.router, post("/api/v1/invalid-cache?symbol=aapl")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["removed"], json!(2));
    assert!(app.cache.get_current(&symbol("AAPL")).await.unwrap().is_none());
    assert!(app.cache.get_current(&symbol("MSFT")).await.unwrap().is_some());

    // Idempotent
    let (status, body) = call(&app.router, post("/api/v1/invalid-cache?symbol=AAPL")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["removed"], json!(0));

    let (status, _) = call(&app.router, post("/api/v1/invalid-cache")).await;
    assert_eq!(status, 200);
    let (status, _) = call(&app.router, post("/api/v1/invalid-cache")).await;
    assert_eq!(status, 200);
    assert!(app.cache.get_current(&symbol("MSFT")).await.unwrap().is_none());

    let (status, body) = call(&app.router, post("/api/v1/invalid-cache?symbol=???")).await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "INVALID_INPUT");

    assert!(app.provider.current_calls().is_empty());
}
