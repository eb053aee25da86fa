//! 분류 → 결정 → 신호 생성 흐름 통합 테스트.
//!
//! chat API를 mockito로 대체하여 단계별 계약을 검증합니다.
//! (데이터 보강과 저장은 각 crate의 단위 테스트에서 검증)

use chrono::Utc;
use pulse_analysis::{ChatClient, ChatConfig, Classifier, DecisionEngine, EnrichedData};
use pulse_core::{generate_signal, DataPointKind, NewsItem, Sentiment, TradeSignal};
use pulse_risk::{apply_risk_filters, RiskContext, RiskFilterConfig};

fn chat_client(server: &mockito::ServerGuard) -> ChatClient {
    ChatClient::new(ChatConfig {
        api_key: "test-key".to_string(),
        base_url: server.url(),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

fn sample_item() -> NewsItem {
    NewsItem::new(
        "feed-8841",
        "Spot bitcoin ETF sees record daily inflows",
        "Net inflows across spot ETFs reached a record high on Tuesday...",
        "Bloomberg",
        Some("https://example.com/etf".to_string()),
        Utc::now(),
        Some("crypto".to_string()),
        vec!["BTC".to_string()],
    )
}

/// chat 응답을 choices 형태로 감쌉니다.
fn chat_body(content: &serde_json::Value) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
    })
    .to_string()
}

#[tokio::test]
async fn test_classification_stage_produces_plan() {
    let mut server = mockito::Server::new_async().await;
    let plan_json = serde_json::json!({
        "market_moving": true,
        "event_type": "etf_flow",
        "data_points": [
            {"kind": "spot_price", "symbol": "BTC"},
            {"kind": "funding_rate", "symbol": "BTC"},
            {"kind": "macro_index", "symbol": "^VIX"}
        ],
        "comparables": ["2024-01 spot ETF approval"]
    });
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(chat_body(&plan_json))
        .create_async()
        .await;

    let classifier = Classifier::new(chat_client(&server));
    let plan = classifier.classify(&sample_item()).await.unwrap();

    assert!(plan.market_moving);
    assert_eq!(plan.data_points.len(), 3);
    assert_eq!(plan.data_points[0].kind, DataPointKind::SpotPrice);
    assert_eq!(plan.target_symbols(), vec!["BTC", "^VIX"]);
}

#[tokio::test]
async fn test_decision_stage_flows_into_signal_and_risk_filter() {
    let mut server = mockito::Server::new_async().await;
    let plan_json = serde_json::json!({
        "market_moving": true,
        "event_type": "etf_flow",
        "data_points": [],
        "comparables": []
    });
    let decision_json = serde_json::json!({
        "sentiment": "bullish",
        "importance": 9,
        "would_trade": true,
        "conviction": 0.85,
        "positions": [
            {"pair": "BTC/USDT", "side": "buy", "horizon": "short",
             "rationale": "record inflows with supportive macro"}
        ],
        "reasoning": "Sustained inflows historically precede upside."
    });

    // 시스템 프롬프트로 분류/결정 호출을 구분한다
    server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Regex("triage".to_string()))
        .with_status(200)
        .with_body(chat_body(&plan_json))
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Regex("trading-desk".to_string()))
        .with_status(200)
        .with_body(chat_body(&decision_json))
        .expect(1)
        .create_async()
        .await;

    let item = sample_item();
    let classifier = Classifier::new(chat_client(&server));
    let plan = classifier.classify(&item).await.unwrap();

    let engine = DecisionEngine::new(chat_client(&server));
    let enriched = EnrichedData::default();
    let decision = engine.decide(&item, &plan, &enriched, &[]).await.unwrap();

    assert_eq!(decision.sentiment, Sentiment::Bullish);
    assert_eq!(decision.importance, 9);

    // 신호 생성: bullish + 9 + would_trade → STRONG_BUY
    let raw = generate_signal(decision.sentiment, decision.importance, decision.would_trade);
    assert_eq!(raw, TradeSignal::StrongBuy);

    // 리스크 필터: 해석된 페어가 있고 매크로 호라이즌이 아니므로 통과
    let outcome = apply_risk_filters(
        &RiskFilterConfig::default(),
        &RiskContext {
            signal: raw,
            score: decision.importance,
            conviction: decision.conviction,
            horizon: decision.max_horizon(),
            regime: enriched.derive_regime(),
            resolved_pairs: decision.resolved_pairs().len(),
        },
    );
    assert_eq!(outcome.signal, TradeSignal::StrongBuy);
    assert!(outcome.suppressions.is_empty());
}

#[tokio::test]
async fn test_malformed_decision_fails_only_parsing() {
    let mut server = mockito::Server::new_async().await;
    // 분류는 최소 형태로 성립시키고, 결정 출력은 스키마를 벗어나게 한다
    server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Regex("triage".to_string()))
        .with_status(200)
        .with_body(chat_body(&serde_json::json!({"market_moving": false})))
        .create_async()
        .await;
    server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Regex("trading-desk".to_string()))
        .with_status(200)
        .with_body(chat_body(&serde_json::json!({"totally": "unexpected"})))
        .create_async()
        .await;

    let item = sample_item();
    let plan = Classifier::new(chat_client(&server))
        .classify(&item)
        .await
        .unwrap();
    assert!(!plan.market_moving);

    let err = DecisionEngine::new(chat_client(&server))
        .decide(&item, &plan, &EnrichedData::default(), &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        pulse_analysis::AnalysisError::StageParse(_)
    ));
}
