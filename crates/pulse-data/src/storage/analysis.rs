//! 분석 레코드 repository.
//!
//! 뉴스 아이템당 하나의 레코드를 `news_id` 유니크 키 기준 멱등
//! upsert로 저장합니다. 워커가 분석을 마치고 잠금을 해제하기 전에
//! 크래시해도, 나중에 다른 워커가 재실행하면 중복 행 없이 같은
//! 레코드를 덮어씁니다.

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use pulse_core::{AnalysisPayload, AnalysisRecord, Sentiment, TradeSignal};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, instrument};

/// upsert 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 새 행 삽입 (알림 트리거 대상)
    Inserted,
    /// 기존 행 덮어쓰기
    Updated,
}

/// 분석 레코드 데이터베이스 행.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub news_id: i64,
    pub external_id: String,
    pub title: String,
    pub source: String,
    pub url: Option<String>,
    pub category: Option<String>,
    pub sentiment: String,
    pub importance: i16,
    pub signal: String,
    pub trading_pairs: Vec<String>,
    pub payload: Option<serde_json::Value>,
    pub breaking: bool,
    pub credibility_tier: String,
    pub published_at: DateTime<Utc>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisRow {
    /// 도메인 레코드로 변환합니다.
    pub fn into_record(self) -> AnalysisRecord {
        AnalysisRecord {
            news_id: self.news_id,
            external_id: self.external_id,
            title: self.title,
            source: self.source,
            url: self.url,
            category: self.category,
            sentiment: self.sentiment.parse().unwrap_or(Sentiment::Neutral),
            importance: self.importance.clamp(0, 10) as u8,
            signal: self.signal.parse().unwrap_or(TradeSignal::NoTrade),
            trading_pairs: self.trading_pairs,
            payload: self
                .payload
                .and_then(|v| serde_json::from_value::<AnalysisPayload>(v).ok()),
            breaking: self.breaking,
            credibility: self.credibility_tier.parse().unwrap_or_default(),
            published_at: self.published_at,
            analyzed_at: self.analyzed_at,
        }
    }
}

/// 저장된 레코드의 분석 상태 (후보 선별용).
#[derive(Debug, Clone, FromRow)]
pub struct RecordState {
    pub news_id: i64,
    /// 분석 페이로드 존재 여부
    pub has_payload: bool,
}

/// 포지션 메모리 집계용 이력 행.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub news_id: i64,
    pub signal: String,
    pub trading_pairs: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    /// payload의 reasoning 필드
    pub rationale: Option<String>,
}

/// 분석 레코드 repository.
#[derive(Clone)]
pub struct AnalysisRepository {
    pool: PgPool,
}

impl AnalysisRepository {
    /// 새 repository를 생성합니다.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 레코드를 멱등 upsert합니다.
    ///
    /// `xmax = 0`이면 새로 삽입된 행입니다 (Postgres에서 갱신된 행은
    /// 0이 아닌 xmax를 가짐).
    #[instrument(skip(self, record), fields(news_id = record.news_id))]
    pub async fn upsert(&self, record: &AnalysisRecord) -> Result<UpsertOutcome> {
        let payload = match &record.payload {
            Some(p) => Some(serde_json::to_value(p)?),
            None => None,
        };

        let (inserted,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO news_analysis (
                news_id, external_id, title, source, url, category,
                sentiment, importance, signal, trading_pairs, payload,
                breaking, credibility_tier, published_at, analyzed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (news_id) DO UPDATE SET
                sentiment = EXCLUDED.sentiment,
                importance = EXCLUDED.importance,
                signal = EXCLUDED.signal,
                trading_pairs = EXCLUDED.trading_pairs,
                payload = EXCLUDED.payload,
                breaking = EXCLUDED.breaking,
                credibility_tier = EXCLUDED.credibility_tier,
                analyzed_at = EXCLUDED.analyzed_at
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(record.news_id)
        .bind(&record.external_id)
        .bind(&record.title)
        .bind(&record.source)
        .bind(&record.url)
        .bind(&record.category)
        .bind(record.sentiment.to_string())
        .bind(record.importance as i16)
        .bind(record.signal.to_string())
        .bind(&record.trading_pairs)
        .bind(payload)
        .bind(record.breaking)
        .bind(record.credibility.to_string())
        .bind(record.published_at)
        .bind(record.analyzed_at)
        .fetch_one(&self.pool)
        .await?;

        let outcome = if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        };
        debug!(news_id = record.news_id, ?outcome, "분석 레코드 저장");
        Ok(outcome)
    }

    /// 주어진 정규 ID들의 저장 상태를 조회합니다.
    ///
    /// 결과에 없는 ID는 신규 아이템입니다.
    pub async fn find_states(&self, news_ids: &[i64]) -> Result<Vec<RecordState>> {
        if news_ids.is_empty() {
            return Ok(Vec::new());
        }

        let states = sqlx::query_as::<_, RecordState>(
            r#"
            SELECT news_id, (payload IS NOT NULL) AS has_payload
            FROM news_analysis
            WHERE news_id = ANY($1)
            "#,
        )
        .bind(news_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(states)
    }

    /// 단일 레코드를 조회합니다.
    pub async fn find(&self, news_id: i64) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT news_id, external_id, title, source, url, category,
                   sentiment, importance, signal, trading_pairs, payload,
                   breaking, credibility_tier, published_at, analyzed_at
            FROM news_analysis
            WHERE news_id = $1
            "#,
        )
        .bind(news_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AnalysisRow::into_record))
    }

    /// 포지션 메모리용 이력 행을 조회합니다.
    ///
    /// 분석 페이로드가 있는 레코드만 이력 대상입니다. 플레이스홀더로
    /// 기록된 행(payload NULL)은 집계에 포함되지 않습니다.
    pub async fn recent_history(&self, since: DateTime<Utc>) -> Result<Vec<HistoryRow>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT news_id, signal, trading_pairs, analyzed_at,
                   payload->>'reasoning' AS rationale
            FROM news_analysis
            WHERE payload IS NOT NULL
              AND analyzed_at >= $1
            ORDER BY analyzed_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// 보존 정리: 최신 `keep`개만 남기고 오래된 행을 삭제합니다.
    ///
    /// K번째 레코드의 `analyzed_at`을 컷오프로 사용합니다.
    #[instrument(skip(self))]
    pub async fn trim_keep_latest(&self, keep: i64) -> Result<u64> {
        if keep <= 0 {
            return Err(DataError::InvalidData(format!(
                "retention keep must be positive, got {}",
                keep
            )));
        }

        let cutoff: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT analyzed_at
            FROM news_analysis
            ORDER BY analyzed_at DESC
            OFFSET $1 LIMIT 1
            "#,
        )
        .bind(keep - 1)
        .fetch_optional(&self.pool)
        .await?;

        let Some((cutoff,)) = cutoff else {
            // 레코드 수가 K 미만
            return Ok(0);
        };

        let result = sqlx::query(
            r#"
            DELETE FROM news_analysis
            WHERE analyzed_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            debug!(deleted, %cutoff, "보존 정리 완료");
        }
        Ok(deleted)
    }

    /// 전체 레코드 수.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news_analysis")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
