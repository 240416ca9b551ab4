use crate::config::DatabaseConfig;
use crate::query::queries;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::future::Future;
use std::pin::Pin;
use tracing::info;

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    /// 트랜잭션 실행 (Ok 이면 커밋, Err 이면 롤백)
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 데이터베이스 초기화
    /// reset 이면 기존 스키마를 지우고 다시 만든다
    pub async fn initialize_database(&self, reset: bool) -> Result<(), sqlx::Error> {
        if reset {
            let drop_schema_sql = include_str!("../../sql/00-drop-schema.sql");
            self.execute_multi_query(drop_schema_sql).await?;
            info!("{:<12} --> 기존 스키마 삭제", "Database");
        } else if self.schema_exists().await? {
            info!("{:<12} --> 스키마가 이미 존재합니다", "Database");
            return Ok(());
        }

        let create_schema_sql = include_str!("../../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;
        info!("{:<12} --> 스키마 생성 완료", "Database");

        Ok(())
    }

    async fn schema_exists(&self) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(queries::SCHEMA_EXISTS)
            .fetch_one(&self.pool)
            .await?;
        row.try_get("schema_exists")
    }

    /// 여러 쿼리 실행 (주석 줄 제외)
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n");
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
