use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use vidtube_accounts::configuration::get_configuration;
use vidtube_accounts::media_client::MediaClient;
use vidtube_accounts::startup::run;
use vidtube_accounts::store::PgStore;
use vidtube_accounts::telemetry::init_telemetry;

fn startup_error(kind: std::io::ErrorKind, message: &str) -> std::io::Error {
    std::io::Error::new(kind, message.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry();

    tracing::info!("Starting application");

    // 설정 로드 및 JWT 설정 검증
    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    configuration.jwt.validate().map_err(|e| {
        tracing::error!("Invalid jwt configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    // 데이터베이스 연결 풀 생성
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(configuration.database.max_connections)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    // 마이그레이션 적용
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        startup_error(std::io::ErrorKind::Other, "Migration error")
    })?;

    tracing::info!("Database ready");

    let media_client = MediaClient::new(&configuration.media).map_err(|e| {
        tracing::error!("Failed to build media client: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Media client error")
    })?;

    // 서버 주소 설정
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    let server = run(
        listener,
        Arc::new(PgStore::new(pool)),
        Arc::new(media_client),
        configuration.jwt,
        configuration.session,
    )?;

    server.await
}
