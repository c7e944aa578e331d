use sqlx::postgres::PgPoolOptions;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new().connect(&database_url).await?;

    let row: (String,) = sqlx::query_as("SELECT data_type FROM information_schema.columns WHERE table_name = 'doctors' AND column_name = 'search_count'")
        .fetch_one(&pool)
        .await?;

    println!("search_count type: {}", row.0);

    let counts: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(search_count), 0)::bigint FROM doctors",
    )
    .fetch_one(&pool)
    .await?;

    println!("doctors: {}, total views recorded: {}", counts.0, counts.1);

    Ok(())
}
