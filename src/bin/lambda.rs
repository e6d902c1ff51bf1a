//! Serverless entry point for scheduled fetch and post invocations.
//!
//! Designed to run on AWS Lambda behind cron triggers: one rule invokes
//! `{"action": "fetch"}` daily, another invokes `{"action": "post"}` on the
//! posting schedule. Configuration comes from the same JSON config file
//! (path in `STRIPBOT_CONFIG`) and environment variables as the server.

#[cfg(feature = "lambda")]
mod handler {
    use lambda_runtime::LambdaEvent;
    use serde::Deserialize;
    use serde_json::{json, Value};

    use stripbot_core::Config;
    use stripbot_server::{build_context, scheduler};

    #[derive(Debug, Deserialize)]
    pub struct BotEvent {
        pub action: String,
        pub days: Option<u32>,
    }

    fn load_config() -> Config {
        let path = std::env::var("STRIPBOT_CONFIG").ok().map(std::path::PathBuf::from);
        Config::load_or_default(path.as_deref())
    }

    pub async fn handle(event: LambdaEvent<BotEvent>) -> Result<Value, lambda_runtime::Error> {
        let (event, _ctx) = event.into_parts();
        tracing::info!("Handling action '{}'", event.action);

        let config = load_config();
        let days = event.days.unwrap_or(config.comic.days_back);
        let ctx = match build_context(config) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!("Failed to initialize: {e}");
                return Ok(error_response(500, &e.to_string()));
            }
        };

        match event.action.as_str() {
            "fetch" => match scheduler::fetch_new_comics(&ctx, days).await {
                Ok(stored) => Ok(json!({
                    "statusCode": 200,
                    "body": json!({
                        "message": format!("Fetched comics for the last {days} days"),
                        "stored": stored,
                    }).to_string(),
                })),
                Err(e) => {
                    tracing::error!("Fetch failed: {e}");
                    Ok(error_response(500, &e.to_string()))
                }
            },
            "post" => match scheduler::create_post(&ctx).await {
                Ok(Some(post)) => Ok(json!({
                    "statusCode": 200,
                    "body": json!({
                        "message": "Post created",
                        "post_id": post.id.to_string(),
                        "bluesky_uri": post.bluesky_uri,
                    }).to_string(),
                })),
                Ok(None) => Ok(error_response(
                    400,
                    "No posts created - no unposted comics available",
                )),
                Err(e) => {
                    tracing::error!("Post failed: {e}");
                    Ok(error_response(500, &e.to_string()))
                }
            },
            other => Ok(error_response(400, &format!("Unknown action '{other}'"))),
        }
    }

    fn error_response(status: u16, message: &str) -> Value {
        json!({
            "statusCode": status,
            "body": json!({ "error": message }).to_string(),
        })
    }
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "stripbot=info,stripbot_server=info".into()),
        )
        .init();

    tracing::info!("stripbot lambda starting");

    lambda_runtime::run(lambda_runtime::service_fn(handler::handle)).await
}

#[cfg(not(feature = "lambda"))]
fn main() {
    eprintln!("This binary requires the 'lambda' feature.");
    eprintln!("Build with: cargo build --bin stripbot-lambda --features lambda");
    std::process::exit(1);
}
