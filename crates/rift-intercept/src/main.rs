use anyhow::{bail, Context};
use clap::Parser;
use rift_intercept::{
    HeaderList, HttpClient, InterceptConfig, Interceptor, RequestOptions, StubHandler,
};
use std::sync::Arc;

/// Resolve one request against a stub configuration without touching the network.
#[derive(Parser, Debug)]
#[command(name = "rift-intercept", version, about)]
struct Args {
    /// Stub configuration file (YAML or JSON)
    #[arg(short, long, env = "RIFT_INTERCEPT_CONFIG")]
    config: String,

    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request header as `Name: value`; repeatable
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request URL
    url: String,
}

fn parse_headers(raw: &[String]) -> anyhow::Result<HeaderList> {
    let mut headers = HeaderList::new();
    for entry in raw {
        let Some((name, value)) = entry.split_once(':') else {
            bail!("Invalid header '{entry}', expected 'Name: value'");
        };
        headers.insert(name.trim(), value.trim());
    }
    Ok(headers)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = InterceptConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    let client = HttpClient::new();
    let _guard = Interceptor::install(&client, Arc::new(StubHandler::from_config(config)));

    let options = RequestOptions::new()
        .method(args.method)
        .headers(parse_headers(&args.headers)?);
    let mut request = client
        .request(args.url.as_str(), Some(options), None)
        .context("Failed to create request")?;
    request.end(None).await.context("Request failed")?;

    let response = request.response();
    match response.status_code() {
        Some(status) => println!("HTTP {status}"),
        None => {
            println!("No stub matched; request passed through");
            return Ok(());
        }
    }

    let mut names: Vec<&String> = response.headers().keys().collect();
    names.sort();
    for name in names {
        if let Some(value) = response.header(name) {
            println!("{name}: {value}");
        }
    }
    println!();
    println!("{}", response.body_text());
    Ok(())
}
