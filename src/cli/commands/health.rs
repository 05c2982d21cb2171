use anyhow::Context;
use serde_json::Value;

/// GET `{base}/api/health` and report the outcome; a non-200 answer is an error
pub async fn handle(base_url: &str, raw_json: bool) -> anyhow::Result<()> {
    let base = url::Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
        .with_context(|| format!("invalid server URL: {base_url}"))?;
    let endpoint = base.join("api/health")?;

    let response = reqwest::get(endpoint.clone())
        .await
        .with_context(|| format!("failed to reach {endpoint}"))?;
    let status = response.status();
    let body: Value = response.json().await.context("health response was not JSON")?;

    if raw_json {
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        let state = body["data"]["status"].as_str().unwrap_or("unknown");
        let database = body["data"]["database"].as_str().unwrap_or("unknown");
        println!("{endpoint}: {state} (database: {database}, HTTP {})", status.as_u16());
    }

    if !status.is_success() {
        anyhow::bail!("server reported HTTP {}", status.as_u16());
    }
    Ok(())
}
