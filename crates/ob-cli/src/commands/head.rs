//! `ob head <bucket> <key>` — `HEAD /v1/objects/:bucket/:key`, print
//! status and headers (no body, mirroring S3 `head-object`).

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::client::exit_code_for_status;

pub async fn execute(ctx: &CommandContext, bucket: &str, key: &str) -> Result<i32> {
    let path = format!("/v1/objects/{bucket}/{key}");
    let resp = ctx.client.head(&path).await?;
    let status = resp.status();

    if !status.is_success() {
        ctx.error(&format!("head '{bucket}/{key}' failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    if ctx.json {
        let headers: std::collections::HashMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        println!("{}", serde_json::to_string_pretty(&headers)?);
    } else {
        println!("{}", format!("{bucket}/{key}").blue().bold());
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                println!("  {}: {}", name.as_str().cyan(), v);
            }
        }
    }
    Ok(0)
}
