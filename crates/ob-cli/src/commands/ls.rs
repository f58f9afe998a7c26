//! `ob ls [bucket]` — list buckets (from BMD) or page through a bucket's
//! objects (`GET /v1/buckets/:name`, §4.6).

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::client::exit_code_for_status;

pub async fn execute(ctx: &CommandContext, bucket: Option<&str>) -> Result<i32> {
    match bucket {
        None => list_buckets(ctx).await,
        Some(name) => list_objects(ctx, name).await,
    }
}

async fn list_buckets(ctx: &CommandContext) -> Result<i32> {
    let resp = ctx.client.get("/v1/daemon?what=bmd").await?;
    let status = resp.status();
    if !status.is_success() {
        ctx.error(&format!("list buckets failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    let bmd: serde_json::Value = resp.json().await?;
    let buckets = bmd.get("buckets").and_then(|b| b.as_object());

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&bmd)?);
        return Ok(0);
    }

    match buckets {
        Some(map) => {
            for name in map.keys() {
                println!("{}", name.blue().bold());
            }
            ctx.info(&format!("\nTotal: {} bucket(s)", map.len()));
        }
        None => ctx.info("No buckets"),
    }
    Ok(0)
}

async fn list_objects(ctx: &CommandContext, bucket: &str) -> Result<i32> {
    let path = format!("/v1/buckets/{bucket}");
    let resp = ctx.client.get(&path).await?;
    let status = resp.status();
    if !status.is_success() {
        ctx.error(&format!("list objects in '{bucket}' failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    let page: serde_json::Value = resp.json().await?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(0);
    }

    if let Some(entries) = page.get("entries").and_then(|e| e.as_array()) {
        for entry in entries {
            let name = entry.get("name").and_then(|n| n.as_str()).unwrap_or("");
            println!("{name}");
        }
        ctx.info(&format!("\nTotal: {} object(s)", entries.len()));
    } else if page.get("needs_broadcast").and_then(|b| b.as_bool()).unwrap_or(false) {
        ctx.info("listing not ready yet, retry with the same --uuid");
    }
    Ok(0)
}
