//! `ob info` — `GET /v1/daemon` cluster/daemon summary (§6.1 `ServerInfo`).

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::client::exit_code_for_status;

pub async fn execute(ctx: &CommandContext) -> Result<i32> {
    let resp = ctx.client.get("/v1/daemon").await?;
    let status = resp.status();

    if !status.is_success() {
        ctx.error(&format!("info failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    let info: serde_json::Value = resp.json().await?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(0);
    }

    println!("{}", "cluster info".blue().bold());
    if let Some(obj) = info.as_object() {
        for (k, v) in obj {
            println!("  {}: {}", k.cyan(), v);
        }
    }
    Ok(0)
}
