//! Summary image renderer
//!
//! Draws an 800x600 card with the total country count, the top 5
//! countries by estimated GDP, and the latest refresh time, and writes
//! it as SVG to a fixed location, overwriting any prior artifact.
//! Rendering is best-effort: the caller logs failures and moves on.

use crate::storage::Database;
use chrono::Utc;
use country_cache_core::{CacheError, Result};
use std::path::Path;
use svg::node::element::{Rectangle, Text};
use svg::Document;

const WIDTH: i32 = 800;
const HEIGHT: i32 = 600;
const TOP_COUNT: i64 = 5;

pub async fn render_summary(db: &Database, path: &Path) -> Result<()> {
    let status = db.status().await?;
    let top = db.top_by_gdp(TOP_COUNT).await?;
    let last_refreshed = status
        .last_refreshed_at
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string();

    let mut document = Document::new()
        .set("width", WIDTH)
        .set("height", HEIGHT)
        .set("viewBox", (0, 0, WIDTH, HEIGHT))
        .add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", "#ffffff"),
        )
        .add(text("Countries Summary", 50, 60, 32, true))
        .add(text(
            &format!("Total Countries: {}", status.total),
            50,
            120,
            24,
            false,
        ))
        .add(text("Top 5 Countries by GDP:", 50, 180, 24, true));

    for (index, (name, gdp)) in top.iter().enumerate() {
        let line = format!("{}. {}: ${:.2}B", index + 1, name, gdp / 1e9);
        document = document.add(text(&line, 70, 220 + index as i32 * 40, 20, false));
    }

    document = document.add(text(
        &format!("Last Refreshed: {last_refreshed}"),
        50,
        480,
        20,
        false,
    ));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, document.to_string())
        .await
        .map_err(|e| CacheError::Render(format!("writing {}: {e}", path.display())))?;

    Ok(())
}

fn text(content: &str, x: i32, y: i32, size: i32, bold: bool) -> Text {
    let mut node = Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("font-family", "Arial, sans-serif")
        .set("font-size", size)
        .set("fill", "#000000");
    if bold {
        node = node.set("font-weight", "bold");
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use country_cache_core::EnrichedCountry;

    fn record(name: &str, gdp: f64) -> EnrichedCountry {
        EnrichedCountry {
            name: name.to_string(),
            capital: None,
            region: None,
            population: Some(1000),
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
            flag_url: None,
        }
    }

    fn scratch_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("country-cache-{}-{}.svg", tag, std::process::id()))
    }

    #[tokio::test]
    async fn writes_summary_artifact() {
        let db = Database::in_memory().await.unwrap();
        db.upsert_all(&[record("Big", 3e12), record("Small", 1e9)])
            .await
            .unwrap();

        let path = scratch_path("writes");
        render_summary(&db, &path).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("Total Countries: 2"));
        assert!(content.contains("1. Big"));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn overwrites_prior_artifact() {
        let db = Database::in_memory().await.unwrap();
        let path = scratch_path("overwrites");

        db.upsert_all(&[record("A", 1.0)]).await.unwrap();
        render_summary(&db, &path).await.unwrap();

        db.upsert_all(&[record("B", 2.0)]).await.unwrap();
        render_summary(&db, &path).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("Total Countries: 2"));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn renders_empty_table() {
        let db = Database::in_memory().await.unwrap();
        let path = scratch_path("empty");

        render_summary(&db, &path).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("Total Countries: 0"));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
