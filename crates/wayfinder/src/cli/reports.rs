//! Read-only reports: roster, clan, titles and leaderboard.

use super::{AppContext, OutputFormat};
use chrono::{TimeDelta, Utc};
use std::error::Error;
use wayfinder::{RosterRepository, metric_leaderboard};

pub async fn show_roster(
    ctx: &AppContext,
    stale_days: Option<i64>,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let pool = ctx.database().await?;
    let repo = ctx.roster_repository(&pool);
    let players = match stale_days {
        Some(days) => repo.list_stale_players(Utc::now() - TimeDelta::days(days)).await?,
        None => repo.list_players().await?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&players)?),
        OutputFormat::Human => {
            for player in &players {
                println!(
                    "{:<24} {}#{:04}  last seen {}  last online {}",
                    player.display_name,
                    player.global_display_name,
                    player.global_display_code,
                    player.updated_at.format("%Y-%m-%d"),
                    player.last_online.format("%Y-%m-%d"),
                );
            }
            println!("{} members", players.len());
        }
    }
    Ok(())
}

pub async fn show_clan(ctx: &AppContext, name: &str) -> Result<(), Box<dyn Error>> {
    let clan = ctx.destiny_client().await?.get_clan_by_name(name).await?;
    println!("{} [{}] (group {})", clan.name, clan.clan_info.clan_callsign, clan.group_id);
    if !clan.motto.is_empty() {
        println!("\"{}\"", clan.motto);
    }
    println!("{} members, founded {}", clan.member_count, clan.creation_date);
    if !clan.about.is_empty() {
        println!();
        println!("{}", clan.about);
    }
    Ok(())
}

pub async fn show_titles(ctx: &AppContext, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let client = ctx.destiny_client().await?;
    let report = client
        .clan_titles(*ctx.config().destiny().group_id())
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => {
            println!("Clan triumph score: {}", report.total_score);
            for member in &report.members {
                let earned: Vec<String> = member
                    .titles
                    .iter()
                    .filter(|t| t.earned)
                    .map(|t| match t.gilded_count {
                        0 => t.name.clone(),
                        n => format!("{} (gilded x{n})", t.name),
                    })
                    .collect();
                println!("{:<24} {}", member.name, earned.join(", "));
            }
        }
    }
    Ok(())
}

pub async fn show_leaderboard(
    ctx: &AppContext,
    metric: Option<i64>,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let metric = metric.unwrap_or(*ctx.config().destiny().leaderboard_metric());
    let pool = ctx.database().await?;
    let repo = ctx.roster_repository(&pool);
    let client = ctx.destiny_client().await?;
    let board = metric_leaderboard(&client, repo.as_ref(), metric).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&board)?),
        OutputFormat::Human => {
            println!("{}", board.name());
            for entry in board.entries() {
                let progress = entry
                    .progress()
                    .map_or_else(|| "hidden".to_string(), |p| p.to_string());
                println!("{:>3}. {:<24} {}", entry.rank(), entry.display_name(), progress);
            }
        }
    }
    Ok(())
}
