use std::sync::Arc;

use admin_core::{http::HttpAdminApi, selectors, AdminClient};
use anyhow::Result;
use clap::Parser;
use shared::domain::DeviceType;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let api = Arc::new(HttpAdminApi::new(args.server_url));
    let client = AdminClient::new(api);

    client.initial_fetch().await?;
    info!("initial snapshot loaded");

    client
        .with_state(|state| {
            if let Some(user) = &state.user {
                println!("Signed in as {}", user.display_name);
                match &user.subscription_plan_id {
                    Some(plan) => println!("Active subscription plan: {plan}"),
                    None => println!("No active subscription plan"),
                }
            }

            let rows = selectors::devices_with_calendars(state);
            println!("Connected devices: {}", rows.len());
            for row in rows {
                let shows = match row.device.device_type {
                    DeviceType::Dashboard => "Dashboard",
                    DeviceType::Calendar => row
                        .calendar
                        .map(|calendar| calendar.summary.as_str())
                        .unwrap_or("No calendar connected"),
                };
                println!(
                    "  {} - {} ({})",
                    row.device.id,
                    shows,
                    if row.device.is_online { "online" } else { "offline" },
                );
            }
        })
        .await;

    client.shutdown().await;
    Ok(())
}
