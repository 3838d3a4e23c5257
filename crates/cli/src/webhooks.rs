use billing_sdk::{ListWebhookEndpointsParams, Query};
use billing_types::WebhookEndpointStatus;
use clap::Parser;

use crate::{
    Context,
    output::{OutputFormat, print_json, print_next_cursor, truncate},
};

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ListCommand {
    /// Resume after this endpoint ID
    #[arg(long = "cursor")]
    pub cursor: Option<String>,

    /// Page size, 1-100
    #[arg(long = "limit")]
    pub limit: Option<u32>,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let client = ctx.provider.client().map_err(|e| e.to_string())?;
        let query = Query::webhook_endpoints(
            client,
            ListWebhookEndpointsParams {
                cursor: self.cursor.clone(),
                limit: self.limit,
            },
        );

        let page = query
            .refetch()
            .await
            .map_err(|e| format!("Failed to list webhook endpoints: {}", e))?;

        match ctx.format {
            OutputFormat::Json => print_json(&page)?,
            OutputFormat::Pretty => {
                if page.is_empty() {
                    println!("No webhook endpoints registered.");
                    return Ok(());
                }

                println!(
                    "{:<28} {:<10} {:<45} {}",
                    "Endpoint ID", "Enabled", "URL", "Events"
                );
                println!("{}", "-".repeat(110));

                for endpoint in &page.data {
                    let enabled = match endpoint.status {
                        WebhookEndpointStatus::Enabled => "✓",
                        WebhookEndpointStatus::Disabled => "✗",
                    };
                    let events = endpoint
                        .events
                        .iter()
                        .map(|e| e.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");

                    println!(
                        "{:<28} {:<10} {:<45} {}",
                        truncate(&endpoint.id, 28),
                        enabled,
                        truncate(&endpoint.url, 45),
                        events
                    );
                }

                print_next_cursor(page.has_more, page.next_cursor.as_deref());
            }
        }

        Ok(())
    }
}
