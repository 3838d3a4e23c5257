use billing_sdk::{EventType, ListEventsParams, Query};
use clap::Parser;

use crate::{
    Context,
    output::{OutputFormat, print_json, print_next_cursor, truncate},
};

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ListCommand {
    /// Resume after this event ID
    #[arg(long = "cursor")]
    pub cursor: Option<String>,

    /// Page size, 1-100
    #[arg(long = "limit")]
    pub limit: Option<u32>,

    /// Only list events of this type (e.g. checkout.completed)
    #[arg(long = "type")]
    pub event_type: Option<EventType>,

    /// Only list events for this checkout
    #[arg(long = "checkout-id")]
    pub checkout_id: Option<String>,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let client = ctx.provider.client().map_err(|e| e.to_string())?;
        let query = Query::events(
            client,
            ListEventsParams {
                cursor: self.cursor.clone(),
                limit: self.limit,
                event_type: self.event_type,
                checkout_id: self.checkout_id.clone(),
            },
        );

        let page = query
            .refetch()
            .await
            .map_err(|e| format!("Failed to list events: {}", e))?;

        match ctx.format {
            OutputFormat::Json => print_json(&page)?,
            OutputFormat::Pretty => {
                if page.is_empty() {
                    println!("No events found.");
                    return Ok(());
                }

                println!(
                    "{:<28} {:<30} {:<28} {}",
                    "Event ID", "Type", "Checkout", "Created"
                );
                println!("{}", "-".repeat(110));

                for event in &page.data {
                    println!(
                        "{:<28} {:<30} {:<28} {}",
                        truncate(&event.id, 28),
                        event.event_type,
                        truncate(event.checkout_id.as_deref().unwrap_or("-"), 28),
                        event.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }

                print_next_cursor(page.has_more, page.next_cursor.as_deref());
            }
        }

        Ok(())
    }
}
