use billing_sdk::{
    Chain, CheckoutStatus, CreateCheckoutMutation, CreateCheckoutRequest, ListCheckoutsParams,
    Query, RequestOptions, Token,
};
use clap::Parser;
use console::style;
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    Context,
    output::{OutputFormat, print_json, print_next_cursor, truncate},
};

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ListCommand {
    /// Resume after this checkout ID
    #[arg(long = "cursor")]
    pub cursor: Option<String>,

    /// Page size, 1-100
    #[arg(long = "limit")]
    pub limit: Option<u32>,

    /// Only list checkouts with this status
    #[arg(long = "status")]
    pub status: Option<CheckoutStatus>,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let client = ctx.provider.client().map_err(|e| e.to_string())?;
        let query = Query::checkouts(
            client,
            ListCheckoutsParams {
                cursor: self.cursor.clone(),
                limit: self.limit,
                status: self.status,
            },
        );

        let page = query
            .refetch()
            .await
            .map_err(|e| format!("Failed to list checkouts: {}", e))?;

        match ctx.format {
            OutputFormat::Json => print_json(&page)?,
            OutputFormat::Pretty => {
                if page.is_empty() {
                    println!("No checkouts found.");
                    return Ok(());
                }

                println!(
                    "{:<28} {:<12} {:>12} {:<10} {:<6} {}",
                    "Checkout ID", "Status", "Amount USD", "Chain", "Token", "Created"
                );
                println!("{}", "-".repeat(100));

                for checkout in &page.data {
                    println!(
                        "{:<28} {:<12} {:>12.2} {:<10} {:<6} {}",
                        truncate(&checkout.id, 28),
                        checkout.status,
                        checkout.amount_usd,
                        checkout.chain,
                        checkout.token,
                        checkout.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }

                print_next_cursor(page.has_more, page.next_cursor.as_deref());
            }
        }

        Ok(())
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct CreateCommand {
    /// Amount to charge in US dollars
    #[arg(long = "amount-usd")]
    pub amount_usd: f64,

    /// Chain the payment is made on (tron, ethereum, arbitrum, base, optimism, polygon, solana)
    #[arg(long = "chain")]
    pub chain: Chain,

    /// Stablecoin to accept (USDT or USDC)
    #[arg(long = "token")]
    pub token: Token,

    /// Metadata entry as key=value, may be repeated
    #[arg(long = "metadata", short = 'm')]
    pub metadata: Vec<String>,

    /// Seconds until the checkout expires
    #[arg(long = "expires-in")]
    pub expires_in: Option<u64>,

    /// Idempotency key; retries with the same key create a single checkout
    #[arg(long = "idempotency-key")]
    pub idempotency_key: Option<String>,
}

impl CreateCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let mut request = CreateCheckoutRequest::new(self.amount_usd, self.chain, self.token);
        for (key, value) in parse_metadata(&self.metadata)? {
            request = request.with_metadata(key, value);
        }
        if let Some(seconds) = self.expires_in {
            request = request.with_expires_in_seconds(seconds);
        }

        let options = self
            .idempotency_key
            .as_ref()
            .map(|key| RequestOptions::default().with_idempotency_key(key));

        debug!(
            amount_usd = self.amount_usd,
            chain = %self.chain,
            token = %self.token,
            "Creating checkout"
        );

        let mutation =
            CreateCheckoutMutation::from_provider(&ctx.provider).map_err(|e| e.to_string())?;
        let checkout = mutation
            .create_checkout(request, options)
            .await
            .map_err(|e| format!("Failed to create checkout: {}", e))?;

        match ctx.format {
            OutputFormat::Json => print_json(&checkout)?,
            OutputFormat::Pretty => {
                println!(
                    "{} Created checkout {}\n",
                    style("✓").green(),
                    style(&checkout.id).bold()
                );
                println!(
                    "  {} {:.2} USD as {} on {}",
                    style("Amount:").bold(),
                    checkout.amount_usd,
                    checkout.token,
                    checkout.chain
                );
                if let Some(ref atomic) = checkout.amount_atomic {
                    println!("  {} {}", style("Atomic amount:").bold(), atomic);
                }
                println!(
                    "  {} {}",
                    style("Deposit address:").bold(),
                    checkout.deposit_address
                );
                println!("  {} {}", style("Status:").bold(), checkout.status);
                if let Some(expires_at) = checkout.expires_at {
                    println!("  {} {}", style("Expires:").bold(), expires_at.to_rfc3339());
                }
                for (key, value) in &checkout.metadata {
                    println!("  {} {}={}", style("Metadata:").bold(), key, value);
                }
                println!(
                    "\nFollow the payment with: billing watch {}",
                    checkout.id
                );
            }
        }

        Ok(())
    }
}

/// Parse repeated `key=value` arguments, keeping their order
fn parse_metadata(entries: &[String]) -> Result<IndexMap<String, String>, String> {
    let mut metadata = IndexMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("Invalid metadata '{}': expected key=value", entry))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Invalid metadata '{}': key is empty", entry));
        }
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}
