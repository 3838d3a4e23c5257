use billing_sdk::{CheckoutStatus, CheckoutStatusPoller, CheckoutStatusState, PollOptions};
use clap::Parser;
use console::style;
use serde_json::json;

use crate::{Context, output::OutputFormat};

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct WatchCommand {
    /// Checkout ID (co_...)
    pub checkout_id: String,

    /// Poll at a fixed interval instead of the server-suggested one
    #[arg(long = "interval-ms")]
    pub interval_ms: Option<u64>,
}

impl WatchCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let poller = CheckoutStatusPoller::from_provider(&ctx.provider).map_err(|e| e.to_string())?;

        let mut options = PollOptions::default();
        if let Some(interval_ms) = self.interval_ms {
            options = options.with_polling_interval_ms(interval_ms);
        }

        if ctx.format == OutputFormat::Pretty {
            println!(
                "Watching checkout {} (Ctrl-C to stop)...\n",
                style(&self.checkout_id).bold()
            );
        }

        poller.start(Some(&self.checkout_id), options);
        let mut rx = poller.subscribe();
        let mut last_line: Option<String> = None;

        let final_state = loop {
            let state = rx.borrow_and_update().clone();

            let line = render_state(&self.checkout_id, &state, &ctx.format);
            if last_line.as_ref() != Some(&line) {
                println!("{}", line);
                last_line = Some(line);
            }

            if !state.is_polling {
                break state;
            }

            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break poller.state();
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    poller.stop();
                    if ctx.format == OutputFormat::Pretty {
                        eprintln!("\nStopped watching {}", self.checkout_id);
                    }
                    return Ok(());
                }
            }
        };

        match final_state.status {
            Some(CheckoutStatus::Confirmed) => {
                if ctx.format == OutputFormat::Pretty {
                    println!("\n{} Payment confirmed", style("✓").green());
                }
                Ok(())
            }
            Some(status) if status.is_terminal() => {
                Err(format!("Checkout {} ended with status {}", self.checkout_id, status))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct StatusCommand {
    /// Checkout ID (co_...)
    pub checkout_id: String,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let client = ctx.provider.client().map_err(|e| e.to_string())?;
        let res = client
            .get_checkout_status(&self.checkout_id)
            .await
            .map_err(|e| format!("Failed to fetch checkout status: {}", e))?;

        match ctx.format {
            OutputFormat::Json => crate::output::print_json(&res)?,
            OutputFormat::Pretty => {
                println!(
                    "{} {}",
                    style("Checkout:").bold(),
                    res.checkout_id.as_deref().unwrap_or(&self.checkout_id)
                );
                println!("  {} {}", style("Status:").bold(), styled_status(res.status, 0));
                println!(
                    "  {} {}/{}",
                    style("Confirmations:").bold(),
                    res.confirmations,
                    res.required_confirmations
                );
                if let Some(ref tx_hash) = res.tx_hash {
                    println!("  {} {}", style("Tx hash:").bold(), style(tx_hash).dim());
                }
                if let Some(detected_at) = res.detected_at {
                    println!("  {} {}", style("Detected:").bold(), detected_at.to_rfc3339());
                }
                if let Some(confirmed_at) = res.confirmed_at {
                    println!("  {} {}", style("Confirmed:").bold(), confirmed_at.to_rfc3339());
                }
            }
        }

        Ok(())
    }
}

/// Status padded to `width` visible characters, then colored
fn styled_status(status: CheckoutStatus, width: usize) -> String {
    let text = format!("{:<width$}", status.as_str());
    match status {
        CheckoutStatus::Confirmed => style(text).green().bold().to_string(),
        CheckoutStatus::Expired | CheckoutStatus::Failed => style(text).red().bold().to_string(),
        CheckoutStatus::Detected | CheckoutStatus::Confirming => style(text).yellow().to_string(),
        _ => style(text).dim().to_string(),
    }
}

/// One output line for a poller snapshot
fn render_state(checkout_id: &str, state: &CheckoutStatusState, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({
            "checkout_id": checkout_id,
            "status": state.status,
            "confirmations": state.confirmations,
            "required_confirmations": state.required_confirmations,
            "tx_hash": state.tx_hash,
            "detected_at": state.detected_at,
            "confirmed_at": state.confirmed_at,
            "is_polling": state.is_polling,
            "error": state.error.as_ref().map(|e| e.to_string()),
        })
        .to_string(),
        OutputFormat::Pretty => {
            let status = match state.status {
                Some(status) => styled_status(status, 12),
                None => style(format!("{:<12}", "waiting")).dim().to_string(),
            };
            let mut line = format!(
                "{} {}/{} confirmations",
                status, state.confirmations, state.required_confirmations
            );
            if let Some(ref tx_hash) = state.tx_hash {
                line.push_str(&format!("  tx {}", style(tx_hash).dim()));
            }
            if let Some(ref error) = state.error {
                line.push_str(&format!("  {} {}", style("retrying:").yellow(), error));
            }
            line
        }
    }
}
